use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "letterpress", version)]
struct Cli {
    /// Log filter used when `RUST_LOG` is unset.
    #[arg(long, global = true, default_value = "info")]
    log: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render an effect config to PNG.
    Render(RenderArgs),
    /// Convert images for one resizer tab and bundle them into a ZIP.
    Resize(ResizeArgs),
    /// Print the closest integer ratio for a size.
    Ratio(RatioArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Effect config JSON.
    #[arg(long)]
    config: PathBuf,

    /// Font files to register; the first one is the default face.
    #[arg(long = "font", required = true)]
    fonts: Vec<PathBuf>,

    /// Output PNG path, or a directory to write `<sanitized text>.png` into.
    #[arg(long)]
    out: PathBuf,

    /// Integer upscale factor.
    #[arg(long, default_value_t = 1)]
    scale: u32,

    /// Directory image paths in the config are relative to (defaults to the config's directory).
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Fill the canvas with this CSS colour before drawing.
    #[arg(long)]
    clear: Option<String>,
}

#[derive(Parser, Debug)]
struct ResizeArgs {
    /// recommend, square, resize (480x720) or custom.
    #[arg(long, default_value = "recommend")]
    tab: letterpress::ResizeTab,

    /// Ratio for the custom tab, e.g. 3:4.
    #[arg(long)]
    ratio: Option<letterpress::Ratio>,

    /// Output ZIP path, or a directory to write `<tab>_images_<date>.zip` into.
    #[arg(long)]
    out: PathBuf,

    /// Input image files.
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

#[derive(Parser, Debug)]
struct RatioArgs {
    /// Source width in pixels.
    width: u32,
    /// Source height in pixels.
    height: u32,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log)?;
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Resize(args) => cmd_resize(args),
        Command::Ratio(args) => cmd_ratio(args),
    }
}

fn init_tracing(level: &str) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => EnvFilter::builder()
            .parse(level)
            .with_context(|| format!("invalid log level '{level}'"))?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let json = std::fs::read_to_string(&args.config)
        .with_context(|| format!("read config '{}'", args.config.display()))?;
    let config = letterpress::EffectConfig::from_json(&json).context("parse effect config")?;

    let mut fonts = letterpress::FontBook::new();
    for path in &args.fonts {
        let name = fonts
            .register_file(path)
            .with_context(|| format!("register font '{}'", path.display()))?;
        tracing::info!(font = %name, "registered font");
    }

    let mut opts = letterpress::RenderOpts::from_env();
    if let Some(css) = &args.clear {
        let c = letterpress::Color::parse(css)?;
        opts = opts.with_clear_rgba([c.r, c.g, c.b, c.a]);
    }

    let assets_root = args
        .assets
        .clone()
        .or_else(|| args.config.parent().map(Path::to_path_buf));
    let mut session = letterpress::EditorSession::new(config, fonts, opts, assets_root);
    for (src, reason) in session.assets().failures() {
        eprintln!("image '{src}' was not loaded: {reason}");
    }

    let (file_name, png) = session.export_png(args.scale)?;
    let out = if args.out.is_dir() {
        args.out.join(file_name)
    } else {
        args.out
    };
    write_output(&out, &png)
}

fn cmd_resize(args: ResizeArgs) -> anyhow::Result<()> {
    let files = args
        .files
        .iter()
        .map(|p| letterpress::InputFile::from_path(p))
        .collect::<Result<Vec<_>, _>>()?;

    let load = letterpress::load_batch(&files, &letterpress::BatchLimits::default());
    for notice in &load.notices {
        eprintln!("{notice}");
    }
    if load.images.is_empty() {
        anyhow::bail!("nothing to convert");
    }

    let converted = letterpress::convert_batch(&load, args.tab, args.ratio)?;
    let zip = letterpress::zip_archive(
        converted
            .iter()
            .map(|c| (c.file_name.as_str(), c.png.as_slice())),
    )?;

    let out = if args.out.is_dir() {
        args.out.join(letterpress::archive_name_today(args.tab))
    } else {
        args.out
    };
    write_output(&out, &zip)?;
    eprintln!("{} image(s) converted", converted.len());
    Ok(())
}

fn cmd_ratio(args: RatioArgs) -> anyhow::Result<()> {
    if args.width == 0 || args.height == 0 {
        anyhow::bail!("width and height must be > 0");
    }
    println!("{}", letterpress::best_integer_ratio(args.width, args.height));
    Ok(())
}

fn write_output(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("write '{}'", path.display()))?;
    eprintln!("wrote {}", path.display());
    Ok(())
}
