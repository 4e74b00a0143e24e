use std::collections::HashSet;
use std::io::{Cursor, Write as _};

use anyhow::Context as _;
use chrono::NaiveDate;

use crate::foundation::error::{LetterpressError, LetterpressResult};
use crate::resize::ResizeTab;

/// Bundle `(file name, bytes)` entries into an uncompressed ZIP.
///
/// Repeated names get a `_2`, `_3`, ... suffix before the extension.
pub fn zip_archive<'a>(
    entries: impl IntoIterator<Item = (&'a str, &'a [u8])>,
) -> LetterpressResult<Vec<u8>> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let opts = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Stored);

    let mut seen = HashSet::new();
    for (name, bytes) in entries {
        let name = unique_name(&mut seen, name);
        zip.start_file(name.as_str(), opts)
            .with_context(|| format!("zip entry {name}"))?;
        zip.write_all(bytes)
            .with_context(|| format!("zip entry {name}"))?;
    }
    if seen.is_empty() {
        return Err(LetterpressError::validation(
            "no converted images in the current tab",
        ));
    }

    let cursor = zip.finish().context("finish zip")?;
    Ok(cursor.into_inner())
}

fn unique_name(seen: &mut HashSet<String>, name: &str) -> String {
    if seen.insert(name.to_owned()) {
        return name.to_owned();
    }
    let (stem, ext) = match name.rfind('.') {
        Some(i) => name.split_at(i),
        None => (name, ""),
    };
    let mut n = 2;
    loop {
        let candidate = format!("{stem}_{n}{ext}");
        if seen.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

/// `{tab label}_images_{YYYY-MM-DD}.zip`.
pub fn archive_name(tab: ResizeTab, date: NaiveDate) -> String {
    format!("{}_images_{}.zip", tab.label(), date.format("%Y-%m-%d"))
}

/// [`archive_name`] for today's UTC date.
pub fn archive_name_today(tab: ResizeTab) -> String {
    archive_name(tab, chrono::Utc::now().date_naive())
}

#[cfg(test)]
#[path = "../../tests/unit/export/archive.rs"]
mod tests;
