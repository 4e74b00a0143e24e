use std::collections::HashMap;

use crate::foundation::error::{LetterpressError, LetterpressResult};

/// Environment variable overriding [`SurfacePoolOpts::max_pool_bytes`].
pub const ENV_POOL_MAX_BYTES: &str = "LETTERPRESS_POOL_MAX_BYTES";
/// Environment variable overriding [`SurfacePoolOpts::max_surfaces_per_bucket`].
pub const ENV_POOL_MAX_PER_BUCKET: &str = "LETTERPRESS_POOL_MAX_PER_BUCKET";

/// Pool configuration for cached scratch surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfacePoolOpts {
    /// Maximum bytes retained across all buckets.
    pub max_pool_bytes: usize,
    /// Maximum number of retained surfaces per `(w, h)` bucket.
    pub max_surfaces_per_bucket: usize,
}

impl Default for SurfacePoolOpts {
    fn default() -> Self {
        Self {
            max_pool_bytes: 128 * 1024 * 1024,
            max_surfaces_per_bucket: 8,
        }
    }
}

impl SurfacePoolOpts {
    /// Defaults overridden by `LETTERPRESS_POOL_MAX_BYTES` / `LETTERPRESS_POOL_MAX_PER_BUCKET`.
    ///
    /// Unparseable or zero values keep the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let d = Self::default();
        let read = |key: &str, default: usize| {
            lookup(key)
                .and_then(|v| v.trim().parse::<usize>().ok())
                .filter(|v| *v > 0)
                .unwrap_or(default)
        };
        Self {
            max_pool_bytes: read(ENV_POOL_MAX_BYTES, d.max_pool_bytes),
            max_surfaces_per_bucket: read(ENV_POOL_MAX_PER_BUCKET, d.max_surfaces_per_bucket),
        }
    }

    /// Options that never retain anything.
    pub fn disabled() -> Self {
        Self {
            max_pool_bytes: 0,
            max_surfaces_per_bucket: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct SurfaceKey {
    w: u16,
    h: u16,
}

impl SurfaceKey {
    fn byte_len(self) -> usize {
        (self.w as usize)
            .saturating_mul(self.h as usize)
            .saturating_mul(4)
    }
}

/// Counters describing pool behaviour.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SurfacePoolStats {
    /// Surfaces currently held for reuse.
    pub retained_surfaces: usize,
    /// Bytes currently held for reuse.
    pub retained_bytes: usize,
    /// Fresh allocations made by `borrow`.
    pub alloc_surfaces: u64,
    /// Bytes allocated by `borrow`.
    pub alloc_bytes: u64,
    /// Surfaces served from the pool.
    pub reused_surfaces: u64,
    /// Released surfaces dropped because a cap was reached.
    pub dropped_on_release: u64,
}

/// Bounded pooled allocator for the CPU pixmaps used as render layers and masks.
///
/// Keyed by `(width, height)`. Borrowed surfaces are always fully transparent.
pub(crate) struct SurfacePool {
    opts: SurfacePoolOpts,
    stats: SurfacePoolStats,
    buckets: HashMap<SurfaceKey, Vec<vello_cpu::Pixmap>>,
}

impl SurfacePool {
    pub(crate) fn new(opts: SurfacePoolOpts) -> Self {
        Self {
            opts,
            stats: SurfacePoolStats::default(),
            buckets: HashMap::new(),
        }
    }

    pub(crate) fn stats(&self) -> SurfacePoolStats {
        self.stats.clone()
    }

    pub(crate) fn borrow(&mut self, width: u32, height: u32) -> LetterpressResult<vello_cpu::Pixmap> {
        let key = key_for(width, height)?;
        if let Some(mut p) = self.buckets.get_mut(&key).and_then(Vec::pop) {
            self.stats.retained_surfaces = self.stats.retained_surfaces.saturating_sub(1);
            self.stats.retained_bytes = self.stats.retained_bytes.saturating_sub(key.byte_len());
            self.stats.reused_surfaces = self.stats.reused_surfaces.saturating_add(1);
            p.data_as_u8_slice_mut().fill(0);
            return Ok(p);
        }

        self.stats.alloc_surfaces = self.stats.alloc_surfaces.saturating_add(1);
        self.stats.alloc_bytes = self.stats.alloc_bytes.saturating_add(key.byte_len() as u64);
        Ok(vello_cpu::Pixmap::new(key.w, key.h))
    }

    pub(crate) fn release(&mut self, pixmap: vello_cpu::Pixmap) {
        if self.opts.max_pool_bytes == 0 || self.opts.max_surfaces_per_bucket == 0 {
            self.stats.dropped_on_release = self.stats.dropped_on_release.saturating_add(1);
            return;
        }

        let key = SurfaceKey {
            w: pixmap.width(),
            h: pixmap.height(),
        };
        let bytes = key.byte_len();
        if self.stats.retained_bytes.saturating_add(bytes) > self.opts.max_pool_bytes {
            self.stats.dropped_on_release = self.stats.dropped_on_release.saturating_add(1);
            return;
        }

        let bucket = self.buckets.entry(key).or_default();
        if bucket.len() >= self.opts.max_surfaces_per_bucket {
            self.stats.dropped_on_release = self.stats.dropped_on_release.saturating_add(1);
            return;
        }

        bucket.push(pixmap);
        self.stats.retained_surfaces = self.stats.retained_surfaces.saturating_add(1);
        self.stats.retained_bytes = self.stats.retained_bytes.saturating_add(bytes);
    }
}

fn key_for(width: u32, height: u32) -> LetterpressResult<SurfaceKey> {
    let w: u16 = width
        .try_into()
        .map_err(|_| LetterpressError::render(format!("surface width exceeds u16: {width}")))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| LetterpressError::render(format!("surface height exceeds u16: {height}")))?;
    if w == 0 || h == 0 {
        return Err(LetterpressError::render("surface dimensions must be > 0"));
    }
    Ok(SurfaceKey { w, h })
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface_pool.rs"]
mod tests;
