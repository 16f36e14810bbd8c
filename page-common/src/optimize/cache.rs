//! FIFO vertex cache simulation

use std::collections::VecDeque;

/// Result of running a triangle list through a FIFO vertex cache
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Vertex references issued (three per triangle)
    pub pushes: usize,
    /// References that were not resident in the cache
    pub misses: usize,
}

impl CacheStats {
    /// Fraction of references served from the cache
    ///
    /// An empty triangle list has no references and reports `0.0`.
    pub fn hit_rate(&self) -> f32 {
        if self.pushes == 0 {
            return 0.0;
        }
        1.0 - self.misses as f32 / self.pushes as f32
    }

    /// Average cache miss ratio: misses per triangle
    pub fn acmr(&self) -> f32 {
        if self.pushes == 0 {
            return 0.0;
        }
        self.misses as f32 / (self.pushes / 3) as f32
    }
}

/// Simulate a FIFO cache of `cache_size` entries over `triangles`
///
/// A miss inserts the vertex at the front and drops the oldest entry when
/// full; a hit leaves the cache order untouched.
pub fn simulate_cache(triangles: &[[u32; 3]], cache_size: usize) -> CacheStats {
    let mut cache: VecDeque<u32> = VecDeque::with_capacity(cache_size + 1);
    let mut stats = CacheStats::default();
    for &index in triangles.iter().flatten() {
        stats.pushes += 1;
        if !cache.contains(&index) {
            cache.push_front(index);
            cache.truncate(cache_size);
            stats.misses += 1;
        }
    }
    stats
}
