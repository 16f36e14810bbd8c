//! Linear-speed vertex cache optimization (Tom Forsyth, 2006)
//!
//! Greedy draw-order search: each step draws the best-scoring triangle
//! among those touching the simulated cache, then updates only what that
//! draw affected. Per-vertex bookkeeping lives in a flat arena indexed by
//! vertex; incident triangles are ranges of one shared adjacency array.

use super::CACHE_SIZE;

/// Exponent of the cache position falloff
pub const CACHE_DECAY_POWER: f32 = 1.5;

/// Cache score of the three most recently used slots
pub const LAST_TRIANGLE_SCORE: f32 = 0.75;

/// Scale of the bonus for vertices with few remaining triangles
pub const VALENCE_BOOST_SCALE: f32 = 2.0;

/// Exponent of the remaining-triangle bonus
pub const VALENCE_BOOST_POWER: f32 = 0.5;

/// Score of a vertex at `cache_slot` (front = 0) with `valence` undrawn
/// triangles left
pub fn vertex_score(cache_slot: Option<usize>, valence: u32) -> f32 {
    if valence == 0 {
        return 0.0;
    }

    let cache_score = match cache_slot {
        None => 0.0,
        Some(slot) if slot < 3 => LAST_TRIANGLE_SCORE,
        Some(slot) => {
            let scaler = 1.0 / (CACHE_SIZE - 3) as f32;
            (1.0 - (slot - 3) as f32 * scaler).powf(CACHE_DECAY_POWER)
        }
    };

    cache_score + VALENCE_BOOST_SCALE * (valence as f32).powf(-VALENCE_BOOST_POWER)
}

#[derive(Debug, Clone, Copy, Default)]
struct VertexRecord {
    /// Undrawn incident triangles
    valence: u32,
    cache_slot: Option<usize>,
    score: f32,
    /// Start of this vertex's range in the adjacency array
    first: usize,
}

struct Optimizer<'a> {
    triangles: &'a [[u32; 3]],
    vertices: Vec<VertexRecord>,
    /// Incident triangles per vertex; undrawn ones first
    adjacency: Vec<u32>,
    drawn: Vec<bool>,
    /// Most recent first
    cache: Vec<u32>,
}

impl<'a> Optimizer<'a> {
    fn new(vertex_count: usize, triangles: &'a [[u32; 3]]) -> Self {
        let mut vertices = vec![VertexRecord::default(); vertex_count];
        for &index in triangles.iter().flatten() {
            vertices[index as usize].valence += 1;
        }

        let mut first = 0;
        for v in &mut vertices {
            v.first = first;
            first += v.valence as usize;
            v.score = vertex_score(None, v.valence);
        }

        let mut fill: Vec<usize> = vertices.iter().map(|v| v.first).collect();
        let mut adjacency = vec![0u32; first];
        for (t, tri) in triangles.iter().enumerate() {
            for &index in tri {
                let slot = &mut fill[index as usize];
                adjacency[*slot] = t as u32;
                *slot += 1;
            }
        }

        Self {
            triangles,
            vertices,
            adjacency,
            drawn: vec![false; triangles.len()],
            cache: Vec::with_capacity(CACHE_SIZE + 3),
        }
    }

    fn triangle_score(&self, t: u32) -> f32 {
        self.triangles[t as usize]
            .iter()
            .map(|&v| self.vertices[v as usize].score)
            .sum()
    }

    /// Best of `candidates`, first one winning ties
    fn best_of(&self, candidates: impl Iterator<Item = u32>) -> Option<u32> {
        let mut best = None;
        let mut best_score = f32::NEG_INFINITY;
        for t in candidates {
            let score = self.triangle_score(t);
            if score > best_score {
                best = Some(t);
                best_score = score;
            }
        }
        best
    }

    fn undrawn(&self, v: u32) -> &[u32] {
        let record = &self.vertices[v as usize];
        &self.adjacency[record.first..record.first + record.valence as usize]
    }

    /// Record `t` as drawn and update the cache and scores it affects
    fn draw(&mut self, t: u32) {
        self.drawn[t as usize] = true;

        let tri = self.triangles[t as usize];
        for v in tri {
            let record = &mut self.vertices[v as usize];
            let range = record.first..record.first + record.valence as usize;
            // Swap the drawn triangle to the end of the undrawn range
            if let Some(pos) = self.adjacency[range.clone()].iter().position(|&x| x == t) {
                self.adjacency.swap(range.start + pos, range.end - 1);
                record.valence -= 1;
            }

            if let Some(pos) = self.cache.iter().position(|&c| c == v) {
                self.cache.remove(pos);
            }
            self.cache.insert(0, v);
        }

        for evicted in self.cache.drain(CACHE_SIZE.min(self.cache.len())..) {
            let record = &mut self.vertices[evicted as usize];
            record.cache_slot = None;
            record.score = vertex_score(None, record.valence);
        }

        for (slot, &v) in self.cache.iter().enumerate() {
            let record = &mut self.vertices[v as usize];
            record.cache_slot = Some(slot);
            record.score = vertex_score(Some(slot), record.valence);
        }
    }

    fn next(&self) -> Option<u32> {
        let near = self
            .cache
            .iter()
            .flat_map(|&v| self.undrawn(v).iter().copied());
        self.best_of(near).or_else(|| {
            let remaining = (0..self.triangles.len() as u32).filter(|&t| !self.drawn[t as usize]);
            self.best_of(remaining)
        })
    }

    fn run(mut self) -> Vec<u32> {
        let mut order = Vec::with_capacity(self.triangles.len());
        let mut next = self.best_of(0..self.triangles.len() as u32);
        while let Some(t) = next {
            order.push(t);
            self.draw(t);
            next = self.next();
        }
        order
    }
}

/// Triangle draw order for `triangles` over `vertex_count` vertices
///
/// # Panics
///
/// Panics if a triangle references a vertex `>= vertex_count`.
pub fn draw_order(vertex_count: usize, triangles: &[[u32; 3]]) -> Vec<u32> {
    Optimizer::new(vertex_count, triangles).run()
}
