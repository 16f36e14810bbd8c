//! Vertex cache optimization
//!
//! [`optimize`] reorders a triangle mesh for post-transform vertex cache
//! reuse: triangles are put in Forsyth draw order, then vertices are
//! renumbered in the order that draw list first references them. The result
//! holds exactly the input's triangles and vertices.

mod cache;
pub mod forsyth;

pub use cache::{CacheStats, simulate_cache};
pub use forsyth::{
    CACHE_DECAY_POWER, LAST_TRIANGLE_SCORE, VALENCE_BOOST_POWER, VALENCE_BOOST_SCALE,
    vertex_score,
};

use tracing::debug;

use crate::error::MeshError;
use crate::types::{Mesh, PolyMesh};

/// Entries in the simulated vertex cache
pub const CACHE_SIZE: usize = 32;

/// Reorder `mesh` for vertex cache locality
///
/// Deterministic for a given input. Vertices no triangle references are
/// kept after the referenced ones, in their original order.
///
/// # Panics
///
/// Panics if a triangle references a vertex outside `mesh.vertices`. Use
/// [`optimize_faces`] for unchecked input.
pub fn optimize(mesh: &Mesh) -> Mesh {
    let order = forsyth::draw_order(mesh.vertices.len(), &mesh.triangles);

    const UNMAPPED: u32 = u32::MAX;
    let mut remap = vec![UNMAPPED; mesh.vertices.len()];
    let mut vertices = Vec::with_capacity(mesh.vertices.len());
    let mut triangles = Vec::with_capacity(order.len());
    for &t in &order {
        let tri = mesh.triangles[t as usize].map(|index| {
            let slot = &mut remap[index as usize];
            if *slot == UNMAPPED {
                *slot = vertices.len() as u32;
                vertices.push(mesh.vertices[index as usize].clone());
            }
            *slot
        });
        triangles.push(tri);
    }

    let referenced = vertices.len();
    for (old, &slot) in remap.iter().enumerate() {
        if slot == UNMAPPED {
            vertices.push(mesh.vertices[old].clone());
        }
    }
    if vertices.len() > referenced {
        debug!(
            "Kept {} unreferenced vertices at the end",
            vertices.len() - referenced
        );
    }

    if tracing::enabled!(tracing::Level::DEBUG) {
        let before = simulate_cache(&mesh.triangles, CACHE_SIZE);
        let after = simulate_cache(&triangles, CACHE_SIZE);
        debug!(
            "Vertex cache hit rate {:.2}% -> {:.2}% (ACMR {:.3} -> {:.3})",
            before.hit_rate() * 100.0,
            after.hit_rate() * 100.0,
            before.acmr(),
            after.acmr()
        );
    }

    Mesh::new(vertices, triangles)
}

/// Check that every face of `mesh` is an in-range triangle, then optimize
pub fn optimize_faces(mesh: PolyMesh) -> Result<Mesh, MeshError> {
    let mesh = Mesh::try_from(mesh)?;
    Ok(optimize(&mesh))
}
