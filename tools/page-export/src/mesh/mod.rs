//! Mesh converter (OBJ/glTF -> .mesh)
//!
//! Every source goes through the same chain before it is written:
//! clean, tessellate, bake two-sided faces, then optionally reorder for
//! the vertex cache.

mod gltf;
pub mod obj;

use anyhow::{Context, Result, bail};
use page_common::{CACHE_SIZE, Mesh, PolyMesh, prep, simulate_cache};
use std::path::Path;

use crate::write_asset;

/// Weights further than this from 1 are reported as unnormalized
const WEIGHT_TOLERANCE: f32 = 1e-3;

/// Options applied to every converted mesh
#[derive(Debug, Clone, Copy)]
pub struct MeshOptions {
    /// Reorder triangles and vertices for the post-transform vertex cache
    pub optimize: bool,
}

impl Default for MeshOptions {
    fn default() -> Self {
        Self { optimize: true }
    }
}

/// Convert an OBJ file to an in-memory mesh
pub fn convert_obj_to_memory(input: &Path, options: MeshOptions) -> Result<Mesh> {
    let poly = obj::parse_obj_file(input)?.to_poly_mesh();
    finish(poly, options).with_context(|| format!("Failed to convert OBJ: {:?}", input))
}

/// Convert the first mesh of a glTF/GLB file to an in-memory mesh
pub fn convert_gltf_to_memory(input: &Path, options: MeshOptions) -> Result<Mesh> {
    let poly = self::gltf::parse_gltf_file(input)?;
    finish(poly, options).with_context(|| format!("Failed to convert glTF: {:?}", input))
}

/// Convert a mesh source to a PAGEmesh file, choosing the importer by
/// extension
pub fn convert_mesh(input: &Path, output: &Path, options: MeshOptions) -> Result<Mesh> {
    // Detect format by extension
    let ext = input
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();

    let mesh = match ext.as_str() {
        "obj" => convert_obj_to_memory(input, options)?,
        "gltf" | "glb" => convert_gltf_to_memory(input, options)?,
        _ => bail!(
            "Unsupported mesh format: {:?} (use .obj, .gltf, or .glb)",
            input
        ),
    };

    write_asset(&mesh, output)?;

    tracing::info!(
        "Converted mesh: {} vertices, {} triangles, {} influence names",
        mesh.vertices.len(),
        mesh.triangles.len(),
        mesh.influence_names().len()
    );

    Ok(mesh)
}

/// Prepare, check and optionally optimize an imported polygon mesh
fn finish(poly: PolyMesh, options: MeshOptions) -> Result<Mesh> {
    let mut mesh = prep::prepare(poly)?;

    let unnormalized = mesh.unnormalized_vertices(WEIGHT_TOLERANCE);
    if !unnormalized.is_empty() {
        tracing::warn!(
            "{} vertices have weights that do not sum to 1 (first: vertex {})",
            unnormalized.len(),
            unnormalized[0]
        );
    }

    if options.optimize {
        mesh = page_common::optimize(&mesh);
        let stats = simulate_cache(&mesh.triangles, CACHE_SIZE);
        tracing::info!(
            "Optimized for a {}-entry vertex cache: {:.1}% hits, ACMR {:.3}",
            CACHE_SIZE,
            stats.hit_rate() * 100.0,
            stats.acmr()
        );
    }

    Ok(mesh)
}
