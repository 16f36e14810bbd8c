//! Mesh preparation before optimization
//!
//! Authoring meshes arrive as polygons that may be degenerate, have more
//! than three corners, or be flagged two-sided. The passes here turn them
//! into the plain triangle list [`crate::optimize`] expects:
//!
//! ```text
//! PolyMesh -> clean -> tessellate -> bake_two_sided -> Mesh
//! ```

use tracing::{debug, warn};

use crate::error::MeshError;
use crate::types::{Face, Mesh, PolyMesh};

/// Drop unusable faces, then vertices no face references
///
/// A face is dropped if it has fewer than three corners, references a
/// vertex that does not exist, or repeats a position between corners
/// (0, 1), (1, 2) or (2, 0). Surviving vertices keep their relative order.
pub fn clean(mesh: &PolyMesh) -> PolyMesh {
    let count = mesh.vertices.len();
    let position = |i: u32| mesh.vertices[i as usize].position;

    let faces: Vec<&Face> = mesh
        .faces
        .iter()
        .enumerate()
        .filter(|(index, face)| {
            if let Some(&bad) = face.vertices.iter().find(|&&i| i as usize >= count) {
                warn!(
                    "Dropping face {}: vertex {} out of range ({} vertices)",
                    index, bad, count
                );
                return false;
            }
            match face.vertices[..] {
                [a, b, c, ..] => {
                    position(a) != position(b)
                        && position(b) != position(c)
                        && position(c) != position(a)
                }
                _ => false,
            }
        })
        .map(|(_, face)| face)
        .collect();

    let mut used = vec![false; count];
    for &i in faces.iter().flat_map(|f| &f.vertices) {
        used[i as usize] = true;
    }

    let mut remap = vec![0u32; count];
    let mut vertices = Vec::with_capacity(count);
    for (old, vertex) in mesh.vertices.iter().enumerate() {
        if used[old] {
            remap[old] = vertices.len() as u32;
            vertices.push(vertex.clone());
        }
    }

    let faces: Vec<Face> = faces
        .into_iter()
        .map(|f| Face {
            vertices: f.vertices.iter().map(|&i| remap[i as usize]).collect(),
            two_sided: f.two_sided,
        })
        .collect();

    debug!(
        "Cleaned mesh: {} -> {} faces, {} -> {} vertices",
        mesh.faces.len(),
        faces.len(),
        count,
        vertices.len()
    );

    PolyMesh::new(vertices, faces)
}

/// Fan-split every face with more than three corners
///
/// Each polygon keeps its slot as the triangle `(0, 1, 2)`; the triangles
/// `(0, i, i + 1)` for the remaining corners are appended after all
/// existing faces, carrying the polygon's two-sided flag.
pub fn tessellate(mesh: &PolyMesh) -> PolyMesh {
    let mut faces: Vec<Face> = Vec::with_capacity(mesh.faces.len());
    let mut extra = Vec::new();
    for face in &mesh.faces {
        let corners = &face.vertices;
        if corners.len() > 3 {
            for i in 2..corners.len() - 1 {
                extra.push(Face {
                    vertices: vec![corners[0], corners[i], corners[i + 1]],
                    two_sided: face.two_sided,
                });
            }
            faces.push(Face {
                vertices: corners[..3].to_vec(),
                two_sided: face.two_sided,
            });
        } else {
            faces.push(face.clone());
        }
    }

    if !extra.is_empty() {
        debug!("Tessellated polygons into {} extra triangles", extra.len());
    }
    faces.extend(extra);
    PolyMesh::new(mesh.vertices.clone(), faces)
}

/// Replace every two-sided face with a front and a reversed back face
///
/// Back faces are appended after all existing faces. Every face of the
/// result is one-sided.
pub fn bake_two_sided(mesh: &PolyMesh) -> PolyMesh {
    let mut faces: Vec<Face> = mesh
        .faces
        .iter()
        .map(|f| Face::new(f.vertices.clone()))
        .collect();
    let backs: Vec<Face> = mesh
        .faces
        .iter()
        .filter(|f| f.two_sided)
        .map(|f| Face::new(f.vertices.iter().rev().copied().collect()))
        .collect();

    if !backs.is_empty() {
        debug!("Baked {} two-sided faces", backs.len());
    }
    faces.extend(backs);
    PolyMesh::new(mesh.vertices.clone(), faces)
}

/// Run the whole preparation chain and convert to a triangle mesh
pub fn prepare(mesh: PolyMesh) -> Result<Mesh, MeshError> {
    let mesh = bake_two_sided(&tessellate(&clean(&mesh)));
    Mesh::try_from(mesh)
}
