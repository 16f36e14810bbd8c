//! glTF/GLB mesh import

use anyhow::{Context, Result, bail};
use glam::{Vec2, Vec3};
use page_common::{Face, Influence, PolyMesh, Vertex};
use std::path::Path;

use crate::skeleton::joint_name;

/// Load the first mesh of a glTF/GLB file as a polygon mesh
///
/// Every triangle primitive is appended into one vertex/face list.
/// Primitives with a double-sided material produce two-sided faces. When
/// the mesh is skinned, joint/weight pairs become influences named after
/// the joint nodes.
pub fn parse_gltf_file(input: &Path) -> Result<PolyMesh> {
    let (document, buffers, _images) =
        gltf::import(input).with_context(|| format!("Failed to load glTF: {:?}", input))?;

    // Get the first mesh
    let mesh = document
        .meshes()
        .next()
        .context("No meshes found in glTF")?;

    // Joint names come from the skin of the node instancing this mesh
    let skin = document
        .nodes()
        .find(|n| n.mesh().is_some_and(|m| m.index() == mesh.index()))
        .and_then(|n| n.skin())
        .or_else(|| document.skins().next());
    let joint_names: Vec<String> = skin
        .map(|s| s.joints().map(|j| joint_name(&j)).collect())
        .unwrap_or_default();

    let mut vertices: Vec<Vertex> = Vec::new();
    let mut faces: Vec<Face> = Vec::new();

    for (index, primitive) in mesh.primitives().enumerate() {
        if primitive.mode() != gltf::mesh::Mode::Triangles {
            tracing::warn!(
                "Skipping primitive {} with mode {:?} (only triangles are supported)",
                index,
                primitive.mode()
            );
            continue;
        }

        let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));
        let base = vertices.len() as u32;

        // Positions (required)
        let positions: Vec<Vec3> = reader
            .read_positions()
            .with_context(|| format!("No positions in primitive {}", index))?
            .map(Vec3::from_array)
            .collect();
        let count = positions.len();

        let normals: Option<Vec<[f32; 3]>> = reader.read_normals().map(|iter| iter.collect());
        let uvs: Option<Vec<[f32; 2]>> = reader
            .read_tex_coords(0)
            .map(|iter| iter.into_f32().collect());

        // Skinning data (optional) - JOINTS_0 and WEIGHTS_0
        let joints: Option<Vec<[u16; 4]>> =
            reader.read_joints(0).map(|iter| iter.into_u16().collect());
        let weights: Option<Vec<[f32; 4]>> =
            reader.read_weights(0).map(|iter| iter.into_f32().collect());
        let skinning = match (joints, weights) {
            (Some(j), Some(w)) if j.len() == count && w.len() == count => {
                if joint_names.is_empty() {
                    tracing::warn!("Mesh has skinning data but no skin, ignoring skinning");
                    None
                } else {
                    Some((j, w))
                }
            }
            (None, None) => None,
            _ => {
                tracing::warn!(
                    "Mesh has partial skinning data (joints or weights missing), ignoring skinning"
                );
                None
            }
        };

        for (i, &position) in positions.iter().enumerate() {
            let mut vertex = Vertex::new(position);
            if let Some(n) = normals.as_ref().and_then(|n| n.get(i)) {
                vertex.normal = Vec3::from_array(*n);
            }
            if let Some(uv) = uvs.as_ref().and_then(|uv| uv.get(i)) {
                // glTF puts the texture origin top-left; OBJ-style bottom-left
                vertex.uv = Vec2::new(uv[0], 1.0 - uv[1]);
            }
            if let Some((joints, weights)) = &skinning {
                vertex.influences = influences(&joints[i], &weights[i], &joint_names)
                    .with_context(|| format!("Invalid skinning at vertex {}", i))?;
            }
            vertices.push(vertex);
        }

        // Indices (optional)
        let indices: Vec<u32> = match reader.read_indices() {
            Some(iter) => iter.into_u32().collect(),
            None => (0..count as u32).collect(),
        };
        if indices.len() % 3 != 0 {
            bail!(
                "Primitive {} has {} indices, not a multiple of 3",
                index,
                indices.len()
            );
        }
        if let Some(&bad) = indices.iter().find(|&&i| i as usize >= count) {
            bail!(
                "Primitive {} index {} out of range ({} vertices)",
                index,
                bad,
                count
            );
        }

        let two_sided = primitive.material().double_sided();
        faces.extend(indices.chunks_exact(3).map(|tri| {
            let corners = tri.iter().map(|&i| base + i).collect();
            if two_sided {
                Face::two_sided(corners)
            } else {
                Face::new(corners)
            }
        }));
    }

    if vertices.is_empty() {
        bail!(
            "No triangle geometry found in mesh '{}'",
            mesh.name().unwrap_or("unnamed")
        );
    }

    Ok(PolyMesh::new(vertices, faces))
}

/// Non-zero joint weights of one vertex as named influences
fn influences(joints: &[u16; 4], weights: &[f32; 4], names: &[String]) -> Result<Vec<Influence>> {
    let mut influences = Vec::new();
    for (&joint, &weight) in joints.iter().zip(weights) {
        if weight == 0.0 {
            continue;
        }
        let name = names.get(joint as usize).with_context(|| {
            format!("Joint index {} exceeds skin joint count {}", joint, names.len())
        })?;
        influences.push(Influence::new(name.clone(), weight));
    }
    Ok(influences)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> Vec<String> {
        vec!["Root".to_string(), "Spine".to_string()]
    }

    #[test]
    fn test_influences_skip_zero_weights() {
        let influences = influences(&[1, 0, 0, 0], &[0.75, 0.25, 0.0, 0.0], &names()).unwrap();
        assert_eq!(
            influences,
            vec![Influence::new("Spine", 0.75), Influence::new("Root", 0.25)]
        );
    }

    #[test]
    fn test_influences_reject_unknown_joint() {
        assert!(influences(&[2, 0, 0, 0], &[1.0, 0.0, 0.0, 0.0], &names()).is_err());
        // Zero-weight slots are not looked up
        assert!(influences(&[0, 9, 0, 0], &[1.0, 0.0, 0.0, 0.0], &names()).is_ok());
    }
}
