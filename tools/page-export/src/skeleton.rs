//! Skeleton converter (glTF -> .skel)
//!
//! Bones are the joints of a glTF skin, each in its parent joint's space.
//! Joints are reordered so every parent precedes its children.

use anyhow::{Context, Result, bail};
use glam::{Mat4, Quat, Vec3};
use hashbrown::{HashMap, HashSet};
use page_common::{Bone, Skeleton};
use std::path::Path;

use crate::write_asset;

/// Name used for a joint node in bones, influences and animation tracks
pub(crate) fn joint_name(node: &gltf::Node) -> String {
    node.name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("node{}", node.index()))
}

/// Pick a skin by index, or the first one
pub(crate) fn select_skin(
    document: &gltf::Document,
    index: Option<usize>,
) -> Result<gltf::Skin<'_>> {
    if let Some(idx) = index {
        document
            .skins()
            .nth(idx)
            .with_context(|| format!("Skin index {} not found in glTF", idx))
    } else {
        document
            .skins()
            .next()
            .context("No skins found in glTF file")
    }
}

/// Where a bone comes from in the glTF node tree
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct JointNode {
    pub index: usize,
    /// Combined transform of the non-joint nodes between this joint and
    /// its parent bone
    pub offset: Mat4,
}

/// Skeleton of `skin` plus the glTF node of each bone
pub(crate) fn build_skeleton(
    document: &gltf::Document,
    skin: &gltf::Skin,
) -> Result<(Skeleton, Vec<JointNode>)> {
    let joints: Vec<gltf::Node> = skin.joints().collect();
    if joints.is_empty() {
        bail!("No bones found in skin");
    }

    let parent_of: HashMap<usize, usize> = document
        .nodes()
        .flat_map(|n| {
            let parent = n.index();
            n.children().map(move |c| (c.index(), parent))
        })
        .collect();
    let joint_of: HashMap<usize, usize> = joints
        .iter()
        .enumerate()
        .map(|(i, j)| (j.index(), i))
        .collect();
    let nodes: Vec<gltf::Node> = document.nodes().collect();

    // Nearest joint ancestor of each joint, plus the nodes in between
    let mut parents: Vec<Option<usize>> = Vec::with_capacity(joints.len());
    let mut local: Vec<(Vec3, Quat)> = Vec::with_capacity(joints.len());
    let mut offsets: Vec<Mat4> = Vec::with_capacity(joints.len());
    for joint in &joints {
        let mut between = Vec::new();
        let mut parent = None;
        let mut current = joint.index();
        while let Some(&up) = parent_of.get(&current) {
            if let Some(&j) = joint_of.get(&up) {
                parent = Some(j);
                break;
            }
            if between.len() > nodes.len() {
                bail!("Node hierarchy above joint '{}' has a cycle", joint_name(joint));
            }
            between.push(up);
            current = up;
        }
        if parent.is_none() {
            // Roots ignore whatever non-joint nodes sit above them
            between.clear();
        }

        let mut offset = Mat4::IDENTITY;
        for &node in &between {
            offset = Mat4::from_cols_array_2d(&nodes[node].transform().matrix()) * offset;
        }

        let (t, r, _scale) = joint.transform().decomposed();
        let (mut position, mut orientation) = (Vec3::from_array(t), Quat::from_array(r));
        if offset != Mat4::IDENTITY {
            let matrix = offset * Mat4::from_cols_array_2d(&joint.transform().matrix());
            let (_scale, rotation, translation) = matrix.to_scale_rotation_translation();
            position = translation;
            orientation = rotation;
        }

        parents.push(parent);
        local.push((position, orientation));
        offsets.push(offset);
    }

    // Parents first, otherwise keeping skin order
    let mut order = Vec::with_capacity(joints.len());
    let mut placed = vec![false; joints.len()];
    for start in 0..joints.len() {
        let mut chain = Vec::new();
        let mut current = Some(start);
        while let Some(j) = current {
            if placed[j] {
                break;
            }
            if chain.len() > joints.len() {
                bail!("Joint hierarchy has a cycle");
            }
            chain.push(j);
            current = parents[j];
        }
        for &j in chain.iter().rev() {
            placed[j] = true;
            order.push(j);
        }
    }

    let mut new_index = vec![0usize; joints.len()];
    for (new, &old) in order.iter().enumerate() {
        new_index[old] = new;
    }

    let mut names = HashSet::new();
    let mut bones = Vec::with_capacity(order.len());
    for &old in &order {
        let name = joint_name(&joints[old]);
        if !names.insert(name.clone()) {
            tracing::warn!("Duplicate bone name '{}' in skin", name);
        }
        let (position, orientation) = local[old];
        bones.push(Bone {
            name,
            position,
            orientation,
            parent: parents[old].map(|p| new_index[p]),
        });
    }

    let joint_nodes = order
        .iter()
        .map(|&old| JointNode {
            index: joints[old].index(),
            offset: offsets[old],
        })
        .collect();
    Ok((Skeleton::new(bones), joint_nodes))
}

/// Convert a glTF skin to an in-memory skeleton
pub fn convert_gltf_skeleton_to_memory(
    input: &Path,
    skin_index: Option<usize>,
) -> Result<Skeleton> {
    let (document, _buffers, _images) =
        gltf::import(input).with_context(|| format!("Failed to load glTF: {:?}", input))?;

    let skin = select_skin(&document, skin_index)?;
    let (skeleton, _) = build_skeleton(&document, &skin)?;
    Ok(skeleton)
}

/// Convert a glTF skin to a PAGEskel file
pub fn convert_gltf_skeleton(
    input: &Path,
    output: &Path,
    skin_index: Option<usize>,
) -> Result<Skeleton> {
    let skeleton = convert_gltf_skeleton_to_memory(input, skin_index)?;

    write_asset(&skeleton, output)?;

    tracing::info!(
        "Exported skeleton: {} bones, {} roots",
        skeleton.bones.len(),
        skeleton.bones.iter().filter(|b| b.parent.is_none()).count()
    );

    Ok(skeleton)
}

/// List available skins in a glTF file
pub fn list_skins(input: &Path) -> Result<()> {
    let (document, _buffers, _images) =
        gltf::import(input).with_context(|| format!("Failed to load glTF: {:?}", input))?;

    let skins: Vec<_> = document.skins().collect();
    if skins.is_empty() {
        tracing::info!("No skins found in {:?}", input);
        return Ok(());
    }

    tracing::info!("Skins in {:?}:", input);
    for (i, skin) in skins.iter().enumerate() {
        let name = skin.name().unwrap_or("unnamed");
        let joint_count = skin.joints().count();
        tracing::info!("  [{}] '{}': {} joints", i, name, joint_count);
    }

    Ok(())
}
