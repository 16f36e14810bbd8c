//! Programmatic GLB generation for integration tests.
//!
//! The rig is a skinned vertical strip driven by three bones
//! (Root -> Spine -> Head) under a non-joint "Armature" node, plus one
//! short clip ("Nod") that leaves Root untouched.

mod buffer;
mod document;
mod glb_assembly;
mod rig_data;

#[allow(unused_imports)]
pub use rig_data::{JOINT_NAMES, ROW_HEIGHT};

/// Generate the skinned test rig as GLB bytes
pub fn generate_skinned_glb() -> Vec<u8> {
    let (root, buffer_data) = document::build_document();
    glb_assembly::assemble_glb(root, &buffer_data)
}
