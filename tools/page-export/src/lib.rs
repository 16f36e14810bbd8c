//! page-export library
//!
//! Converts authoring sources (OBJ, glTF/GLB) into PAGE native assets and
//! drives manifest builds. The binary in `main.rs` is a thin CLI over these
//! functions.

pub mod animation;
pub mod inspect;
pub mod manifest;
pub mod mesh;
pub mod skeleton;
pub mod track;

use anyhow::{Context, Result};
use page_common::NativeFormat;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

// Re-export key conversion entry points
pub use animation::{convert_gltf_animation, convert_gltf_animation_to_memory};
pub use inspect::{Summary, inspect_file};
pub use mesh::{MeshOptions, convert_gltf_to_memory, convert_mesh, convert_obj_to_memory};
pub use skeleton::{convert_gltf_skeleton, convert_gltf_skeleton_to_memory};
pub use track::{convert_obj_track, convert_obj_track_to_memory};

/// Encode `asset` and write it to `output`
pub fn write_asset<T: NativeFormat>(asset: &T, output: &Path) -> Result<()> {
    let file =
        File::create(output).with_context(|| format!("Failed to create output: {:?}", output))?;
    let mut writer = BufWriter::new(file);

    asset
        .write_to(&mut writer)
        .with_context(|| format!("Failed to write {}: {:?}", T::NAME, output))?;
    writer
        .flush()
        .with_context(|| format!("Failed to flush output: {:?}", output))?;

    Ok(())
}
