//! Track converter (OBJ -> .track)
//!
//! Faces are linked through the edges they share by OBJ position index,
//! so texture seams do not break the walkable surface apart. Vertical
//! slivers (the risers of steps) are then removed and the faces on either
//! side linked directly.

use anyhow::{Context, Result, bail};
use page_common::Track;
use std::path::Path;

use crate::mesh::obj::parse_obj_file;
use crate::write_asset;

/// Convert an OBJ surface to an in-memory track
pub fn convert_obj_track_to_memory(input: &Path) -> Result<Track> {
    let obj = parse_obj_file(input)?;

    let mut triangles = Vec::new();
    for (index, face) in obj.position_faces().iter().enumerate() {
        if face.len() < 3 {
            bail!("Face {} has only {} corners", index, face.len());
        }
        // Fan split, as for meshes
        for i in 1..face.len() - 1 {
            triangles.push([face[0], face[i], face[i + 1]]);
        }
    }

    let mut track = Track::from_triangles(&obj.positions, &triangles)
        .with_context(|| format!("Failed to build track from {:?}", input))?;

    for index in track.collinear_faces() {
        let [a, b, c] = track.faces[index].vertices;
        tracing::warn!("Collinear face {}: {} {} {}", index, a, b, c);
    }

    let removed = track.remove_slivers();
    if removed > 0 {
        tracing::info!("Removed {} vertical sliver faces", removed);
    }
    let unwalkable = track.faces.iter().filter(|f| !f.is_walkable()).count();
    if unwalkable > 0 {
        tracing::warn!("{} faces do not face up and cannot be walked on", unwalkable);
    }

    Ok(track)
}

/// Convert an OBJ surface to a PAGEtrack file
pub fn convert_obj_track(input: &Path, output: &Path) -> Result<Track> {
    let track = convert_obj_track_to_memory(input)?;

    write_asset(&track, output)?;

    let boundary = track
        .faces
        .iter()
        .flat_map(|f| f.neighbours)
        .filter(Option::is_none)
        .count();
    tracing::info!(
        "Exported track: {} faces, {} boundary edges",
        track.faces.len(),
        boundary
    );

    Ok(track)
}
