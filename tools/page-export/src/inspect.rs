//! Read back any PAGE file and summarize it

use anyhow::{Context, Result};
use page_common::{
    Animation, AssetKind, CACHE_SIZE, CameraSet, Mesh, NativeFormat, Skeleton, Track, detect,
    simulate_cache,
};
use std::fmt;
use std::fs;
use std::path::Path;

/// What an inspected file contains
#[derive(Debug, Clone, PartialEq)]
pub enum Summary {
    Mesh {
        vertices: usize,
        triangles: usize,
        influence_names: Vec<String>,
        /// Average cache miss ratio for the stored triangle order
        acmr: f32,
    },
    Skeleton {
        bones: usize,
        roots: usize,
    },
    Animation {
        bones: usize,
        frames: usize,
        duration: f32,
    },
    Track {
        faces: usize,
        boundary_edges: usize,
    },
    CameraSet {
        cameras: usize,
        track_faces: usize,
    },
}

impl Summary {
    pub fn kind(&self) -> AssetKind {
        match self {
            Summary::Mesh { .. } => AssetKind::Mesh,
            Summary::Skeleton { .. } => AssetKind::Skeleton,
            Summary::Animation { .. } => AssetKind::Animation,
            Summary::Track { .. } => AssetKind::Track,
            Summary::CameraSet { .. } => AssetKind::CameraSet,
        }
    }

    /// Decode `bytes` and summarize them
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let kind = detect(bytes).context("Not a PAGE file (unknown signature)")?;
        let summary = match kind {
            AssetKind::Mesh => {
                let mesh = Mesh::decode(bytes)?;
                Summary::Mesh {
                    vertices: mesh.vertices.len(),
                    triangles: mesh.triangles.len(),
                    influence_names: mesh
                        .influence_names()
                        .into_iter()
                        .map(str::to_string)
                        .collect(),
                    acmr: simulate_cache(&mesh.triangles, CACHE_SIZE).acmr(),
                }
            }
            AssetKind::Skeleton => {
                let skeleton = Skeleton::decode(bytes)?;
                Summary::Skeleton {
                    bones: skeleton.bones.len(),
                    roots: skeleton.bones.iter().filter(|b| b.parent.is_none()).count(),
                }
            }
            AssetKind::Animation => {
                let animation = Animation::decode(bytes)?;
                Summary::Animation {
                    bones: animation.bones.len(),
                    frames: animation.frame_count(),
                    duration: animation.duration,
                }
            }
            AssetKind::Track => {
                let track = Track::decode(bytes)?;
                Summary::Track {
                    faces: track.faces.len(),
                    boundary_edges: track
                        .faces
                        .iter()
                        .flat_map(|f| f.neighbours)
                        .filter(Option::is_none)
                        .count(),
                }
            }
            AssetKind::CameraSet => {
                let set = CameraSet::decode(bytes)?;
                Summary::CameraSet {
                    cameras: set.cameras.len(),
                    track_faces: set.track_faces.len(),
                }
            }
        };
        Ok(summary)
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Summary::Mesh {
                vertices,
                triangles,
                influence_names,
                acmr,
            } => write!(
                f,
                "PAGEmesh: {} vertices, {} triangles, {} influence names, ACMR {:.3}",
                vertices,
                triangles,
                influence_names.len(),
                acmr
            ),
            Summary::Skeleton { bones, roots } => {
                write!(f, "PAGEskel: {} bones, {} roots", bones, roots)
            }
            Summary::Animation {
                bones,
                frames,
                duration,
            } => write!(
                f,
                "PAGEanim: {} bones, {} frames, {:.2}s",
                bones, frames, duration
            ),
            Summary::Track {
                faces,
                boundary_edges,
            } => write!(
                f,
                "PAGEtrack: {} faces, {} boundary edges",
                faces, boundary_edges
            ),
            Summary::CameraSet {
                cameras,
                track_faces,
            } => write!(
                f,
                "PAGEcam: {} cameras, {} track faces",
                cameras, track_faces
            ),
        }
    }
}

/// Read, detect and decode a PAGE file
pub fn inspect_file(path: &Path) -> Result<Summary> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read: {:?}", path))?;
    Summary::from_bytes(&bytes).with_context(|| format!("Failed to inspect: {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec3};
    use page_common::{Bone, Camera, Vertex};

    #[test]
    fn test_mesh_summary() {
        let mesh = Mesh::new(
            vec![
                Vertex::new(Vec3::ZERO).with_influence("hip", 1.0),
                Vertex::new(Vec3::X).with_influence("knee", 1.0),
                Vertex::new(Vec3::Y),
            ],
            vec![[0, 1, 2]],
        );
        let summary = Summary::from_bytes(&mesh.encode()).unwrap();
        assert_eq!(
            summary,
            Summary::Mesh {
                vertices: 3,
                triangles: 1,
                influence_names: vec!["hip".to_string(), "knee".to_string()],
                acmr: 3.0,
            }
        );
        assert_eq!(summary.kind(), AssetKind::Mesh);
    }

    #[test]
    fn test_skeleton_summary() {
        let bone = |name: &str, parent| Bone {
            name: name.to_string(),
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            parent,
        };
        let skeleton = Skeleton::new(vec![bone("a", None), bone("b", Some(0)), bone("c", None)]);
        let summary = Summary::from_bytes(&skeleton.encode()).unwrap();
        assert_eq!(summary, Summary::Skeleton { bones: 3, roots: 2 });
        assert_eq!(summary.to_string(), "PAGEskel: 3 bones, 2 roots");
    }

    #[test]
    fn test_camera_set_summary() {
        let set = CameraSet {
            cameras: vec![Camera::default()],
            track_faces: vec![vec![0], vec![]],
        };
        let summary = Summary::from_bytes(&set.encode()).unwrap();
        assert_eq!(summary.kind(), AssetKind::CameraSet);
    }

    #[test]
    fn test_unknown_and_corrupt_files() {
        assert!(Summary::from_bytes(b"not a page file").is_err());

        let mut bytes = Track::default().encode();
        bytes[9] = 1; // claims one face
        assert!(Summary::from_bytes(&bytes).is_err());
    }
}
