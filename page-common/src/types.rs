//! In-memory asset values
//!
//! These are plain values: every export step builds a new one and nothing
//! is updated in place once written. Indices are `u32` because that is how
//! the native formats store them.

use glam::{Quat, Vec2, Vec3};
use hashbrown::HashMap;

use crate::error::MeshError;

// ============================================================================
// Meshes
// ============================================================================

/// A bone weight attached to a vertex
#[derive(Debug, Clone, PartialEq)]
pub struct Influence {
    /// Name of the deforming bone (vertex group)
    pub bone: String,
    /// Weight; not required to be normalized
    pub weight: f32,
}

impl Influence {
    pub fn new(bone: impl Into<String>, weight: f32) -> Self {
        Self {
            bone: bone.into(),
            weight,
        }
    }
}

/// A renderable vertex
#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
    pub influences: Vec<Influence>,
}

impl Vertex {
    /// Vertex with an up-facing normal, zero UV and no influences
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            normal: Vec3::Z,
            uv: Vec2::ZERO,
            influences: Vec::new(),
        }
    }

    pub fn with_normal(mut self, normal: Vec3) -> Self {
        self.normal = normal;
        self
    }

    pub fn with_uv(mut self, uv: Vec2) -> Self {
        self.uv = uv;
        self
    }

    pub fn with_influence(mut self, bone: impl Into<String>, weight: f32) -> Self {
        self.influences.push(Influence::new(bone, weight));
        self
    }
}

/// A triangle mesh, ready for optimization and encoding
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub triangles: Vec<[u32; 3]>,
}

impl Mesh {
    pub fn new(vertices: Vec<Vertex>, triangles: Vec<[u32; 3]>) -> Self {
        Self {
            vertices,
            triangles,
        }
    }

    /// Total number of influences over all vertices
    pub fn influence_count(&self) -> usize {
        self.vertices.iter().map(|v| v.influences.len()).sum()
    }

    /// Distinct influence names in first-seen order (vertex order)
    pub fn influence_names(&self) -> Vec<&str> {
        let mut seen: HashMap<&str, ()> = HashMap::new();
        let mut names = Vec::new();
        for influence in self.vertices.iter().flat_map(|v| &v.influences) {
            if seen.insert(influence.bone.as_str(), ()).is_none() {
                names.push(influence.bone.as_str());
            }
        }
        names
    }

    /// Indices of influenced vertices whose weights do not sum to 1
    ///
    /// Unnormalized weights are a data-quality problem in the source model;
    /// the encoder writes them unchanged.
    pub fn unnormalized_vertices(&self, tolerance: f32) -> Vec<usize> {
        self.vertices
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.influences.is_empty())
            .filter(|(_, v)| {
                let sum: f32 = v.influences.iter().map(|i| i.weight).sum();
                (sum - 1.0).abs() > tolerance
            })
            .map(|(i, _)| i)
            .collect()
    }
}

/// An authoring face before tessellation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Face {
    /// Corner vertex indices, in winding order
    pub vertices: Vec<u32>,
    /// Whether the face should be visible from both sides
    pub two_sided: bool,
}

impl Face {
    pub fn new(vertices: Vec<u32>) -> Self {
        Self {
            vertices,
            two_sided: false,
        }
    }

    pub fn two_sided(vertices: Vec<u32>) -> Self {
        Self {
            vertices,
            two_sided: true,
        }
    }
}

/// A polygon mesh as it comes out of a modeling tool
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolyMesh {
    pub vertices: Vec<Vertex>,
    pub faces: Vec<Face>,
}

impl PolyMesh {
    pub fn new(vertices: Vec<Vertex>, faces: Vec<Face>) -> Self {
        Self { vertices, faces }
    }
}

impl TryFrom<PolyMesh> for Mesh {
    type Error = MeshError;

    /// Accept the polygon mesh only if every face is an in-range triangle
    fn try_from(poly: PolyMesh) -> Result<Self, Self::Error> {
        let count = poly.vertices.len();
        let mut triangles = Vec::with_capacity(poly.faces.len());
        for (face, f) in poly.faces.iter().enumerate() {
            let [a, b, c] = f.vertices[..] else {
                return Err(MeshError::NonTriangularFace {
                    face,
                    corners: f.vertices.len(),
                });
            };
            for index in [a, b, c] {
                if index as usize >= count {
                    return Err(MeshError::IndexOutOfRange { face, index, count });
                }
            }
            triangles.push([a, b, c]);
        }
        Ok(Mesh::new(poly.vertices, triangles))
    }
}

// ============================================================================
// Skeletons and animations
// ============================================================================

/// A skeleton bone in its parent's space
#[derive(Debug, Clone, PartialEq)]
pub struct Bone {
    pub name: String,
    pub position: Vec3,
    pub orientation: Quat,
    /// Index of the parent bone; always lower than this bone's index
    pub parent: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Skeleton {
    pub bones: Vec<Bone>,
}

impl Skeleton {
    pub fn new(bones: Vec<Bone>) -> Self {
        Self { bones }
    }

    /// Find a bone by name
    pub fn find(&self, name: &str) -> Option<usize> {
        self.bones.iter().position(|b| b.name == name)
    }

    /// Check that every parent precedes its child
    pub fn is_ordered(&self) -> bool {
        self.bones
            .iter()
            .enumerate()
            .all(|(i, b)| b.parent.is_none_or(|p| p < i))
    }
}

/// A single keyframe of a bone
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    /// Seconds from the start of the clip
    pub time: f32,
    pub position: Vec3,
    pub orientation: Quat,
    pub scale: Vec3,
}

impl Frame {
    /// Rest frame (identity transform) at `time`
    pub fn rest(time: f32) -> Self {
        Self {
            time,
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

/// Keyframes for one bone, strictly increasing in time
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationBone {
    pub name: String,
    pub frames: Vec<Frame>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Animation {
    /// Clip length in seconds
    pub duration: f32,
    pub bones: Vec<AnimationBone>,
}

impl Animation {
    /// Build a clip whose duration is the latest keyframe time
    pub fn new(bones: Vec<AnimationBone>) -> Self {
        let duration = bones
            .iter()
            .flat_map(|b| &b.frames)
            .map(|f| f.time)
            .fold(0.0f32, f32::max);
        Self { duration, bones }
    }

    pub fn frame_count(&self) -> usize {
        self.bones.iter().map(|b| b.frames.len()).sum()
    }

    /// Names of bones whose frames are not strictly increasing in time
    pub fn misordered_bones(&self) -> Vec<&str> {
        self.bones
            .iter()
            .filter(|b| b.frames.windows(2).any(|w| w[0].time >= w[1].time))
            .map(|b| b.name.as_str())
            .collect()
    }
}

// ============================================================================
// Tracks and camera sets
// ============================================================================

/// A walkable triangle with explicit neighbour links
///
/// `neighbours[i]` is the face across the edge from `vertices[i]` to
/// `vertices[(i + 1) % 3]`, or `None` on a boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackFace {
    pub vertices: [Vec3; 3],
    pub neighbours: [Option<u32>; 3],
}

/// Faces whose unit normal has a Z at or below this are not walkable
pub const WALKABLE_MIN_NORMAL_Z: f32 = 0.001;

/// Corners closer than this in the XY plane count as stacked
pub const SLIVER_TOLERANCE: f32 = 0.001;

impl TrackFace {
    /// Unit normal from the winding, or zero for a degenerate face
    pub fn normal(&self) -> Vec3 {
        let [a, b, c] = self.vertices;
        (b - a).cross(c - a).normalize_or_zero()
    }

    /// Faces up (Z is up in authoring space)
    pub fn is_walkable(&self) -> bool {
        self.normal().z > WALKABLE_MIN_NORMAL_Z
    }

    /// Both edges leaving the first corner point along one line
    pub fn is_collinear(&self) -> bool {
        let [a, b, c] = self.vertices;
        let dot = (b - a).normalize_or_zero().dot((c - a).normalize_or_zero());
        dot.abs() > 0.9999
    }

    /// Corner `j` whose predecessor sits on top of it in the XY plane
    ///
    /// The short edge is then edge `(j + 2) % 3`.
    fn stacked_corner(&self) -> Option<usize> {
        (0..3).find(|&j| {
            let (a, b) = (self.vertices[(j + 2) % 3], self.vertices[j]);
            (a.truncate() - b.truncate()).length() < SLIVER_TOLERANCE
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Track {
    pub faces: Vec<TrackFace>,
}

impl Track {
    pub fn new(faces: Vec<TrackFace>) -> Self {
        Self { faces }
    }

    /// Build a track from an indexed triangle list, resolving neighbours
    ///
    /// Faces are linked across edges they share by vertex index. An edge
    /// used by more than two faces cannot be walked unambiguously and is
    /// rejected.
    pub fn from_triangles(positions: &[Vec3], triangles: &[[u32; 3]]) -> Result<Self, MeshError> {
        let count = positions.len();
        let mut edges: HashMap<(u32, u32), Vec<u32>> = HashMap::new();
        for (face, tri) in triangles.iter().enumerate() {
            for &index in tri {
                if index as usize >= count {
                    return Err(MeshError::IndexOutOfRange { face, index, count });
                }
            }
            for i in 0..3 {
                edges.entry(edge_key(tri, i)).or_default().push(face as u32);
            }
        }

        let mut faces = Vec::with_capacity(triangles.len());
        for (face, tri) in triangles.iter().enumerate() {
            let mut neighbours = [None; 3];
            for (i, neighbour) in neighbours.iter_mut().enumerate() {
                let key = edge_key(tri, i);
                // Every edge key was inserted by the loop above
                let shared = edges.get(&key).map(Vec::as_slice).unwrap_or_default();
                match shared {
                    [a, b] => *neighbour = Some(if *a == face as u32 { *b } else { *a }),
                    [_] => {}
                    _ => return Err(MeshError::NonManifoldEdge(key.0, key.1)),
                }
            }
            faces.push(TrackFace {
                vertices: tri.map(|i| positions[i as usize]),
                neighbours,
            });
        }
        Ok(Self { faces })
    }

    /// Indices of faces whose corners lie on one line
    pub fn collinear_faces(&self) -> Vec<usize> {
        (0..self.faces.len())
            .filter(|&i| self.faces[i].is_collinear())
            .collect()
    }

    /// Delete unwalkable sliver faces, returning how many were removed
    ///
    /// A sliver is an unwalkable face with two corners stacked in the XY
    /// plane, such as the vertical strip of a step. The faces across its two
    /// long edges are linked to each other; the face across the short edge
    /// loses its link. Other unwalkable faces are kept. Faces are visited
    /// from last to first and the rest are renumbered in order.
    pub fn remove_slivers(&mut self) -> usize {
        let mut removed = vec![false; self.faces.len()];
        for index in (0..self.faces.len()).rev() {
            let face = self.faces[index];
            if face.is_walkable() {
                continue;
            }
            let Some(j) = face.stacked_corner() else {
                continue;
            };
            let [long_a, long_b, short] = [0, 1, 2].map(|k| face.neighbours[(j + k) % 3]);
            let from = index as u32;
            self.relink(long_a, from, long_b);
            self.relink(long_b, from, long_a);
            self.relink(short, from, None);
            removed[index] = true;
        }

        let mut next = 0;
        let remap: Vec<Option<u32>> = removed
            .iter()
            .map(|&gone| {
                (!gone).then(|| {
                    next += 1;
                    next - 1
                })
            })
            .collect();

        let count = removed.iter().filter(|&&gone| gone).count();
        let faces = std::mem::take(&mut self.faces);
        self.faces = faces
            .into_iter()
            .zip(&removed)
            .filter(|(_, gone)| !**gone)
            .map(|(mut face, _)| {
                for neighbour in &mut face.neighbours {
                    *neighbour = neighbour.and_then(|i| remap[i as usize]);
                }
                face
            })
            .collect();
        count
    }

    /// Point the first link of `face` that refers to `from` at `to` instead
    fn relink(&mut self, face: Option<u32>, from: u32, to: Option<u32>) {
        let Some(face) = face else {
            return;
        };
        if let Some(link) = self.faces[face as usize]
            .neighbours
            .iter_mut()
            .find(|link| **link == Some(from))
        {
            *link = to;
        }
    }
}

fn edge_key(tri: &[u32; 3], i: usize) -> (u32, u32) {
    let (a, b) = (tri[i], tri[(i + 1) % 3]);
    (a.min(b), a.max(b))
}

/// How a camera follows the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u32)]
pub enum Tracking {
    #[default]
    None = 0,
    Position = 1,
    Orientation = 2,
}

impl Tracking {
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::Position),
            2 => Some(Self::Orientation),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub orientation: Quat,
    /// Vertical field of view in degrees
    pub fov: f32,
    pub tracking: Tracking,
    pub tracking_distance: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            fov: 75.0,
            tracking: Tracking::None,
            tracking_distance: 0.0,
        }
    }
}

/// Cameras plus, for each track face, the cameras that can see it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CameraSet {
    pub cameras: Vec<Camera>,
    pub track_faces: Vec<Vec<u32>>,
}
