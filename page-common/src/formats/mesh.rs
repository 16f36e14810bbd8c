//! PAGEmesh binary format (.mesh)
//!
//! Indexed triangle mesh with per-vertex bone influences.
//!
//! # Layout
//! ```text
//! 0x00: "PAGEmesh"
//! 0x08: face_count u32 (F)
//! 0x0C: vertex_count u32 (V)
//! 0x10: influence_count u32 (I)
//! 0x14: name_count u32 (N)
//! 0x18: faces       F * [u32; 3]
//! var:  vertices    V * (position [f32; 3], normal [f32; 3], uv [f32; 2],
//!                        influence_start u32, influence_count u32)
//! var:  influences  I * (name_index u32, weight f32)
//! var:  names       N * (len u32, bytes)
//! ```
//!
//! The V texture coordinate is negated on write and read back as stored,
//! so `decode(encode(m))` returns `m` with every `uv.y` flipped.

use hashbrown::HashMap;

use super::NativeFormat;
use super::serialization::{ByteReader, ByteWriter};
use crate::error::FormatError;
use crate::types::{Influence, Mesh, Vertex};

/// PAGEmesh file signature
pub const MESH_SIGNATURE: &[u8] = b"PAGEmesh";

/// Bytes per stored face
pub const MESH_FACE_SIZE: usize = 12;

/// Bytes per stored vertex
pub const MESH_VERTEX_SIZE: usize = 40;

/// Bytes per stored influence
pub const MESH_INFLUENCE_SIZE: usize = 8;

/// PAGEmesh header (16 bytes, after the signature)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageMeshHeader {
    pub face_count: u32,
    pub vertex_count: u32,
    pub influence_count: u32,
    pub name_count: u32,
}

impl PageMeshHeader {
    pub const SIZE: usize = 16;

    pub fn new(face_count: u32, vertex_count: u32, influence_count: u32, name_count: u32) -> Self {
        Self {
            face_count,
            vertex_count,
            influence_count,
            name_count,
        }
    }

    /// Write header to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..4].copy_from_slice(&self.face_count.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.vertex_count.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.influence_count.to_le_bytes());
        bytes[12..16].copy_from_slice(&self.name_count.to_le_bytes());
        bytes
    }

    /// Read header from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            face_count: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            vertex_count: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
            influence_count: u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
            name_count: u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]),
        })
    }
}

/// Vertex record before its influence span is resolved
struct StoredVertex {
    vertex: Vertex,
    start: u32,
    count: u32,
}

impl NativeFormat for Mesh {
    const SIGNATURE: &'static [u8] = MESH_SIGNATURE;
    const NAME: &'static str = "PAGEmesh";

    fn encode_body(&self, w: &mut ByteWriter) {
        let names = self.influence_names();
        let name_indices: HashMap<&str, u32> = names
            .iter()
            .enumerate()
            .map(|(i, name)| (*name, i as u32))
            .collect();

        w.header(&PageMeshHeader::new(
            self.triangles.len() as u32,
            self.vertices.len() as u32,
            self.influence_count() as u32,
            names.len() as u32,
        ));

        for tri in &self.triangles {
            for &index in tri {
                w.u32(index);
            }
        }

        let mut start = 0u32;
        for v in &self.vertices {
            w.vec3(v.position);
            w.vec3(v.normal);
            w.f32(v.uv.x);
            w.f32(-v.uv.y);
            w.u32(start);
            w.u32(v.influences.len() as u32);
            start += v.influences.len() as u32;
        }

        for influence in self.vertices.iter().flat_map(|v| &v.influences) {
            // Every influence name is in the table by construction
            w.u32(name_indices.get(influence.bone.as_str()).copied().unwrap_or_default());
            w.f32(influence.weight);
        }

        for name in &names {
            w.string(name);
        }
    }

    fn decode_body(r: &mut ByteReader<'_>) -> Result<Self, FormatError> {
        let header: PageMeshHeader = r.header()?;
        let vertex_count = header.vertex_count as usize;

        let mut triangles = Vec::with_capacity(r.capacity_for(header.face_count, MESH_FACE_SIZE));
        for _ in 0..header.face_count {
            let tri = [r.u32()?, r.u32()?, r.u32()?];
            if let Some(&bad) = tri.iter().find(|&&i| i as usize >= vertex_count) {
                return Err(r.out_of_range("vertex", bad as i64, vertex_count));
            }
            triangles.push(tri);
        }

        let mut stored =
            Vec::with_capacity(r.capacity_for(header.vertex_count, MESH_VERTEX_SIZE));
        for _ in 0..header.vertex_count {
            let position = r.vec3()?;
            let normal = r.vec3()?;
            let uv = r.vec2()?;
            let start = r.u32()?;
            let count = r.u32()?;
            let end = start.checked_add(count);
            if end.is_none_or(|end| end > header.influence_count) {
                return Err(r.out_of_range(
                    "influence",
                    start as i64 + count as i64,
                    header.influence_count as usize,
                ));
            }
            stored.push(StoredVertex {
                vertex: Vertex::new(position).with_normal(normal).with_uv(uv),
                start,
                count,
            });
        }

        let mut influences =
            Vec::with_capacity(r.capacity_for(header.influence_count, MESH_INFLUENCE_SIZE));
        for _ in 0..header.influence_count {
            influences.push((r.u32()?, r.f32()?));
        }

        let mut names = Vec::with_capacity(r.capacity_for(header.name_count, 4));
        for _ in 0..header.name_count {
            names.push(r.string()?);
        }

        let mut vertices = Vec::with_capacity(stored.len());
        for StoredVertex {
            mut vertex,
            start,
            count,
        } in stored
        {
            let span = &influences[start as usize..(start + count) as usize];
            for &(name, weight) in span {
                let bone = names
                    .get(name as usize)
                    .ok_or_else(|| r.out_of_range("influence name", name as i64, names.len()))?;
                vertex.influences.push(Influence::new(bone.clone(), weight));
            }
            vertices.push(vertex);
        }

        Ok(Mesh::new(vertices, triangles))
    }
}
