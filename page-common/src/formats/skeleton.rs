//! PAGEskel binary format (.skel)
//!
//! Bind pose hierarchy. Orientations are stored without their W component;
//! the encoder canonicalizes each quaternion to `w >= 0` so the reader can
//! rebuild it from the unit-length constraint.
//!
//! # Layout
//! ```text
//! 0x00: "PAGEskel"
//! 0x08: bone_count u32 (B)
//! 0x0C: bones B * (name_len u32, name bytes,
//!                  position [f32; 3], orientation xyz [f32; 3],
//!                  parent i32)  // -1 = root, else an earlier bone
//! ```

use glam::Quat;

use super::NativeFormat;
use super::serialization::{ByteReader, ByteWriter};
use crate::error::FormatError;
use crate::types::{Bone, Skeleton};

/// PAGEskel file signature
pub const SKELETON_SIGNATURE: &[u8] = b"PAGEskel";

/// Smallest possible stored bone (empty name)
pub const SKELETON_BONE_MIN_SIZE: usize = 4 + 24 + 4;

/// PAGEskel header (4 bytes, after the signature)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSkeletonHeader {
    pub bone_count: u32,
}

impl PageSkeletonHeader {
    pub const SIZE: usize = 4;

    pub fn new(bone_count: u32) -> Self {
        Self { bone_count }
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        self.bone_count.to_le_bytes()
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            bone_count: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
        })
    }
}

/// Flip a quaternion into the `w >= 0` hemisphere (same rotation)
pub fn canonicalize(q: Quat) -> Quat {
    if q.w < 0.0 { -q } else { q }
}

/// Rebuild a unit quaternion from its vector part, assuming `w >= 0`
pub fn reconstruct_w(x: f32, y: f32, z: f32) -> Quat {
    let w = (1.0 - x * x - y * y - z * z).max(0.0).sqrt();
    Quat::from_xyzw(x, y, z, w)
}

impl NativeFormat for Skeleton {
    const SIGNATURE: &'static [u8] = SKELETON_SIGNATURE;
    const NAME: &'static str = "PAGEskel";

    fn encode_body(&self, w: &mut ByteWriter) {
        w.header(&PageSkeletonHeader::new(self.bones.len() as u32));
        for bone in &self.bones {
            let q = canonicalize(bone.orientation);
            w.string(&bone.name);
            w.vec3(bone.position);
            w.f32(q.x);
            w.f32(q.y);
            w.f32(q.z);
            w.i32(bone.parent.map_or(-1, |p| p as i32));
        }
    }

    fn decode_body(r: &mut ByteReader<'_>) -> Result<Self, FormatError> {
        let header: PageSkeletonHeader = r.header()?;
        let count = header.bone_count as usize;

        let mut bones =
            Vec::with_capacity(r.capacity_for(header.bone_count, SKELETON_BONE_MIN_SIZE));
        for index in 0..count {
            let name = r.string()?;
            let position = r.vec3()?;
            let orientation = reconstruct_w(r.f32()?, r.f32()?, r.f32()?);
            // Parents always precede their children
            let parent = match r.i32()? {
                -1 => None,
                p if p >= 0 && (p as usize) < index => Some(p as usize),
                p => return Err(r.out_of_range("parent bone", p as i64, index)),
            };
            bones.push(Bone {
                name,
                position,
                orientation,
                parent,
            });
        }

        Ok(Skeleton::new(bones))
    }
}
