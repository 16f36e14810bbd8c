//! PAGEanim binary format (.anim)
//!
//! Per-bone keyframe tracks. Frames are stored with full quaternions, so
//! unlike PAGEskel the orientation round trip is exact.
//!
//! # Layout
//! ```text
//! 0x00: "PAGEanim"
//! 0x08: duration f32 (seconds)
//! 0x0C: bone_count u32 (B)
//! 0x10: bones B * (name_len u32, name bytes, frame_count u32 (K),
//!                  K * (time f32, position [f32; 3],
//!                       orientation [f32; 4], scale [f32; 3]))
//! ```

use super::NativeFormat;
use super::serialization::{ByteReader, ByteWriter};
use crate::error::FormatError;
use crate::types::{Animation, AnimationBone, Frame};

/// PAGEanim file signature
pub const ANIMATION_SIGNATURE: &[u8] = b"PAGEanim";

/// Bytes per stored keyframe
pub const ANIMATION_FRAME_SIZE: usize = 44;

/// PAGEanim header (8 bytes, after the signature)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageAnimationHeader {
    pub duration: f32,
    pub bone_count: u32,
}

impl PageAnimationHeader {
    pub const SIZE: usize = 8;

    pub fn new(duration: f32, bone_count: u32) -> Self {
        Self {
            duration,
            bone_count,
        }
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..4].copy_from_slice(&self.duration.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.bone_count.to_le_bytes());
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            duration: f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            bone_count: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        })
    }
}

impl NativeFormat for Animation {
    const SIGNATURE: &'static [u8] = ANIMATION_SIGNATURE;
    const NAME: &'static str = "PAGEanim";

    fn encode_body(&self, w: &mut ByteWriter) {
        w.header(&PageAnimationHeader::new(
            self.duration,
            self.bones.len() as u32,
        ));
        for bone in &self.bones {
            w.string(&bone.name);
            w.u32(bone.frames.len() as u32);
            for frame in &bone.frames {
                w.f32(frame.time);
                w.vec3(frame.position);
                w.quat(frame.orientation);
                w.vec3(frame.scale);
            }
        }
    }

    fn decode_body(r: &mut ByteReader<'_>) -> Result<Self, FormatError> {
        let header: PageAnimationHeader = r.header()?;

        let mut bones = Vec::with_capacity(r.capacity_for(header.bone_count, 8));
        for _ in 0..header.bone_count {
            let name = r.string()?;
            let frame_count = r.u32()?;
            let mut frames = Vec::with_capacity(r.capacity_for(frame_count, ANIMATION_FRAME_SIZE));
            for _ in 0..frame_count {
                frames.push(Frame {
                    time: r.f32()?,
                    position: r.vec3()?,
                    orientation: r.quat()?,
                    scale: r.vec3()?,
                });
            }
            bones.push(AnimationBone { name, frames });
        }

        Ok(Animation {
            duration: header.duration,
            bones,
        })
    }
}
