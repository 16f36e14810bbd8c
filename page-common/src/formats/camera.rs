//! PAGEcam binary format (.cam)
//!
//! Scene cameras plus, for every face of the matching track, the list of
//! cameras that can frame a player standing on it.
//!
//! # Layout
//! ```text
//! 0x00: "PAGEcam"
//! 0x07: camera_count u32 (C)
//! 0x0B: track_face_count u32 (T)
//! 0x0F: cameras C * (position [f32; 3], orientation [f32; 4], fov f32,
//!                    tracking u32, tracking_distance f32)
//! var:  faces   T * (count u32, count * camera_index u32)
//! ```

use super::NativeFormat;
use super::serialization::{ByteReader, ByteWriter};
use crate::error::FormatError;
use crate::types::{Camera, CameraSet, Tracking};

/// PAGEcam file signature
pub const CAMERA_SET_SIGNATURE: &[u8] = b"PAGEcam";

/// Bytes per stored camera
pub const CAMERA_SIZE: usize = 40;

/// PAGEcam header (8 bytes, after the signature)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCameraSetHeader {
    pub camera_count: u32,
    pub track_face_count: u32,
}

impl PageCameraSetHeader {
    pub const SIZE: usize = 8;

    pub fn new(camera_count: u32, track_face_count: u32) -> Self {
        Self {
            camera_count,
            track_face_count,
        }
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..4].copy_from_slice(&self.camera_count.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.track_face_count.to_le_bytes());
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            camera_count: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            track_face_count: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        })
    }
}

impl NativeFormat for CameraSet {
    const SIGNATURE: &'static [u8] = CAMERA_SET_SIGNATURE;
    const NAME: &'static str = "PAGEcam";

    fn encode_body(&self, w: &mut ByteWriter) {
        w.header(&PageCameraSetHeader::new(
            self.cameras.len() as u32,
            self.track_faces.len() as u32,
        ));
        for camera in &self.cameras {
            w.vec3(camera.position);
            w.quat(camera.orientation);
            w.f32(camera.fov);
            w.u32(camera.tracking as u32);
            w.f32(camera.tracking_distance);
        }
        for visible in &self.track_faces {
            w.u32(visible.len() as u32);
            for &camera in visible {
                w.u32(camera);
            }
        }
    }

    fn decode_body(r: &mut ByteReader<'_>) -> Result<Self, FormatError> {
        let header: PageCameraSetHeader = r.header()?;
        let camera_count = header.camera_count as usize;

        let mut cameras = Vec::with_capacity(r.capacity_for(header.camera_count, CAMERA_SIZE));
        for _ in 0..header.camera_count {
            let position = r.vec3()?;
            let orientation = r.quat()?;
            let fov = r.f32()?;
            let tracking = r.u32()?;
            let tracking =
                Tracking::from_u32(tracking).ok_or(FormatError::InvalidTracking(tracking))?;
            cameras.push(Camera {
                position,
                orientation,
                fov,
                tracking,
                tracking_distance: r.f32()?,
            });
        }

        let mut track_faces = Vec::with_capacity(r.capacity_for(header.track_face_count, 4));
        for _ in 0..header.track_face_count {
            let count = r.u32()?;
            let mut visible = Vec::with_capacity(r.capacity_for(count, 4));
            for _ in 0..count {
                let camera = r.u32()?;
                if camera as usize >= camera_count {
                    return Err(r.out_of_range("camera", camera as i64, camera_count));
                }
                visible.push(camera);
            }
            track_faces.push(visible);
        }

        Ok(CameraSet {
            cameras,
            track_faces,
        })
    }
}
