//! PAGEtrack binary format (.track)
//!
//! Walkable surface with explicit neighbour links. Positions are stored in
//! the runtime's axis convention, swizzled from the authoring convention
//! as `(-x, z, y)`; the reader applies the inverse.
//!
//! # Layout
//! ```text
//! 0x00: "PAGEtrack"
//! 0x09: face_count u32 (F)
//! 0x0D: faces F * (positions 3 * [f32; 3], neighbours [i32; 3])  // -1 = none
//! ```

use glam::Vec3;

use super::NativeFormat;
use super::serialization::{ByteReader, ByteWriter};
use crate::error::FormatError;
use crate::types::{Track, TrackFace};

/// PAGEtrack file signature
pub const TRACK_SIGNATURE: &[u8] = b"PAGEtrack";

/// Bytes per stored face
pub const TRACK_FACE_SIZE: usize = 48;

/// PAGEtrack header (4 bytes, after the signature)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageTrackHeader {
    pub face_count: u32,
}

impl PageTrackHeader {
    pub const SIZE: usize = 4;

    pub fn new(face_count: u32) -> Self {
        Self { face_count }
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        self.face_count.to_le_bytes()
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            face_count: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
        })
    }
}

/// Authoring space to stored space
#[inline]
pub fn to_track_space(v: Vec3) -> Vec3 {
    Vec3::new(-v.x, v.z, v.y)
}

/// Stored space to authoring space
#[inline]
pub fn from_track_space(v: Vec3) -> Vec3 {
    Vec3::new(-v.x, v.z, v.y)
}

impl NativeFormat for Track {
    const SIGNATURE: &'static [u8] = TRACK_SIGNATURE;
    const NAME: &'static str = "PAGEtrack";

    fn encode_body(&self, w: &mut ByteWriter) {
        w.header(&PageTrackHeader::new(self.faces.len() as u32));
        for face in &self.faces {
            for &v in &face.vertices {
                w.vec3(to_track_space(v));
            }
            for neighbour in face.neighbours {
                w.i32(neighbour.map_or(-1, |n| n as i32));
            }
        }
    }

    fn decode_body(r: &mut ByteReader<'_>) -> Result<Self, FormatError> {
        let header: PageTrackHeader = r.header()?;
        let count = header.face_count as usize;

        let mut faces = Vec::with_capacity(r.capacity_for(header.face_count, TRACK_FACE_SIZE));
        for _ in 0..header.face_count {
            let vertices = [
                from_track_space(r.vec3()?),
                from_track_space(r.vec3()?),
                from_track_space(r.vec3()?),
            ];
            let mut neighbours = [None; 3];
            for neighbour in &mut neighbours {
                *neighbour = match r.i32()? {
                    -1 => None,
                    n if n >= 0 && (n as usize) < count => Some(n as u32),
                    n => return Err(r.out_of_range("neighbour face", n as i64, count)),
                };
            }
            faces.push(TrackFace {
                vertices,
                neighbours,
            });
        }

        Ok(Track::new(faces))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg64;

    fn quad() -> Track {
        let positions = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.5),
        ];
        Track::from_triangles(&positions, &[[0, 1, 2], [0, 2, 3]]).unwrap()
    }

    #[test]
    fn test_swizzle_is_involution() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(to_track_space(v), Vec3::new(-1.0, 3.0, 2.0));
        assert_eq!(from_track_space(to_track_space(v)), v);
    }

    #[test]
    fn test_byte_layout() {
        let bytes = quad().encode();
        assert_eq!(&bytes[0..9], b"PAGEtrack");
        assert_eq!(&bytes[9..13], &2u32.to_le_bytes());
        assert_eq!(bytes.len(), 9 + PageTrackHeader::SIZE + 2 * TRACK_FACE_SIZE);

        // Face 0, vertex 1 is (1, 0, 0) -> (-1, 0, 0)
        let v1 = 13 + 12;
        assert_eq!(&bytes[v1..v1 + 4], &(-1.0f32).to_le_bytes());
        // Face 1, vertex 2 is (0, 1, 0.5) -> (-0, 0.5, 1)
        let f1v2 = 13 + TRACK_FACE_SIZE + 24;
        assert_eq!(&bytes[f1v2 + 4..f1v2 + 8], &0.5f32.to_le_bytes());
        assert_eq!(&bytes[f1v2 + 8..f1v2 + 12], &1.0f32.to_le_bytes());

        // Face 0 neighbours: boundary, boundary, face 1
        let n0 = 13 + 36;
        assert_eq!(&bytes[n0..n0 + 4], &(-1i32).to_le_bytes());
        assert_eq!(&bytes[n0 + 8..n0 + 12], &1i32.to_le_bytes());
    }

    #[test]
    fn test_roundtrip() {
        let track = quad();
        assert_eq!(Track::decode(&track.encode()).unwrap(), track);
    }

    #[test]
    fn test_roundtrip_random() {
        let mut rng = Pcg64::seed_from_u64(99);
        for _ in 0..32 {
            let count = rng.random_range(0..20u32);
            let faces = (0..count)
                .map(|_| TrackFace {
                    vertices: [
                        Vec3::new(rng.random(), rng.random(), rng.random()),
                        Vec3::new(rng.random(), rng.random(), rng.random()),
                        Vec3::new(rng.random(), rng.random(), rng.random()),
                    ],
                    neighbours: [(); 3].map(|_| {
                        rng.random_bool(0.7).then(|| rng.random_range(0..count))
                    }),
                })
                .collect();
            let track = Track::new(faces);
            assert_eq!(Track::decode(&track.encode()).unwrap(), track);
        }
    }

    #[test]
    fn test_truncation_at_every_length() {
        let bytes = quad().encode();
        for len in 0..bytes.len() {
            assert!(Track::decode(&bytes[..len]).is_err(), "prefix {} decoded", len);
        }
    }

    #[test]
    fn test_rejects_neighbour_out_of_range() {
        let mut bytes = quad().encode();
        let n0 = 13 + 36;
        bytes[n0..n0 + 4].copy_from_slice(&5i32.to_le_bytes());
        assert!(matches!(
            Track::decode(&bytes),
            Err(FormatError::IndexOutOfRange {
                what: "neighbour face",
                index: 5,
                count: 2,
                ..
            })
        ));
    }
}
