//! PAGE native binary asset formats
//!
//! Every file starts with an ASCII signature (no length prefix, no version)
//! followed by little-endian fixed-width fields with no padding. The
//! signature is the only format identity a file carries; callers that need
//! versioning track it out of band.
//!
//! | Kind | Signature | Extension |
//! |------|-----------|-----------|
//! | [`Mesh`](crate::Mesh) | `PAGEmesh` | `.mesh` |
//! | [`Skeleton`](crate::Skeleton) | `PAGEskel` | `.skel` |
//! | [`Animation`](crate::Animation) | `PAGEanim` | `.anim` |
//! | [`Track`](crate::Track) | `PAGEtrack` | `.track` |
//! | [`CameraSet`](crate::CameraSet) | `PAGEcam` | `.cam` |
//!
//! Fixed-size headers implement [`BinarySerializable`]; whole assets
//! implement [`NativeFormat`].

pub mod animation;
pub mod camera;
pub mod mesh;
mod serialization;
pub mod skeleton;
pub mod track;

pub use animation::*;
pub use camera::*;
pub use mesh::*;
pub use serialization::{BinarySerializable, ByteReader, ByteWriter};
pub use skeleton::*;
pub use track::*;

use std::io::{self, Read, Write};

use crate::error::FormatError;

/// A whole asset with a PAGE native encoding
///
/// Implementors only describe the body after the signature; framing,
/// signature checks and I/O adapters are provided here. Decoding builds a
/// fresh value and only returns it once the whole body parsed.
pub trait NativeFormat: Sized {
    /// Leading ASCII signature
    const SIGNATURE: &'static [u8];

    /// Human-readable format name used in errors and logs
    const NAME: &'static str;

    /// Append the body (everything after the signature)
    fn encode_body(&self, w: &mut ByteWriter);

    /// Parse the body (everything after the signature)
    fn decode_body(r: &mut ByteReader<'_>) -> Result<Self, FormatError>;

    /// Encode to a new buffer
    fn encode(&self) -> Vec<u8> {
        let mut w = ByteWriter::new();
        w.bytes(Self::SIGNATURE);
        self.encode_body(&mut w);
        w.into_inner()
    }

    /// Encode into an arbitrary sink
    fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.encode())
    }

    /// Decode from a buffer
    fn decode(bytes: &[u8]) -> Result<Self, FormatError> {
        if !bytes.starts_with(Self::SIGNATURE) {
            return Err(FormatError::Signature { format: Self::NAME });
        }
        let mut r = ByteReader::new(Self::NAME, bytes);
        r.skip(Self::SIGNATURE.len())?;
        Self::decode_body(&mut r)
    }

    /// Decode everything an arbitrary source yields
    fn read_from<R: Read>(r: &mut R) -> Result<Self, FormatError> {
        let mut bytes = Vec::new();
        r.read_to_end(&mut bytes)?;
        Self::decode(&bytes)
    }
}

/// The kinds of PAGE native assets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Mesh,
    Skeleton,
    Animation,
    Track,
    CameraSet,
}

impl AssetKind {
    pub const ALL: [AssetKind; 5] = [
        AssetKind::Mesh,
        AssetKind::Skeleton,
        AssetKind::Animation,
        AssetKind::Track,
        AssetKind::CameraSet,
    ];

    pub fn signature(self) -> &'static [u8] {
        match self {
            AssetKind::Mesh => MESH_SIGNATURE,
            AssetKind::Skeleton => SKELETON_SIGNATURE,
            AssetKind::Animation => ANIMATION_SIGNATURE,
            AssetKind::Track => TRACK_SIGNATURE,
            AssetKind::CameraSet => CAMERA_SET_SIGNATURE,
        }
    }

    /// Conventional file extension (without the dot)
    pub fn extension(self) -> &'static str {
        match self {
            AssetKind::Mesh => "mesh",
            AssetKind::Skeleton => "skel",
            AssetKind::Animation => "anim",
            AssetKind::Track => "track",
            AssetKind::CameraSet => "cam",
        }
    }
}

/// Identify a buffer by its signature
pub fn detect(bytes: &[u8]) -> Option<AssetKind> {
    AssetKind::ALL
        .into_iter()
        .find(|kind| bytes.starts_with(kind.signature()))
}
