//! Binary serialization primitives shared by the PAGE formats.
//!
//! Fixed-size headers implement [`BinarySerializable`] for consistent
//! serialization/deserialization, while each header keeps its type-specific
//! `to_bytes()` returning a fixed-size array. Variable-length sections are
//! written through [`ByteWriter`] and read through [`ByteReader`], which
//! turns every short read into [`FormatError::Truncated`].

use glam::{Quat, Vec2, Vec3};

use crate::error::FormatError;

/// Trait for binary-serializable format headers.
///
/// The trait uses `Vec<u8>` for the return type because associated const
/// generics in return types (`[u8; Self::SIZE]`) are not yet stable in Rust.
///
/// # Example
///
/// ```
/// use page_common::formats::{BinarySerializable, PageMeshHeader};
///
/// let header = PageMeshHeader::new(12, 8, 0, 0);
///
/// // Using the trait (returns Vec<u8>)
/// let bytes = header.serialize();
/// let parsed = PageMeshHeader::deserialize(&bytes).unwrap();
/// assert_eq!(parsed.face_count, 12);
///
/// // Using the type-specific method (returns [u8; 16])
/// let bytes_array = header.to_bytes();
/// assert_eq!(bytes_array.len(), 16);
/// ```
pub trait BinarySerializable: Sized {
    /// Size of the serialized header in bytes.
    const SIZE: usize;

    /// Serialize to bytes.
    fn serialize(&self) -> Vec<u8>;

    /// Deserialize from bytes.
    ///
    /// Returns `None` if the byte slice is too short.
    fn deserialize(bytes: &[u8]) -> Option<Self>;
}

// Implementation for PageMeshHeader
impl BinarySerializable for super::PageMeshHeader {
    const SIZE: usize = Self::SIZE;

    fn serialize(&self) -> Vec<u8> {
        self.to_bytes().to_vec()
    }

    fn deserialize(bytes: &[u8]) -> Option<Self> {
        Self::from_bytes(bytes)
    }
}

// Implementation for PageSkeletonHeader
impl BinarySerializable for super::PageSkeletonHeader {
    const SIZE: usize = Self::SIZE;

    fn serialize(&self) -> Vec<u8> {
        self.to_bytes().to_vec()
    }

    fn deserialize(bytes: &[u8]) -> Option<Self> {
        Self::from_bytes(bytes)
    }
}

// Implementation for PageAnimationHeader
impl BinarySerializable for super::PageAnimationHeader {
    const SIZE: usize = Self::SIZE;

    fn serialize(&self) -> Vec<u8> {
        self.to_bytes().to_vec()
    }

    fn deserialize(bytes: &[u8]) -> Option<Self> {
        Self::from_bytes(bytes)
    }
}

// Implementation for PageTrackHeader
impl BinarySerializable for super::PageTrackHeader {
    const SIZE: usize = Self::SIZE;

    fn serialize(&self) -> Vec<u8> {
        self.to_bytes().to_vec()
    }

    fn deserialize(bytes: &[u8]) -> Option<Self> {
        Self::from_bytes(bytes)
    }
}

// Implementation for PageCameraSetHeader
impl BinarySerializable for super::PageCameraSetHeader {
    const SIZE: usize = Self::SIZE;

    fn serialize(&self) -> Vec<u8> {
        self.to_bytes().to_vec()
    }

    fn deserialize(bytes: &[u8]) -> Option<Self> {
        Self::from_bytes(bytes)
    }
}

/// Little-endian writer over a growable buffer
#[derive(Debug, Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    pub fn bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn header<H: BinarySerializable>(&mut self, header: &H) {
        self.buf.extend_from_slice(&header.serialize());
    }

    pub fn u32(&mut self, value: u32) {
        self.bytes(&value.to_le_bytes());
    }

    pub fn i32(&mut self, value: i32) {
        self.bytes(&value.to_le_bytes());
    }

    pub fn f32(&mut self, value: f32) {
        self.bytes(&value.to_le_bytes());
    }

    pub fn vec2(&mut self, v: Vec2) {
        self.f32(v.x);
        self.f32(v.y);
    }

    pub fn vec3(&mut self, v: Vec3) {
        self.f32(v.x);
        self.f32(v.y);
        self.f32(v.z);
    }

    /// Quaternion as x, y, z, w
    pub fn quat(&mut self, q: Quat) {
        self.f32(q.x);
        self.f32(q.y);
        self.f32(q.z);
        self.f32(q.w);
    }

    /// `u32` byte length followed by the raw bytes
    pub fn string(&mut self, s: &str) {
        self.u32(s.len() as u32);
        self.bytes(s.as_bytes());
    }
}

/// Little-endian reader over a borrowed buffer
///
/// Offsets in errors are absolute positions in the buffer handed to
/// [`ByteReader::new`], signature included.
#[derive(Debug)]
pub struct ByteReader<'a> {
    format: &'static str,
    data: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(format: &'static str, data: &'a [u8]) -> Self {
        Self {
            format,
            data,
            offset: 0,
        }
    }

    pub fn format(&self) -> &'static str {
        self.format
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    /// Borrow the next `n` bytes
    pub fn take(&mut self, n: usize) -> Result<&'a [u8], FormatError> {
        let remaining = self.remaining();
        if n > remaining {
            return Err(FormatError::Truncated {
                format: self.format,
                offset: self.offset,
                needed: n,
                remaining,
            });
        }
        let bytes = &self.data[self.offset..self.offset + n];
        self.offset += n;
        Ok(bytes)
    }

    pub fn skip(&mut self, n: usize) -> Result<(), FormatError> {
        self.take(n).map(|_| ())
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], FormatError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn header<H: BinarySerializable>(&mut self) -> Result<H, FormatError> {
        let offset = self.offset;
        let bytes = self.take(H::SIZE)?;
        H::deserialize(bytes).ok_or(FormatError::Truncated {
            format: self.format,
            offset,
            needed: H::SIZE,
            remaining: bytes.len(),
        })
    }

    pub fn u32(&mut self) -> Result<u32, FormatError> {
        self.array().map(u32::from_le_bytes)
    }

    pub fn i32(&mut self) -> Result<i32, FormatError> {
        self.array().map(i32::from_le_bytes)
    }

    pub fn f32(&mut self) -> Result<f32, FormatError> {
        self.array().map(f32::from_le_bytes)
    }

    pub fn vec2(&mut self) -> Result<Vec2, FormatError> {
        Ok(Vec2::new(self.f32()?, self.f32()?))
    }

    pub fn vec3(&mut self) -> Result<Vec3, FormatError> {
        Ok(Vec3::new(self.f32()?, self.f32()?, self.f32()?))
    }

    /// Quaternion stored as x, y, z, w
    pub fn quat(&mut self) -> Result<Quat, FormatError> {
        Ok(Quat::from_xyzw(
            self.f32()?,
            self.f32()?,
            self.f32()?,
            self.f32()?,
        ))
    }

    /// `u32` byte length followed by the raw bytes
    ///
    /// Names carry no declared encoding; bytes that are not UTF-8 are
    /// replaced rather than rejected.
    pub fn string(&mut self) -> Result<String, FormatError> {
        let len = self.u32()? as usize;
        let bytes = self.take(len)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    /// Capacity to reserve for `count` records of at least `record_size`
    /// bytes, bounded by what the buffer can actually hold.
    pub fn capacity_for(&self, count: u32, record_size: usize) -> usize {
        (count as usize).min(self.remaining() / record_size.max(1))
    }

    /// Build an out-of-range error for this format
    pub fn out_of_range(&self, what: &'static str, index: i64, count: usize) -> FormatError {
        FormatError::IndexOutOfRange {
            format: self.format,
            what,
            index,
            count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::{
        PageAnimationHeader, PageCameraSetHeader, PageMeshHeader, PageSkeletonHeader,
        PageTrackHeader,
    };

    #[test]
    fn test_mesh_header_trait() {
        let header = PageMeshHeader::new(100, 300, 12, 3);
        let bytes = header.serialize();
        assert_eq!(bytes.len(), PageMeshHeader::SIZE);
        assert_eq!(<PageMeshHeader as BinarySerializable>::SIZE, 16);

        let parsed = PageMeshHeader::deserialize(&bytes).unwrap();
        assert_eq!(parsed.face_count, 100);
        assert_eq!(parsed.vertex_count, 300);
        assert_eq!(parsed.influence_count, 12);
        assert_eq!(parsed.name_count, 3);
    }

    #[test]
    fn test_deserialize_insufficient_bytes() {
        // All headers should return None when given insufficient bytes
        assert!(PageMeshHeader::deserialize(&[0; 15]).is_none());
        assert!(PageSkeletonHeader::deserialize(&[0; 3]).is_none());
        assert!(PageAnimationHeader::deserialize(&[0; 7]).is_none());
        assert!(PageTrackHeader::deserialize(&[0; 3]).is_none());
        assert!(PageCameraSetHeader::deserialize(&[0; 7]).is_none());
    }

    /// Demonstrates generic function using the trait
    fn header_size<T: BinarySerializable>() -> usize {
        T::SIZE
    }

    #[test]
    fn test_generic_usage() {
        assert_eq!(header_size::<PageMeshHeader>(), 16);
        assert_eq!(header_size::<PageSkeletonHeader>(), 4);
        assert_eq!(header_size::<PageAnimationHeader>(), 8);
        assert_eq!(header_size::<PageTrackHeader>(), 4);
        assert_eq!(header_size::<PageCameraSetHeader>(), 8);
    }

    #[test]
    fn test_reader_truncation_reports_offset() {
        let mut r = ByteReader::new("PAGEtest", &[1, 0, 0, 0, 2, 0]);
        assert_eq!(r.u32().unwrap(), 1);
        match r.u32() {
            Err(FormatError::Truncated {
                format,
                offset,
                needed,
                remaining,
            }) => {
                assert_eq!(format, "PAGEtest");
                assert_eq!(offset, 4);
                assert_eq!(needed, 4);
                assert_eq!(remaining, 2);
            }
            other => panic!("expected truncation, got {:?}", other),
        }
    }

    #[test]
    fn test_writer_reader_primitives() {
        let mut w = ByteWriter::new();
        w.i32(-1);
        w.f32(0.5);
        w.string("hip");
        w.quat(Quat::from_xyzw(0.0, 0.0, 0.6, 0.8));
        let bytes = w.into_inner();
        assert_eq!(&bytes[0..4], &[0xff; 4]);
        assert_eq!(bytes.len(), 4 + 4 + 4 + 3 + 16);

        let mut r = ByteReader::new("PAGEtest", &bytes);
        assert_eq!(r.i32().unwrap(), -1);
        assert_eq!(r.f32().unwrap(), 0.5);
        assert_eq!(r.string().unwrap(), "hip");
        assert_eq!(r.quat().unwrap(), Quat::from_xyzw(0.0, 0.0, 0.6, 0.8));
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn test_capacity_is_bounded_by_buffer() {
        let r = ByteReader::new("PAGEtest", &[0; 40]);
        assert_eq!(r.capacity_for(u32::MAX, 8), 5);
        assert_eq!(r.capacity_for(2, 8), 2);
    }
}
