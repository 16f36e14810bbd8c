//! Error types for mesh preparation and binary decoding

/// Error decoding a PAGE binary asset
///
/// Every variant carries the name of the format being decoded so a caller
/// can report it next to the path it was reading from.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    /// The buffer does not start with the expected signature
    #[error("{format}: invalid signature")]
    Signature { format: &'static str },

    /// A read ran past the end of the buffer
    #[error(
        "{format}: unexpected end of data at offset {offset} (needed {needed} bytes, {remaining} remaining)"
    )]
    Truncated {
        format: &'static str,
        offset: usize,
        needed: usize,
        remaining: usize,
    },

    /// A stored index refers outside the table it indexes
    #[error("{format}: {what} index {index} out of range (count {count})")]
    IndexOutOfRange {
        format: &'static str,
        what: &'static str,
        index: i64,
        count: usize,
    },

    /// Camera tracking mode is not one of the known values
    #[error("PAGEcam: invalid tracking mode {0}")]
    InvalidTracking(u32),

    /// The source could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error preparing a mesh for optimization or building a track
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MeshError {
    /// A face still has more (or fewer) than three corners
    #[error("face {face} has {corners} vertices; the mesh must be tessellated into triangles")]
    NonTriangularFace { face: usize, corners: usize },

    /// A face references a vertex that does not exist
    #[error("face {face} references vertex {index}, but the mesh has {count} vertices")]
    IndexOutOfRange {
        face: usize,
        index: u32,
        count: usize,
    },

    /// More than two faces share one edge
    #[error("edge ({0}, {1}) is shared by more than two faces")]
    NonManifoldEdge(u32, u32),
}
