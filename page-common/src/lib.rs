//! Shared types and utilities for the PAGE asset pipeline
//!
//! This crate holds everything the exporter needs that does not touch the
//! file system:
//!
//! # Modules
//!
//! - [`types`] - Mesh, skeleton, animation, track and camera set values
//! - [`prep`] - Mesh cleanup, fan tessellation and two-sided baking
//! - [`optimize`] - Vertex cache reordering (Forsyth) and cache simulation
//! - [`formats`] - PAGE native binary formats (`PAGEmesh`, `PAGEskel`, ...)
//! - [`error`] - Error types shared by the modules above

pub mod error;
pub mod formats;
pub mod optimize;
pub mod prep;
pub mod types;

// Re-export the error types
pub use error::{FormatError, MeshError};

// Re-export commonly used value types
pub use types::{
    Animation, AnimationBone, Bone, Camera, CameraSet, Face, Frame, Influence, Mesh, PolyMesh,
    Skeleton, Track, TrackFace, Tracking, Vertex,
};

// Re-export commonly used format items
pub use formats::{AssetKind, BinarySerializable, NativeFormat, detect};

// Re-export the optimizer entry points
pub use optimize::{CACHE_SIZE, CacheStats, optimize, optimize_faces, simulate_cache};
