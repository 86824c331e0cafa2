//! Error Types
//!
//! This module defines the error types used throughout the asset compilation
//! core.
//!
//! # Overview
//!
//! The main error type [`CompileError`] covers all failure modes surfaced at
//! a compile-job boundary: source I/O, codec decode failures, format-policy
//! violations, compression failures, and missing dependency assets. Loader
//! code that walks a foreign scene (see [`crate::scene::walker`]) is free to
//! use `anyhow` internally for short-lived, context-rich errors and convert
//! to [`CompileError`] only once a job result needs to be reported.
//!
//! # Usage
//!
//! All public APIs return [`Result<T>`], an alias for
//! `std::result::Result<T, CompileError>`.

use thiserror::Error;

/// The main error type for the asset compilation core.
///
/// Per §7 of the design, none of these are recoverable within the core
/// itself: a failure clears the `Compiled` flag on the affected job's result
/// and is surfaced to the caller, it does not panic or abort a sibling job.
#[derive(Error, Debug)]
pub enum CompileError {
    // ========================================================================
    // Source I/O
    // ========================================================================
    /// The source file could not be found or opened.
    #[error("source file not found or unreadable: {0}")]
    SourceNotFound(String),

    /// Generic filesystem I/O failure (binary write, metadata write, temp
    /// directory creation for embedded textures, ...).
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    // ========================================================================
    // Codec errors
    // ========================================================================
    /// The scene codec (glTF) rejected the source bytes.
    #[error("scene codec error: {0}")]
    SceneCodecError(String),

    /// Image decode failure from the underlying image codec.
    #[error("image decode error: {0}")]
    ImageDecodeError(String),

    /// A referenced embedded texture (`"*N"`) has no matching payload.
    #[error("embedded texture index out of range: {0}")]
    EmbeddedTextureMissing(usize),

    // ========================================================================
    // Format Policy / Texture Compiler
    // ========================================================================
    /// No format-policy row matched the requested preset/platform/source
    /// combination.
    #[error("unknown or invalid target format for preset {preset:?} on platform {platform:?}")]
    InvalidTargetFormat {
        /// Requested texture preset.
        preset: crate::texture::policy::TexturePreset,
        /// Requested target platform.
        platform: crate::texture::policy::Platform,
    },

    /// Top mip resolution is not divisible by the target format's block
    /// extent.
    #[error("resolution {width}x{height} is not divisible by block extent {block_x}x{block_y}")]
    ResolutionNotBlockAligned {
        /// Source width in pixels.
        width: u32,
        /// Source height in pixels.
        height: u32,
        /// Block extent X.
        block_x: u32,
        /// Block extent Y.
        block_y: u32,
    },

    /// A compression job failed (encoder error, destination buffer too
    /// small, unsupported block format on this platform).
    #[error("compression failed: {0}")]
    CompressionFailed(String),

    // ========================================================================
    // Scene / hierarchy errors
    // ========================================================================
    /// A hierarchy entry referenced a dependency asset GUID that is absent
    /// from the asset database at finalisation time.
    #[error("dependency asset missing from database: {0}")]
    DependencyMissing(crate::guid::Guid),

    /// JSON (de)serialization of asset metadata failed.
    #[error("metadata JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// An async asset-manager load (Scene Exporter) returned zero bytes.
    #[error("asset load returned empty bytes: {0}")]
    EmptyAssetLoad(String),

    // ========================================================================
    // Job graph
    // ========================================================================
    /// A worker thread panicked or the channel it communicated over was
    /// dropped before a result arrived.
    #[error("job failed to complete: {0}")]
    JobFailed(String),
}

impl From<image::ImageError> for CompileError {
    fn from(err: image::ImageError) -> Self {
        CompileError::ImageDecodeError(err.to_string())
    }
}

#[cfg(feature = "gltf-scene")]
impl From<gltf::Error> for CompileError {
    fn from(err: gltf::Error) -> Self {
        CompileError::SceneCodecError(err.to_string())
    }
}

/// Alias for `Result<T, CompileError>`.
pub type Result<T> = std::result::Result<T, CompileError>;
