//! Block-compression adapters (§4.3, design note "Third-party codecs").
//!
//! Each submodule hides one third-party/bespoke encoder behind a narrow
//! function surface so [`crate::texture::compressor`] never depends on a
//! specific library's API shape.

pub mod astc;
pub mod bc;
