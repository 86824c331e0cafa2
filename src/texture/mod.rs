//! Texture Compilation Engine (§4.1-§4.5).
//!
//! `policy` is the Format Policy table, `classifier` the Pixel Classifier,
//! `compressor` the per-block BC/ASTC compressor, `pipeline` the
//! `Compile`/`IsUpToDate` orchestration (§4.4), `asset` the on-disk metadata
//! shape, and `cubemap` the GPU-backed IBL prefilter (§4.5, `ibl` feature).

pub mod asset;
pub mod classifier;
pub mod compressor;
#[cfg(feature = "ibl")]
pub mod cubemap;
pub mod pipeline;
pub mod policy;

pub use asset::{BinaryTypeMetadata, MipInfo, TextureAssetMetadata, TextureFlags, UsageFlags};
pub use classifier::{classify_no_alpha_channel, classify_pixels, AlphaUsage};
pub use pipeline::{generate_mip_chain, is_up_to_date, select_preset, CompiledTexture};
pub use policy::{is_resolution_block_aligned, mip_count, resolve, BinaryType, Platform, TexturePreset};
