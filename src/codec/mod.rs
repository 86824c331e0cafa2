//! Third-party codec adapters (design notes §9).
//!
//! Every codec this crate depends on is hidden behind a narrow
//! function/struct surface in one of these submodules, so the rest of the
//! crate never imports `gltf`, `image`, or `intel_tex_2` directly.

pub mod compress;
pub mod image;
pub mod scene;
