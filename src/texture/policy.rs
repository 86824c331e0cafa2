//! Format Policy (§4.1).
//!
//! Maps a `(texture preset, target platforms, source format)` triple to the
//! concrete target formats, mip policy, and any required pre-conversion.
//! Reuses `wgpu::TextureFormat` as the pixel-format vocabulary (the teacher
//! already threads it through `resources/texture.rs` and `core/texture.rs`
//! for exactly this "what format is this data in" question) rather than
//! inventing a parallel format enum; `wgpu` has native `Bc1`..`Bc7` and
//! `Astc { block, channel }` variants so no format needs re-deriving.

use wgpu::TextureFormat;

/// Semantic category of a texture, driving format/mip/compression selection
/// (§3, GLOSSARY "Preset").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TexturePreset {
    Diffuse,
    DiffuseWithAlphaMask,
    DiffuseWithAlphaTransparency,
    Normals,
    Metalness,
    Roughness,
    EmissionColor,
    EmissionFactor,
    AmbientOcclusion,
    Greyscale8,
    GreyscaleWithAlpha8,
    EnvironmentCubemapDiffuseHDR,
    EnvironmentCubemapSpecular,
    Brdf,
    Alpha,
    Explicit,
    Depth,
    Unknown,
}

/// Result of classifying a decoded image's alpha channel (§4.2); feeds back
/// into preset selection when `preset == Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlphaUsage {
    None,
    Mask,
    Transparency,
}

/// Deployment target. Each platform contributes a subset of
/// `{Uncompressed, Bc, Astc}`; the union across requested platforms is what
/// actually gets compiled for one texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Windows,
    Linux,
    MacOs,
    Ios,
    Android,
}

/// One of the per-platform encoded variants of a texture (GLOSSARY).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BinaryType {
    Uncompressed,
    Bc,
    Astc,
}

impl Platform {
    /// Which binary types this platform consumes. Desktop platforms get BC
    /// (hardware-native) plus an uncompressed fallback; mobile platforms get
    /// ASTC. A caller compiling for multiple platforms at once gets the
    /// union (§4.1).
    #[must_use]
    pub fn binary_types(self) -> &'static [BinaryType] {
        match self {
            Platform::Windows | Platform::Linux | Platform::MacOs => {
                &[BinaryType::Bc, BinaryType::Uncompressed]
            }
            Platform::Ios | Platform::Android => &[BinaryType::Astc],
        }
    }
}

/// Per-binary-type target format, mip policy, and required source format
/// before compression can run.
#[derive(Debug, Clone, Copy)]
pub struct FormatDecision {
    pub target_format: TextureFormat,
    /// Format the uncompressed source must already be in before this
    /// binary-type's compressor runs; a pixel-conversion pass precedes
    /// compression whenever the decoded source differs.
    pub required_source_format: TextureFormat,
    pub should_generate_mips: bool,
}

/// `(x, y, z)` block size of a compressed format (GLOSSARY "Block extent").
/// Uncompressed formats have a 1×1×1 extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockExtent {
    pub x: u32,
    pub y: u32,
}

impl BlockExtent {
    pub const UNCOMPRESSED: BlockExtent = BlockExtent { x: 1, y: 1 };
    pub const BC: BlockExtent = BlockExtent { x: 4, y: 4 };
    pub const ASTC_4X4: BlockExtent = BlockExtent { x: 4, y: 4 };
    pub const ASTC_8X8: BlockExtent = BlockExtent { x: 8, y: 8 };

    #[must_use]
    pub fn max_dimension(self) -> u32 {
        self.x.max(self.y)
    }
}

/// Returns the format/mip policy for one `(preset, platform, binary_type,
/// source_format, alpha_usage)` combination.
///
/// `source_format` is the format the decoded image actually arrived in
/// (before any conversion); `alpha_usage` is only consulted when selecting
/// among alpha-dependent target formats (e.g. `DiffuseWithAlphaMask` picks
/// a single-bit-alpha BC1 variant, `DiffuseWithAlphaTransparency` picks
/// BC3/BC7).
pub fn resolve(
    preset: TexturePreset,
    binary_type: BinaryType,
    source_format: TextureFormat,
) -> FormatDecision {
    let should_generate_mips = !matches!(
        preset,
        TexturePreset::Brdf | TexturePreset::Explicit | TexturePreset::Depth
    );

    let target_format = match (preset, binary_type) {
        (TexturePreset::Normals, BinaryType::Bc) => TextureFormat::Bc5RgUnorm,
        (TexturePreset::Normals, BinaryType::Astc) => {
            TextureFormat::Astc { block: wgpu::AstcBlock::B4x4, channel: wgpu::AstcChannel::Unorm }
        }
        (TexturePreset::Normals, BinaryType::Uncompressed) => TextureFormat::Rg8Unorm,

        (TexturePreset::DiffuseWithAlphaMask, BinaryType::Bc) => TextureFormat::Bc1RgbaUnormSrgb,
        (TexturePreset::DiffuseWithAlphaMask, BinaryType::Astc) => {
            TextureFormat::Astc { block: wgpu::AstcBlock::B4x4, channel: wgpu::AstcChannel::UnormSrgb }
        }
        (TexturePreset::DiffuseWithAlphaTransparency, BinaryType::Bc) => {
            TextureFormat::Bc7RgbaUnormSrgb
        }
        (TexturePreset::DiffuseWithAlphaTransparency, BinaryType::Astc) => {
            TextureFormat::Astc { block: wgpu::AstcBlock::B4x4, channel: wgpu::AstcChannel::UnormSrgb }
        }
        (TexturePreset::Diffuse, BinaryType::Bc) => TextureFormat::Bc7RgbaUnormSrgb,
        (TexturePreset::Diffuse, BinaryType::Astc) => {
            TextureFormat::Astc { block: wgpu::AstcBlock::B4x4, channel: wgpu::AstcChannel::UnormSrgb }
        }

        (TexturePreset::Metalness | TexturePreset::Roughness | TexturePreset::AmbientOcclusion
        | TexturePreset::Greyscale8, BinaryType::Bc) => TextureFormat::Bc4RUnorm,
        (TexturePreset::Metalness | TexturePreset::Roughness | TexturePreset::AmbientOcclusion
        | TexturePreset::Greyscale8, BinaryType::Astc) => {
            TextureFormat::Astc { block: wgpu::AstcBlock::B8x8, channel: wgpu::AstcChannel::Unorm }
        }
        (TexturePreset::GreyscaleWithAlpha8, BinaryType::Bc) => TextureFormat::Bc5RgUnorm,
        (TexturePreset::GreyscaleWithAlpha8, BinaryType::Astc) => {
            TextureFormat::Astc { block: wgpu::AstcBlock::B8x8, channel: wgpu::AstcChannel::Unorm }
        }

        (TexturePreset::EmissionColor, BinaryType::Bc) => TextureFormat::Bc6hRgbUfloat,
        (TexturePreset::EmissionColor, BinaryType::Astc) => {
            TextureFormat::Astc { block: wgpu::AstcBlock::B4x4, channel: wgpu::AstcChannel::Hdr }
        }
        (TexturePreset::EmissionFactor, _) => TextureFormat::Bc4RUnorm,

        (TexturePreset::EnvironmentCubemapDiffuseHDR, BinaryType::Bc) => {
            TextureFormat::Bc6hRgbUfloat
        }
        (TexturePreset::EnvironmentCubemapDiffuseHDR, BinaryType::Astc) => {
            TextureFormat::Astc { block: wgpu::AstcBlock::B4x4, channel: wgpu::AstcChannel::Hdr }
        }
        (TexturePreset::EnvironmentCubemapSpecular, BinaryType::Bc) => {
            TextureFormat::Bc6hRgbUfloat
        }
        (TexturePreset::EnvironmentCubemapSpecular, BinaryType::Astc) => {
            TextureFormat::Astc { block: wgpu::AstcBlock::B4x4, channel: wgpu::AstcChannel::Hdr }
        }
        (TexturePreset::Brdf, _) => TextureFormat::Rg8Unorm,
        (TexturePreset::Alpha, _) => TextureFormat::R8Unorm,
        (TexturePreset::Depth, _) => TextureFormat::R32Float,
        (TexturePreset::Explicit | TexturePreset::Unknown, _) => source_format,

        // Any preset not explicitly routed to a compressed format above
        // falls back to an uncompressed identity copy for that binary type.
        (_, BinaryType::Uncompressed) => source_format,
    };

    let required_source_format = match target_format {
        TextureFormat::Bc6hRgbUfloat => TextureFormat::Rgba16Float,
        TextureFormat::Astc { channel: wgpu::AstcChannel::Hdr, .. } => TextureFormat::Rgba16Float,
        TextureFormat::Astc { .. } | TextureFormat::Bc1RgbaUnormSrgb | TextureFormat::Bc7RgbaUnormSrgb => {
            TextureFormat::Rgba8UnormSrgb
        }
        TextureFormat::Bc4RUnorm | TextureFormat::Rg8Unorm | TextureFormat::R8Unorm => {
            TextureFormat::Rgba8Unorm
        }
        TextureFormat::Bc5RgUnorm => TextureFormat::Rgba8Unorm,
        other => other,
    };

    FormatDecision { target_format, required_source_format, should_generate_mips }
}

/// Block extent of a target format, used for mip-count and divisibility
/// checks.
#[must_use]
pub fn block_extent(format: TextureFormat) -> BlockExtent {
    match format {
        TextureFormat::Astc { block, .. } => match block {
            wgpu::AstcBlock::B4x4 => BlockExtent::ASTC_4X4,
            wgpu::AstcBlock::B8x8 => BlockExtent::ASTC_8X8,
            _ => BlockExtent::ASTC_4X4,
        },
        TextureFormat::Bc1RgbaUnorm
        | TextureFormat::Bc1RgbaUnormSrgb
        | TextureFormat::Bc2RgbaUnorm
        | TextureFormat::Bc2RgbaUnormSrgb
        | TextureFormat::Bc3RgbaUnorm
        | TextureFormat::Bc3RgbaUnormSrgb
        | TextureFormat::Bc4RUnorm
        | TextureFormat::Bc4RSnorm
        | TextureFormat::Bc5RgUnorm
        | TextureFormat::Bc5RgSnorm
        | TextureFormat::Bc6hRgbUfloat
        | TextureFormat::Bc6hRgbFloat
        | TextureFormat::Bc7RgbaUnorm
        | TextureFormat::Bc7RgbaUnormSrgb => BlockExtent::BC,
        _ => BlockExtent::UNCOMPRESSED,
    }
}

/// Block-size-aware mip count: `ceil(log2(max(w,h))) - (log2(blockExtent) - 1)`,
/// never below 1. Shared by the Format Policy and the testable-properties
/// suite so there is exactly one definition (SPEC_FULL.md, "Mip count is
/// computed from a block-extent mip mask").
#[must_use]
pub fn mip_count(width: u32, height: u32, extent: BlockExtent, generate_mips: bool) -> u32 {
    if !generate_mips {
        return 1;
    }
    let max_dim = width.max(height).max(1);
    let total_mip_mask = (max_dim as f32).log2().ceil() as i32;
    let block_mip_mask = (extent.max_dimension().max(1) as f32).log2() as i32;
    (total_mip_mask - (block_mip_mask - 1)).max(1) as u32
}

/// Resolution validity: the top mip must be divisible by the format's block
/// extent (§4.1, "otherwise compilation fails the whole texture").
#[must_use]
pub fn is_resolution_block_aligned(width: u32, height: u32, extent: BlockExtent) -> bool {
    width % extent.x == 0 && height % extent.y == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mip_count_never_below_one() {
        assert_eq!(mip_count(1, 1, BlockExtent::UNCOMPRESSED, true), 1);
        assert_eq!(mip_count(3, 3, BlockExtent::BC, true), 1);
    }

    #[test]
    fn mip_count_disabled_is_always_one() {
        assert_eq!(mip_count(4096, 4096, BlockExtent::UNCOMPRESSED, false), 1);
    }

    #[test]
    fn mip_count_matches_uncompressed_log2() {
        // 256x256 uncompressed: ceil(log2(256)) - (log2(1)-1) = 8 - (-1) = 9
        assert_eq!(mip_count(256, 256, BlockExtent::UNCOMPRESSED, true), 9);
    }

    #[test]
    fn mip_count_accounts_for_bc_block_extent() {
        // 256x256 BC (4x4 blocks): 8 - (log2(4)-1) = 8 - 1 = 7
        assert_eq!(mip_count(256, 256, BlockExtent::BC, true), 7);
    }

    #[test]
    fn block_alignment_rejects_odd_resolutions() {
        assert!(!is_resolution_block_aligned(255, 256, BlockExtent::BC));
        assert!(is_resolution_block_aligned(256, 256, BlockExtent::BC));
    }
}
