//! Texture Asset data model (§3).
//!
//! Metadata plus one binary per platform binary-type. Serializes with
//! `serde_json`, matching the teacher's JSON-adjacent conventions
//! (`src/assets/loaders/gltf.rs` mutates raw `serde_json::Value` metadata
//! trees for prefab sidecars) — here the metadata is a concrete typed
//! struct since the Texture Pipeline owns its whole shape, rather than a
//! `Value` tree mutated incrementally.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::guid::{Guid, TypeGuid};
use crate::texture::policy::{BinaryType, TexturePreset};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct TextureFlags: u32 {
        const CUBEMAP = 0b0001;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct UsageFlags: u32 {
        const TRANSFER_SOURCE = 0b0001;
        const SAMPLED         = 0b0010;
        const TRANSFER_DEST   = 0b0100;
    }
}

/// One mip level's placement within the binary blob.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MipInfo {
    pub level: u32,
    pub offset: u64,
    pub size: u64,
}

/// Per-binary-type compiled result: target format, optional compression
/// quality, and the mip table needed to slice the binary blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BinaryTypeMetadata {
    pub binary_type: BinaryType,
    #[serde(with = "format_serde")]
    pub format: wgpu::TextureFormat,
    pub compression_quality: Option<f32>,
    pub mip_count: u32,
    pub mip_offsets: Vec<MipInfo>,
}

/// `wgpu::TextureFormat` has no serde impl; round-trip it through its
/// `Debug`/`FromStr`-style name instead of hand-maintaining a mirrored
/// enum, matching how the teacher's JSON sidecars already carry a handful
/// of string-keyed enum fields (`src/assets/loaders/gltf.rs` stores
/// component/type GUIDs as strings in its JSON tree).
mod format_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use wgpu::TextureFormat;

    pub fn serialize<S: Serializer>(format: &TextureFormat, s: S) -> Result<S::Ok, S::Error> {
        format!("{format:?}").serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<TextureFormat, D::Error> {
        let repr = String::deserialize(d)?;
        format_from_debug_repr(&repr)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown texture format {repr}")))
    }

    fn format_from_debug_repr(repr: &str) -> Option<TextureFormat> {
        // Covers exactly the formats the Format Policy table ever selects;
        // extend alongside `texture::policy::resolve`.
        Some(match repr {
            "Rgba8Unorm" => TextureFormat::Rgba8Unorm,
            "Rgba8UnormSrgb" => TextureFormat::Rgba8UnormSrgb,
            "Rg8Unorm" => TextureFormat::Rg8Unorm,
            "R8Unorm" => TextureFormat::R8Unorm,
            "R32Float" => TextureFormat::R32Float,
            "Rgba16Float" => TextureFormat::Rgba16Float,
            "Bc1RgbaUnorm" => TextureFormat::Bc1RgbaUnorm,
            "Bc1RgbaUnormSrgb" => TextureFormat::Bc1RgbaUnormSrgb,
            "Bc3RgbaUnorm" => TextureFormat::Bc3RgbaUnorm,
            "Bc3RgbaUnormSrgb" => TextureFormat::Bc3RgbaUnormSrgb,
            "Bc4RUnorm" => TextureFormat::Bc4RUnorm,
            "Bc5RgUnorm" => TextureFormat::Bc5RgUnorm,
            "Bc6hRgbUfloat" => TextureFormat::Bc6hRgbUfloat,
            "Bc7RgbaUnorm" => TextureFormat::Bc7RgbaUnorm,
            "Bc7RgbaUnormSrgb" => TextureFormat::Bc7RgbaUnormSrgb,
            _ => return None,
        })
    }
}

/// Full Texture Asset metadata document (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextureAssetMetadata {
    pub guid: Guid,
    pub type_guid: TypeGuid,
    pub preset: TexturePreset,
    pub resolution: (u32, u32),
    /// 1 for a regular 2D texture, 6 for a cubemap.
    pub array_size: u32,
    pub flags: TextureFlags,
    pub usage_flags: UsageFlags,
    pub binary_types: Vec<BinaryTypeMetadata>,
    /// Source scaling factor read from/written to metadata for HDR
    /// cubemap sources (§4.5, default 1.0).
    pub intensity_factor: f32,
}

impl TextureAssetMetadata {
    #[must_use]
    pub fn new(guid: Guid, preset: TexturePreset, resolution: (u32, u32), array_size: u32) -> Self {
        Self {
            guid,
            type_guid: TypeGuid::texture_asset(),
            preset,
            resolution,
            array_size,
            flags: if array_size == 6 { TextureFlags::CUBEMAP } else { TextureFlags::empty() },
            usage_flags: UsageFlags::SAMPLED | UsageFlags::TRANSFER_DEST,
            binary_types: Vec::new(),
            intensity_factor: 1.0,
        }
    }

    #[must_use]
    pub fn is_cubemap(&self) -> bool {
        self.flags.contains(TextureFlags::CUBEMAP)
    }
}

// `TexturePreset`/`BinaryType` need serde for the metadata document above;
// derived here rather than on the policy module's definitions so that
// module stays free of a serde dependency until something actually
// persists the enum.
impl Serialize for TexturePreset {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        let name = match self {
            TexturePreset::Diffuse => "Diffuse",
            TexturePreset::DiffuseWithAlphaMask => "DiffuseWithAlphaMask",
            TexturePreset::DiffuseWithAlphaTransparency => "DiffuseWithAlphaTransparency",
            TexturePreset::Normals => "Normals",
            TexturePreset::Metalness => "Metalness",
            TexturePreset::Roughness => "Roughness",
            TexturePreset::EmissionColor => "EmissionColor",
            TexturePreset::EmissionFactor => "EmissionFactor",
            TexturePreset::AmbientOcclusion => "AmbientOcclusion",
            TexturePreset::Greyscale8 => "Greyscale8",
            TexturePreset::GreyscaleWithAlpha8 => "GreyscaleWithAlpha8",
            TexturePreset::EnvironmentCubemapDiffuseHDR => "EnvironmentCubemapDiffuseHDR",
            TexturePreset::EnvironmentCubemapSpecular => "EnvironmentCubemapSpecular",
            TexturePreset::Brdf => "BRDF",
            TexturePreset::Alpha => "Alpha",
            TexturePreset::Explicit => "Explicit",
            TexturePreset::Depth => "Depth",
            TexturePreset::Unknown => "Unknown",
        };
        name.serialize(s)
    }
}

impl<'de> Deserialize<'de> for TexturePreset {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let name = String::deserialize(d)?;
        Ok(match name.as_str() {
            "Diffuse" => TexturePreset::Diffuse,
            "DiffuseWithAlphaMask" => TexturePreset::DiffuseWithAlphaMask,
            "DiffuseWithAlphaTransparency" => TexturePreset::DiffuseWithAlphaTransparency,
            "Normals" => TexturePreset::Normals,
            "Metalness" => TexturePreset::Metalness,
            "Roughness" => TexturePreset::Roughness,
            "EmissionColor" => TexturePreset::EmissionColor,
            "EmissionFactor" => TexturePreset::EmissionFactor,
            "AmbientOcclusion" => TexturePreset::AmbientOcclusion,
            "Greyscale8" => TexturePreset::Greyscale8,
            "GreyscaleWithAlpha8" => TexturePreset::GreyscaleWithAlpha8,
            "EnvironmentCubemapDiffuseHDR" => TexturePreset::EnvironmentCubemapDiffuseHDR,
            "EnvironmentCubemapSpecular" => TexturePreset::EnvironmentCubemapSpecular,
            "BRDF" => TexturePreset::Brdf,
            "Alpha" => TexturePreset::Alpha,
            "Explicit" => TexturePreset::Explicit,
            "Depth" => TexturePreset::Depth,
            _ => TexturePreset::Unknown,
        })
    }
}

impl Serialize for BinaryType {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            BinaryType::Uncompressed => "Uncompressed",
            BinaryType::Bc => "BC",
            BinaryType::Astc => "ASTC",
        }
        .serialize(s)
    }
}

impl<'de> Deserialize<'de> for BinaryType {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let name = String::deserialize(d)?;
        Ok(match name.as_str() {
            "BC" => BinaryType::Bc,
            "ASTC" => BinaryType::Astc,
            _ => BinaryType::Uncompressed,
        })
    }
}
