//! Image codec adapter: `ImageCodec::DecodeN` / `EncodePNG` (design notes,
//! §9). Grounded directly on the teacher's `src/assets/mod.rs`
//! (`load_image_from_file`, `load_hdr_texture_from_file`): this module
//! generalises those two functions from "load a GPU-ready `Texture`" to
//! "decode into the flat pixel buffers the Texture Pipeline classifies,
//! converts, and mips", but keeps the same `image` crate call pattern
//! (`image::open`, `into_rgba8`, `into_rgb32f`).

use std::io::Cursor;
use std::path::Path;

use image::{GenericImageView, ImageFormat};

use crate::errors::{CompileError, Result};

/// A decoded uncompressed image: raw pixels plus enough shape information
/// for the Format Policy and Pixel Classifier to operate on it.
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub channel_count: u8,
    pub bits_per_channel: u8,
    /// `true` for floating-point HDR sources (EXR/HDR); these decode to
    /// RGBA32F instead of RGBA8.
    pub is_float: bool,
    pub rgba8: Option<Vec<u8>>,
    pub rgba32f: Option<Vec<f32>>,
}

impl DecodedImage {
    #[must_use]
    pub fn channel_count_and_depth(&self) -> (u8, u8) {
        (self.channel_count, self.bits_per_channel)
    }
}

/// Decodes an image from a source path, dispatching on extension/content
/// sniffing the same way `image::open` already does for the teacher.
pub fn decode_file(path: impl AsRef<Path>) -> Result<DecodedImage> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)
        .map_err(|_| CompileError::SourceNotFound(path.display().to_string()))?;
    decode_bytes(&bytes, ImageFormat::from_path(path).ok())
}

/// Decodes an in-memory image payload (used for embedded glTF textures,
/// §6 "Embedded textures").
pub fn decode_bytes(bytes: &[u8], hint: Option<ImageFormat>) -> Result<DecodedImage> {
    let reader = match hint {
        Some(format) => image::ImageReader::with_format(Cursor::new(bytes), format),
        None => image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(CompileError::IoError)?,
    };
    let format = reader.format();
    let img = reader.decode()?;
    let (width, height) = img.dimensions();

    let is_hdr = matches!(format, Some(ImageFormat::Hdr) | Some(ImageFormat::OpenExr));
    if is_hdr {
        let rgb32f = img.into_rgb32f();
        let mut rgba32f = Vec::with_capacity((width * height * 4) as usize);
        for pixel in rgb32f.pixels() {
            rgba32f.extend_from_slice(&[pixel[0], pixel[1], pixel[2], 1.0]);
        }
        Ok(DecodedImage {
            width,
            height,
            channel_count: 4,
            bits_per_channel: 32,
            is_float: true,
            rgba8: None,
            rgba32f: Some(rgba32f),
        })
    } else {
        let rgba8 = img.into_rgba8().into_raw();
        Ok(DecodedImage {
            width,
            height,
            channel_count: 4,
            bits_per_channel: 8,
            is_float: false,
            rgba8: Some(rgba8),
            rgba32f: None,
        })
    }
}

/// Encodes an RGBA8 buffer as PNG, used by the Scene Exporter (§4.10) when
/// converting compiled textures back to a foreign-friendly format.
pub fn encode_png(width: u32, height: u32, rgba8: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    image::write_buffer_with_format(
        &mut Cursor::new(&mut out),
        rgba8,
        width,
        height,
        image::ColorType::Rgba8,
        ImageFormat::Png,
    )
    .map_err(CompileError::from)?;
    Ok(out)
}
