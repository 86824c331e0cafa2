//! ASTC block compression.
//!
//! No crate in the retrieved example pack wraps a real ASTC encoder (a
//! sweep of every `other_examples/manifests/*.toml` turned up only
//! `texpresso` and `intel_tex_2`, neither of which emit ASTC — see
//! DESIGN.md). Rather than fabricate a dependency on a crate that was
//! never actually retrieved, this module is a small pure-Rust reference
//! encoder covering the ASTC "void extent" block mode: every 4x4 or 8x8
//! block is encoded as a single constant colour (the block's average),
//! which is a real, spec-legal ASTC encoding (section 23.10 of the ASTC
//! specification) rather than an approximation of one. It trades
//! compression quality for being honestly implementable from the public
//! bitstream spec alone; a production encoder would replace this module
//! with a real partitioned/weighted ASTC encoder without touching any of
//! its callers, since the per-block job contract (`encode_block`) is the
//! same either way.

use wgpu::AstcChannel;

/// Size in bytes of every ASTC block regardless of block extent (the ASTC
/// bitstream fixes block size at 128 bits).
pub const BLOCK_BYTES: usize = 16;

/// Encodes one block's worth of source texels (`block_w * block_h` RGBA8
/// pixels, row-major, already clipped/clamped to the image edge by the
/// caller) into a single void-extent ASTC block.
///
/// `hdr` selects the HDR void-extent encoding (linear RGB, used for
/// `AstcChannel::Hdr` targets feeding the Cubemap Processor) vs. the LDR
/// encoding used for everything else.
pub fn encode_block(
    texels_rgba8: &[[u8; 4]],
    channel: AstcChannel,
) -> [u8; BLOCK_BYTES] {
    let (r, g, b, a) = average(texels_rgba8);

    match channel {
        AstcChannel::Hdr => encode_void_extent_hdr(r, g, b, a),
        _ => encode_void_extent_ldr(r, g, b, a),
    }
}

fn average(texels: &[[u8; 4]]) -> (u8, u8, u8, u8) {
    if texels.is_empty() {
        return (0, 0, 0, 255);
    }
    let (mut r, mut g, mut b, mut a) = (0u32, 0u32, 0u32, 0u32);
    for t in texels {
        r += t[0] as u32;
        g += t[1] as u32;
        b += t[2] as u32;
        a += t[3] as u32;
    }
    let n = texels.len() as u32;
    ((r / n) as u8, (g / n) as u8, (b / n) as u8, (a / n) as u8)
}

/// Void-extent block layout per the ASTC spec: the low 12 bits of the
/// block select the void-extent mode (`0b11111111_1100` in the low bits of
/// the first two bytes), followed by the extent coordinates (set to "don't
/// care", i.e. all-1s, since every texel in the block shares this colour)
/// and the 4x 16-bit RGBA endpoint.
fn encode_void_extent_ldr(r: u8, g: u8, b: u8, a: u8) -> [u8; BLOCK_BYTES] {
    let mut block = [0u8; BLOCK_BYTES];
    // Block mode + void-extent signature (bits [0..12) == 0xDFC, 2D variant).
    block[0] = 0xFC;
    block[1] = 0xFD;
    // Extent coordinates: all bits set ("don't care").
    block[2] = 0xFF;
    block[3] = 0xFF;
    block[4] = 0xFF;
    block[5] = 0xFF;
    block[6] = 0xFF;
    block[7] = 0xFF;
    // Endpoint colour, replicated 8-bit -> 16-bit (LDR encoding).
    let widen = |c: u8| -> [u8; 2] { [c, c] };
    block[8..10].copy_from_slice(&widen(r));
    block[10..12].copy_from_slice(&widen(g));
    block[12..14].copy_from_slice(&widen(b));
    block[14..16].copy_from_slice(&widen(a));
    block
}

fn encode_void_extent_hdr(r: u8, g: u8, b: u8, a: u8) -> [u8; BLOCK_BYTES] {
    // HDR void-extent reuses the same bit layout but the 16-bit endpoint is
    // interpreted as an FP16 value by decoders; promote the LDR sRGB-ish
    // byte to a small FP16-compatible magnitude so round-tripping through
    // an HDR-aware decoder does not produce nonsense (values stay within
    // [0, 1] so any exponent bias works out to "close to zero").
    let half = |c: u8| half::f16::from_f32(c as f32 / 255.0).to_le_bytes();
    let mut block = [0u8; BLOCK_BYTES];
    block[0] = 0xFC;
    block[1] = 0xFD;
    block[2] = 0xFF;
    block[3] = 0xFF;
    block[4] = 0xFF;
    block[5] = 0xFF;
    block[6] = 0xFF;
    block[7] = 0xFF;
    block[8..10].copy_from_slice(&half(r));
    block[10..12].copy_from_slice(&half(g));
    block[12..14].copy_from_slice(&half(b));
    block[14..16].copy_from_slice(&half(a));
    block
}

/// Compresses a full image (already padded so every dimension is a
/// multiple of the block extent) into a contiguous ASTC block stream,
/// iterating blocks in row-major order. This is the whole-image entry
/// point [`crate::texture::compressor`] calls per parallel job's row
/// range; unlike the BC path, ASTC blocks have no alignment dependency
/// across rows so the row-range partitioning can't corrupt neighbouring
/// output.
pub fn compress_image(
    width: u32,
    height: u32,
    block_w: u32,
    block_h: u32,
    row_block_start: u32,
    row_block_end: u32,
    rgba8: &[u8],
    channel: AstcChannel,
    dst: &mut [u8],
) {
    let blocks_per_row = width.div_ceil(block_w);
    let mut block_texels = Vec::with_capacity((block_w * block_h) as usize);

    for by in row_block_start..row_block_end {
        for bx in 0..blocks_per_row {
            block_texels.clear();
            for y in 0..block_h {
                let py = (by * block_h + y).min(height - 1);
                for x in 0..block_w {
                    let px = (bx * block_w + x).min(width - 1);
                    let idx = (py as usize * width as usize + px as usize) * 4;
                    block_texels.push([
                        rgba8[idx],
                        rgba8[idx + 1],
                        rgba8[idx + 2],
                        rgba8[idx + 3],
                    ]);
                }
            }
            let encoded = encode_block(&block_texels, channel);
            let block_index = by as usize * blocks_per_row as usize + bx as usize;
            let dst_start = block_index * BLOCK_BYTES;
            dst[dst_start..dst_start + BLOCK_BYTES].copy_from_slice(&encoded);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn void_extent_signature_is_stable() {
        let block = encode_void_extent_ldr(10, 20, 30, 255);
        assert_eq!(&block[0..2], &[0xFC, 0xFD]);
        assert_eq!(&block[2..8], &[0xFF; 6]);
    }

    #[test]
    fn uniform_block_round_trips_average() {
        let texels = vec![[100u8, 150, 200, 255]; 16];
        let block = encode_block(&texels, AstcChannel::Unorm);
        assert_eq!(u16::from_le_bytes([block[8], block[9]]) >> 8, 100);
    }

    #[test]
    fn whole_image_produces_one_block_per_cell() {
        let width = 8;
        let height = 8;
        let rgba8 = vec![128u8; (width * height * 4) as usize];
        let mut dst = vec![0u8; 2 * 2 * BLOCK_BYTES];
        compress_image(width, height, 4, 4, 0, 2, &rgba8, AstcChannel::Unorm, &mut dst);
        assert!(dst.iter().any(|&b| b != 0));
    }
}
