//! Pixel Classifier (§4.2).
//!
//! Scans a decoded image's alpha channel to determine alpha-channel
//! semantics. Grounded on the teacher's own alpha handling in
//! `src/assets/mod.rs::load_image_from_file` (`img.into_rgba8()` — the
//! classifier consumes the same `image::RgbaImage` representation) and
//! `core/texture.rs`'s format-aware texture construction.

use crate::texture::policy::AlphaUsage;
use image::RgbaImage;

bitflags::bitflags! {
    /// Running classification state; starts with every bit set and bits are
    /// cleared as contradicting pixels are observed (§4.2).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct AlphaFlags: u8 {
        /// Every alpha value seen so far is 0 or MAX (no partial alpha).
        const IS_MASKED    = 0b001;
        /// Every alpha value seen so far equals MAX.
        const ALL_OPAQUE   = 0b010;
        /// Every alpha value seen so far equals 0.
        const ALL_INVISIBLE = 0b100;
    }
}

/// One 2D image layer (array slice, cube face, or 3D slice) to classify.
/// The classifier only cares about per-pixel alpha, so topology beyond
/// "a flat sequence of RGBA pixels" does not matter to this function;
/// callers iterating a 1D/2D/2D-array/3D/cube/cube-array source just need
/// to concatenate their faces/slices/layers (§4.2: "supports 1D, 2D,
/// 2D-array, 3D, cube and cube-array source topologies").
pub fn classify(image: &RgbaImage) -> AlphaUsage {
    classify_pixels(image.pixels().map(|p| p.0[3]))
}

/// Classifies an arbitrary alpha sequence directly; used both by
/// [`classify`] and by callers that have already concatenated multiple
/// cube faces / array layers / 3D slices into one logical texture before
/// classifying.
pub fn classify_pixels(alphas: impl Iterator<Item = u8>) -> AlphaUsage {
    let mut flags = AlphaFlags::all();

    for alpha in alphas {
        if alpha > 0 && alpha < u8::MAX {
            flags.remove(AlphaFlags::IS_MASKED);
        }
        if alpha != u8::MAX {
            flags.remove(AlphaFlags::ALL_OPAQUE);
        }
        if alpha != 0 {
            flags.remove(AlphaFlags::ALL_INVISIBLE);
        }
        if flags.is_empty() {
            // Nothing left to disprove; Transparency is already the final
            // answer regardless of remaining pixels.
            break;
        }
    }

    if flags.contains(AlphaFlags::ALL_OPAQUE) {
        AlphaUsage::None
    } else if flags.contains(AlphaFlags::IS_MASKED) {
        AlphaUsage::Mask
    } else {
        AlphaUsage::Transparency
    }
}

/// Classifies an image that has no alpha channel at all (e.g. RGB8 source):
/// always `None`, matching §4.2's "skip if alpha is not a channel" —
/// skipping every pixel never clears `ALL_OPAQUE`.
#[must_use]
pub fn classify_no_alpha_channel() -> AlphaUsage {
    AlphaUsage::None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_opaque_classifies_none() {
        assert_eq!(classify_pixels([255, 255, 255].into_iter()), AlphaUsage::None);
    }

    #[test]
    fn binary_alpha_classifies_mask() {
        assert_eq!(classify_pixels([0, 255, 0, 255].into_iter()), AlphaUsage::Mask);
    }

    #[test]
    fn partial_alpha_classifies_transparency() {
        assert_eq!(classify_pixels([255, 128, 0].into_iter()), AlphaUsage::Transparency);
    }

    #[test]
    fn all_invisible_is_transparency_not_mask_violation() {
        // Every alpha == 0: IS_MASKED survives (0 is a masked value), ALL_OPAQUE
        // is cleared, so per the priority order this still classifies Mask.
        assert_eq!(classify_pixels([0, 0, 0].into_iter()), AlphaUsage::Mask);
    }

    #[test]
    fn totality_every_image_gets_exactly_one_classification() {
        let cases: &[&[u8]] = &[&[255], &[0], &[0, 255], &[0, 128, 255], &[128]];
        for alphas in cases {
            let classification = classify_pixels(alphas.iter().copied());
            match classification {
                AlphaUsage::None => assert!(alphas.iter().all(|&a| a == 255)),
                AlphaUsage::Mask => assert!(alphas.iter().all(|&a| a == 0 || a == 255)),
                AlphaUsage::Transparency => assert!(alphas.iter().any(|&a| a > 0 && a < 255)),
            }
        }
    }
}
