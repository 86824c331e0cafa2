//! Coordinate convention correction (§4.6, §8 "Coordinate convention
//! round-trip").
//!
//! The engine uses a `{Right, -Up, Forward}` axis convention while the
//! foreign scene sources (glTF et al.) use `{Right, Up, Forward}`. Every
//! local transform that enters the hierarchy goes through
//! [`convert_and_adjust_transform`] on ingest and
//! [`convert_and_adjust_transform_inverse`] on export (§4.10 "Final build").
//!
//! Grounded on the teacher's `scene/transform.rs` `Transform` (same TRS
//! shape: `Vec3` translation, `Quat` rotation, `Vec3` scale) but this is a
//! plain data conversion, not a live scene-graph component — no dirty
//! tracking or cached matrices, since the compile core never re-evaluates
//! a transform after emitting it into a [`crate::hierarchy::HierarchyEntry`].

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// One hierarchy entry's local transform, already in engine space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocalTransform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for LocalTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl LocalTransform {
    pub const IDENTITY: LocalTransform = LocalTransform {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    #[must_use]
    pub fn new(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self { translation, rotation, scale }
    }
}

/// Permutes `(x, y, z) -> (x, -z, y)`: a 90 degree rotation about X that
/// maps the foreign `{Right, Up, Forward}` basis onto the engine's
/// `{Right, -Up, Forward}` basis.
fn swap_up_forward(v: Vec3) -> Vec3 {
    Vec3::new(v.x, -v.z, v.y)
}

/// Inverse permutation: `(x, y, z) -> (x, z, -y)`.
fn swap_up_forward_inverse(v: Vec3) -> Vec3 {
    Vec3::new(v.x, v.z, -v.y)
}

/// `ConvertAndAdjustTransform` (§4.6): foreign-space local transform ->
/// engine-space local transform. Scale is permuted without sign flip
/// (magnitudes are never negative for a well-formed source transform);
/// rotation follows the spec's literal `q' = (qx, -qz, qy, qw)`.
#[must_use]
pub fn convert_and_adjust_transform(t: LocalTransform) -> LocalTransform {
    LocalTransform {
        translation: swap_up_forward(t.translation),
        rotation: Quat::from_xyzw(t.rotation.x, -t.rotation.z, t.rotation.y, t.rotation.w),
        scale: Vec3::new(t.scale.x, t.scale.z, t.scale.y),
    }
}

/// `ConvertAndAdjustTransformInverse` (§4.10): the exact inverse of
/// [`convert_and_adjust_transform`], used by the Scene Exporter when
/// building foreign nodes from engine-space local transforms.
#[must_use]
pub fn convert_and_adjust_transform_inverse(t: LocalTransform) -> LocalTransform {
    LocalTransform {
        translation: swap_up_forward_inverse(t.translation),
        rotation: Quat::from_xyzw(t.rotation.x, t.rotation.z, -t.rotation.y, t.rotation.w),
        scale: Vec3::new(t.scale.x, t.scale.z, t.scale.y),
    }
}

/// Skeleton builder root-joint correction (§4.8): "correcting the root
/// rotation by `+90°` around X", applied in addition to the usual
/// `convert_and_adjust_transform` basis swap.
#[must_use]
pub fn rotate_90_about_x(q: Quat) -> Quat {
    Quat::from_rotation_x(std::f32::consts::FRAC_PI_2) * q
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_is_exact_for_axis_aligned_translation() {
        let t = LocalTransform::new(Vec3::new(1.0, 2.0, 3.0), Quat::IDENTITY, Vec3::ONE);
        let adjusted = convert_and_adjust_transform(t);
        let back = convert_and_adjust_transform_inverse(adjusted);
        assert_eq!(back.translation, t.translation);
    }

    #[test]
    fn round_trip_preserves_arbitrary_rotation() {
        let q = Quat::from_euler(glam::EulerRot::XYZ, 0.3, -0.7, 1.1);
        let t = LocalTransform::new(Vec3::new(4.0, -5.0, 6.0), q, Vec3::new(1.0, 2.0, 1.0));
        let adjusted = convert_and_adjust_transform(t);
        let back = convert_and_adjust_transform_inverse(adjusted);
        assert!(back.translation.abs_diff_eq(t.translation, 1e-5));
        assert!(back.rotation.abs_diff_eq(t.rotation, 1e-5) || back.rotation.abs_diff_eq(-t.rotation, 1e-5));
        assert!(back.scale.abs_diff_eq(t.scale, 1e-5));
    }

    #[test]
    fn forward_conversion_maps_up_to_negative_up() {
        // A point one unit "up" in source space (+Y) lands on the engine's
        // -Y-as-up convention at +Z (since the permutation is x,-z,y -> y
        // ends up on engine Z).
        let t = LocalTransform::new(Vec3::new(0.0, 1.0, 0.0), Quat::IDENTITY, Vec3::ONE);
        let adjusted = convert_and_adjust_transform(t);
        assert!(adjusted.translation.abs_diff_eq(Vec3::new(0.0, 0.0, 1.0), 1e-6));
    }
}
