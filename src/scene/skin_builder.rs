//! Mesh Skin Builder (§4.8 "MeshSkin").
//!
//! Resolves each bone's skeleton joint index, corrects inverse bind
//! matrices to the engine basis, sorts/pads per-vertex influences, and
//! builds the dense joint-remap table a [`crate::mesh_skin::MeshSkin`]
//! stores.
//!
//! Grounded on the teacher's `scene/skeleton.rs` `inverse_bind_matrices`
//! extraction from a glTF skin's `inverseBindMatrices` accessor (same
//! source data), generalised to also remap to the dense per-mesh joint set
//! and drop/reconstruct the last influence weight the way §3/§4.8 specify,
//! neither of which the teacher's live skin (which indexes the full
//! skeleton directly, no remap) needs.

use glam::{Mat4, Vec3};
use smallvec::SmallVec;

use crate::mesh_skin::{pack_vertex_influences, MeshSkin, MeshSkinPart};

/// One vertex's raw joint/weight influences as read from glTF's
/// `JOINTS_0`/`WEIGHTS_0` accessors, already mapped from the primitive's
/// local joint index to the skeleton's full DFS joint index.
pub type RawInfluences = SmallVec<[(u16, f32); 4]>;

/// Corrects a glTF inverse-bind matrix (column-major, foreign basis) to
/// the engine's `{Right, -Up, Forward}` basis (§4.8: "corrected to engine
/// basis"). The correction is the same axis permutation
/// [`crate::hierarchy::transform::convert_and_adjust_transform`] applies
/// to TRS transforms, expressed here as a change-of-basis matrix
/// conjugation since an inverse bind pose is a raw 4x4, not a TRS triple.
#[must_use]
pub fn correct_inverse_bind_matrix(m: Mat4) -> Mat4 {
    // Basis matrix for (x, y, z) -> (x, -z, y); self-inverse up to sign
    // since it's an orthonormal permutation, so conjugating with it in
    // both directions yields the engine-space inverse bind pose.
    let basis = Mat4::from_cols(
        glam::Vec4::new(1.0, 0.0, 0.0, 0.0),
        glam::Vec4::new(0.0, 0.0, 1.0, 0.0),
        glam::Vec4::new(0.0, -1.0, 0.0, 0.0),
        glam::Vec4::new(0.0, 0.0, 0.0, 1.0),
    );
    basis * m * basis.transpose()
}

/// Builds the skin's dense joint-remap table and per-joint inverse bind
/// poses from the full skeleton-space joint indices a mesh's vertices
/// actually reference, plus the per-joint inverse bind matrices indexed by
/// that same full skeleton joint index.
#[must_use]
pub fn build_mesh_skin(
    vertex_influences: &[RawInfluences],
    skeleton_inverse_bind_poses: &[Mat4],
    max_influence: usize,
) -> MeshSkin {
    let used_joint_ids: Vec<u32> = vertex_influences
        .iter()
        .flat_map(|v| v.iter().map(|(j, _)| *j as u32))
        .collect();
    let joint_remap = MeshSkin::build_joint_remap(&used_joint_ids);

    let inverse_bind_poses: Vec<Mat4> = joint_remap
        .iter()
        .map(|&full_index| {
            skeleton_inverse_bind_poses
                .get(full_index as usize)
                .copied()
                .map(correct_inverse_bind_matrix)
                .unwrap_or(Mat4::IDENTITY)
        })
        .collect();

    let mut all_indices = Vec::with_capacity(vertex_influences.len() * max_influence);
    let mut all_weights = Vec::with_capacity(vertex_influences.len() * max_influence.saturating_sub(1));

    for influences in vertex_influences {
        let remapped: Vec<(u16, f32)> = influences
            .iter()
            .map(|&(joint, weight)| {
                let dense = MeshSkin::dense_index(&joint_remap, joint as u32).unwrap_or(0);
                (dense, weight)
            })
            .collect();
        let (indices, weights) = pack_vertex_influences(remapped, max_influence);
        all_indices.extend(indices);
        all_weights.extend(weights);
    }

    let part = MeshSkinPart {
        vertex_count: vertex_influences.len() as u32,
        joint_indices: all_indices,
        joint_weights: all_weights,
    };

    MeshSkin { joint_remap, inverse_bind_poses, parts: vec![part] }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correcting_identity_bind_pose_stays_identity() {
        assert_eq!(correct_inverse_bind_matrix(Mat4::IDENTITY), Mat4::IDENTITY);
    }

    #[test]
    fn correcting_translation_permutes_y_and_z() {
        let m = Mat4::from_translation(Vec3::new(0.0, 1.0, 0.0));
        let corrected = correct_inverse_bind_matrix(m);
        let translation = corrected.transform_point3(Vec3::ZERO);
        assert!(translation.abs_diff_eq(Vec3::new(0.0, 0.0, 1.0), 1e-5));
    }

    #[test]
    fn build_mesh_skin_produces_dense_remap_and_one_part() {
        let influences: Vec<RawInfluences> = vec![
            SmallVec::from_slice(&[(5u16, 0.6), (2, 0.4)]),
            SmallVec::from_slice(&[(2u16, 1.0)]),
        ];
        let skeleton_poses = vec![Mat4::IDENTITY; 10];
        let skin = build_mesh_skin(&influences, &skeleton_poses, 4);

        assert_eq!(skin.joint_remap, vec![2, 5]);
        assert_eq!(skin.parts.len(), 1);
        assert_eq!(skin.parts[0].vertex_count, 2);
    }
}
