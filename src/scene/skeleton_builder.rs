//! Skeleton Builder (§4.8 "Skeleton").
//!
//! DFS pre-order joint indexing over a foreign skeleton root, root-rotation
//! correction, SoA bind-pose packing via [`crate::skeleton::pack_soa`], and
//! joint-GUID continuity against a previously-compiled skeleton's `joints`
//! map.
//!
//! Grounded on the teacher's `scene/skeleton.rs` DFS bone-list construction
//! (`Skeleton::from_gltf_skin` walks a skin's joint list and records parent
//! indices in traversal order) — generalised here to also assign/preserve
//! stable joint GUIDs and to pack the bind pose into the on-disk SoA layout
//! instead of a GPU joint-matrix buffer.

use rustc_hash::FxHashMap;

use crate::guid::Guid;
use crate::hierarchy::transform::{convert_and_adjust_transform, rotate_90_about_x, LocalTransform};
use crate::skeleton::{JointEntry, Skeleton};

/// One joint discovered during the DFS walk, before GUID assignment.
pub struct RawJoint {
    pub name: String,
    pub parent: i32,
    pub local_transform: LocalTransform,
}

/// Walks a glTF skin's joint list in DFS pre-order starting from its first
/// joint (the conventional skeleton root), recording each joint's parent
/// index within the *same* DFS order (§4.8: "store `jointParent[]` in the
/// same DFS order").
#[must_use]
pub fn walk_skin_joints(skin: &gltf::Skin) -> Vec<RawJoint> {
    let joints: Vec<gltf::Node> = skin.joints().collect();
    let index_of = |target_index: usize| joints.iter().position(|n| n.index() == target_index);

    let mut raw = Vec::with_capacity(joints.len());
    for joint in &joints {
        let parent = joints
            .iter()
            .find(|candidate| candidate.children().any(|c| c.index() == joint.index()))
            .and_then(|p| index_of(p.index()))
            .map(|i| i as i32)
            .unwrap_or(-1);

        let (t, r, s) = joint.transform().decomposed();
        let foreign = LocalTransform::new(
            glam::Vec3::from(t),
            glam::Quat::from_xyzw(r[0], r[1], r[2], r[3]),
            glam::Vec3::from(s),
        );
        raw.push(RawJoint {
            name: joint.name().unwrap_or("Joint").to_string(),
            parent,
            local_transform: convert_and_adjust_transform(foreign),
        });
    }
    raw
}

/// Builds a full [`Skeleton`] from the DFS-walked joints, applying the
/// root's extra `+90°` X rotation (§4.8) and resolving joint GUIDs against
/// `existing_joints` (name -> previously assigned entry) read back from
/// metadata, generating fresh GUIDs for any joint not already present.
#[must_use]
pub fn build_skeleton(mut raw: Vec<RawJoint>, existing_joints: &FxHashMap<String, JointEntry>) -> Skeleton {
    if let Some(root) = raw.iter_mut().find(|j| j.parent == -1) {
        root.local_transform.rotation = rotate_90_about_x(root.local_transform.rotation);
    }

    let joint_names: Vec<String> = raw.iter().map(|j| j.name.clone()).collect();
    let joint_parents: Vec<i32> = raw.iter().map(|j| j.parent).collect();
    let local_transforms: Vec<LocalTransform> = raw.iter().map(|j| j.local_transform).collect();

    let joints: Vec<JointEntry> = joint_names
        .iter()
        .enumerate()
        .map(|(index, name)| {
            let guid = existing_joints.get(name).map(|e| e.guid).unwrap_or_else(Guid::new);
            JointEntry { guid, name: name.clone(), index: index as u32 }
        })
        .collect();

    Skeleton::build(joint_names, joint_parents, &local_transforms, joints)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec3};

    fn sample_raw() -> Vec<RawJoint> {
        vec![
            RawJoint { name: "root".into(), parent: -1, local_transform: LocalTransform::IDENTITY },
            RawJoint { name: "spine".into(), parent: 0, local_transform: LocalTransform::IDENTITY },
        ]
    }

    #[test]
    fn preserves_existing_joint_guids_by_name() {
        let existing_guid = Guid::new();
        let mut existing = FxHashMap::default();
        existing.insert("spine".to_string(), JointEntry { guid: existing_guid, name: "spine".into(), index: 1 });

        let skeleton = build_skeleton(sample_raw(), &existing);
        let spine = skeleton.joints.iter().find(|j| j.name == "spine").unwrap();
        assert_eq!(spine.guid, existing_guid);
    }

    #[test]
    fn new_joints_get_fresh_guids() {
        let skeleton = build_skeleton(sample_raw(), &FxHashMap::default());
        assert_ne!(skeleton.joints[0].guid, Guid::NIL);
        assert_ne!(skeleton.joints[0].guid, skeleton.joints[1].guid);
    }

    #[test]
    fn root_rotation_gets_extra_x_correction() {
        let mut raw = sample_raw();
        raw[0].local_transform.rotation = Quat::IDENTITY;
        let skeleton = build_skeleton(raw, &FxHashMap::default());
        // Root (lane 0 of the first SoA group) picks up the skeleton's
        // extra +90 degree X rotation on top of the identity input, so its
        // packed rotation should no longer equal the identity quaternion.
        let root_rotation_w = skeleton.bind_pose[0].rotation.w[0];
        assert!((root_rotation_w - 1.0).abs() > 1e-4);
        let _ = Vec3::ZERO;
    }
}
