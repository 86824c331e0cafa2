//! Skeleton (runtime representation), §3.
//!
//! Joint count, signed joint parents (-1 for root), a contiguous
//! 0-terminated joint-name char pool, and the bind pose packed SoA
//! "four joints at a time" the way `ozz-animation`-style runtimes do it
//! (GLOSSARY "SoA bind pose") — this is the one place in the spec that
//! names a specific third-party-runtime packing convention rather than a
//! teacher-owned shape, so it's grounded directly on that convention
//! rather than on `scene/skeleton.rs` (which holds the teacher's *live*
//! skinning skeleton: `Vec<NodeHandle>` bone list plus a GPU-resident
//! joint-matrix buffer, nothing serializable to disk).

use std::io::{self, Read, Write};

use crate::guid::Guid;
use crate::hierarchy::LocalTransform;

/// Four joints' worth of one vector component, laid out as SIMD lanes.
pub type Lane4 = [f32; 4];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoaVec3 {
    pub x: Lane4,
    pub y: Lane4,
    pub z: Lane4,
}

impl SoaVec3 {
    pub const IDENTITY_TRANSLATION: SoaVec3 = SoaVec3 { x: [0.0; 4], y: [0.0; 4], z: [0.0; 4] };
    pub const IDENTITY_SCALE: SoaVec3 = SoaVec3 { x: [1.0; 4], y: [1.0; 4], z: [1.0; 4] };
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoaQuat {
    pub x: Lane4,
    pub y: Lane4,
    pub z: Lane4,
    pub w: Lane4,
}

impl SoaQuat {
    pub const IDENTITY: SoaQuat = SoaQuat { x: [0.0; 4], y: [0.0; 4], z: [0.0; 4], w: [1.0; 4] };
}

/// One SoA-packed group of four joints' bind-pose transforms (GLOSSARY
/// "SoA bind pose").
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoaTransform {
    pub translation: SoaVec3,
    pub rotation: SoaQuat,
    pub scale: SoaVec3,
}

impl SoaTransform {
    pub const IDENTITY: SoaTransform = SoaTransform {
        translation: SoaVec3::IDENTITY_TRANSLATION,
        rotation: SoaQuat::IDENTITY,
        scale: SoaVec3::IDENTITY_SCALE,
    };
}

/// One joint's identity entry read back from (or generated for) existing
/// metadata's `joints` map (§6: "map `joint_guid -> {name, index}`").
#[derive(Debug, Clone, PartialEq)]
pub struct JointEntry {
    pub guid: Guid,
    pub name: String,
    pub index: u32,
}

/// The full on-disk skeleton asset (§3).
#[derive(Debug, Clone, PartialEq)]
pub struct Skeleton {
    pub joint_count: u32,
    /// Signed parent index per joint, in DFS pre-order; `-1` marks a root
    /// (§4.8: "store `jointParent[]` in the same DFS order").
    pub joint_parents: Vec<i32>,
    pub joint_names: Vec<String>,
    /// Bind pose packed four joints at a time; `identity`-padded so
    /// `bind_pose.len() * 4 >= joint_count` exactly (§4.8: "pad with
    /// identity to the next multiple of 4").
    pub bind_pose: Vec<SoaTransform>,
    pub joints: Vec<JointEntry>,
}

impl Skeleton {
    /// Builds a skeleton from DFS-ordered joint data, packing the bind
    /// pose into SoA groups of four and padding the tail group with
    /// identity transforms (§4.8).
    #[must_use]
    pub fn build(
        joint_names: Vec<String>,
        joint_parents: Vec<i32>,
        local_transforms: &[LocalTransform],
        joints: Vec<JointEntry>,
    ) -> Self {
        let joint_count = joint_names.len() as u32;
        let bind_pose = pack_soa(local_transforms);
        Self { joint_count, joint_parents, joint_names, bind_pose, joints }
    }

    /// Joint index for a name, used by the Mesh-Skin builder and by
    /// animation matching ("first channel's bone name").
    #[must_use]
    pub fn joint_index(&self, name: &str) -> Option<u32> {
        self.joint_names.iter().position(|n| n == name).map(|i| i as u32)
    }

    /// Contiguous 0-terminated joint-name char pool (§3).
    #[must_use]
    pub fn name_pool(&self) -> Vec<u8> {
        let mut pool = Vec::new();
        for name in &self.joint_names {
            pool.extend_from_slice(name.as_bytes());
            pool.push(0);
        }
        pool
    }

    /// Opaque binary serialization (§6: "serialized via the runtime's own
    /// `Save(file)` ... entry points").
    pub fn write_to(&self, w: &mut impl Write) -> io::Result<()> {
        w.write_all(&self.joint_count.to_le_bytes())?;
        for parent in &self.joint_parents {
            w.write_all(&parent.to_le_bytes())?;
        }
        let pool = self.name_pool();
        w.write_all(&(pool.len() as u32).to_le_bytes())?;
        w.write_all(&pool)?;
        w.write_all(&(self.bind_pose.len() as u32).to_le_bytes())?;
        for soa in &self.bind_pose {
            for lane in [soa.translation.x, soa.translation.y, soa.translation.z] {
                for v in lane {
                    w.write_all(&v.to_le_bytes())?;
                }
            }
            for lane in [soa.rotation.x, soa.rotation.y, soa.rotation.z, soa.rotation.w] {
                for v in lane {
                    w.write_all(&v.to_le_bytes())?;
                }
            }
            for lane in [soa.scale.x, soa.scale.y, soa.scale.z] {
                for v in lane {
                    w.write_all(&v.to_le_bytes())?;
                }
            }
        }
        Ok(())
    }

    pub fn read_from(r: &mut impl Read) -> io::Result<(u32, Vec<i32>, Vec<u8>, Vec<SoaTransform>)> {
        let mut u32buf = [0u8; 4];
        r.read_exact(&mut u32buf)?;
        let joint_count = u32::from_le_bytes(u32buf);

        let mut joint_parents = Vec::with_capacity(joint_count as usize);
        for _ in 0..joint_count {
            r.read_exact(&mut u32buf)?;
            joint_parents.push(i32::from_le_bytes(u32buf));
        }

        r.read_exact(&mut u32buf)?;
        let pool_len = u32::from_le_bytes(u32buf) as usize;
        let mut pool = vec![0u8; pool_len];
        r.read_exact(&mut pool)?;

        r.read_exact(&mut u32buf)?;
        let soa_count = u32::from_le_bytes(u32buf) as usize;
        let mut bind_pose = Vec::with_capacity(soa_count);
        for _ in 0..soa_count {
            let mut read_lane = |r: &mut dyn Read| -> io::Result<Lane4> {
                let mut lane = [0f32; 4];
                for v in &mut lane {
                    let mut b = [0u8; 4];
                    r.read_exact(&mut b)?;
                    *v = f32::from_le_bytes(b);
                }
                Ok(lane)
            };
            let translation = SoaVec3 { x: read_lane(r)?, y: read_lane(r)?, z: read_lane(r)? };
            let rotation = SoaQuat { x: read_lane(r)?, y: read_lane(r)?, z: read_lane(r)?, w: read_lane(r)? };
            let scale = SoaVec3 { x: read_lane(r)?, y: read_lane(r)?, z: read_lane(r)? };
            bind_pose.push(SoaTransform { translation, rotation, scale });
        }

        Ok((joint_count, joint_parents, pool, bind_pose))
    }
}

/// Packs a flat list of local transforms into SoA groups of four,
/// identity-padding the final group (§4.8).
#[must_use]
pub fn pack_soa(transforms: &[LocalTransform]) -> Vec<SoaTransform> {
    let padded_len = transforms.len().div_ceil(4) * 4;
    let mut out = Vec::with_capacity(padded_len / 4);

    for group in 0..padded_len / 4 {
        let mut translation = SoaVec3::IDENTITY_TRANSLATION;
        let mut rotation = SoaQuat::IDENTITY;
        let mut scale = SoaVec3::IDENTITY_SCALE;

        for lane in 0..4 {
            let idx = group * 4 + lane;
            if let Some(t) = transforms.get(idx) {
                translation.x[lane] = t.translation.x;
                translation.y[lane] = t.translation.y;
                translation.z[lane] = t.translation.z;
                rotation.x[lane] = t.rotation.x;
                rotation.y[lane] = t.rotation.y;
                rotation.z[lane] = t.rotation.z;
                rotation.w[lane] = t.rotation.w;
                scale.x[lane] = t.scale.x;
                scale.y[lane] = t.scale.y;
                scale.z[lane] = t.scale.z;
            }
        }
        out.push(SoaTransform { translation, rotation, scale });
    }
    out
}

/// Splits a 0-terminated name pool back into individual joint names.
#[must_use]
pub fn unpack_name_pool(pool: &[u8], count: usize) -> Vec<String> {
    let mut names = Vec::with_capacity(count);
    let mut start = 0;
    for i in 0..pool.len() {
        if pool[i] == 0 {
            names.push(String::from_utf8_lossy(&pool[start..i]).into_owned());
            start = i + 1;
            if names.len() == count {
                break;
            }
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec3};

    fn sample_transforms(n: usize) -> Vec<LocalTransform> {
        (0..n)
            .map(|i| LocalTransform::new(Vec3::splat(i as f32), Quat::IDENTITY, Vec3::ONE))
            .collect()
    }

    #[test]
    fn pads_to_next_multiple_of_four() {
        assert_eq!(pack_soa(&sample_transforms(5)).len(), 2);
        assert_eq!(pack_soa(&sample_transforms(4)).len(), 1);
        assert_eq!(pack_soa(&sample_transforms(1)).len(), 1);
    }

    #[test]
    fn padding_lanes_are_identity() {
        let packed = pack_soa(&sample_transforms(5));
        let tail = &packed[1];
        // Lane 0 holds joint index 4 (real); lanes 1..3 are padding.
        assert_eq!(tail.scale.x[1], 1.0);
        assert_eq!(tail.scale.y[1], 1.0);
        assert_eq!(tail.rotation.w[1], 1.0);
    }

    #[test]
    fn name_pool_round_trips() {
        let skeleton = Skeleton::build(
            vec!["root".into(), "spine".into(), "head".into()],
            vec![-1, 0, 1],
            &sample_transforms(3),
            Vec::new(),
        );
        let pool = skeleton.name_pool();
        let names = unpack_name_pool(&pool, 3);
        assert_eq!(names, skeleton.joint_names);
    }

    #[test]
    fn binary_round_trips_joint_parents_and_pose() {
        let skeleton = Skeleton::build(
            vec!["root".into(), "child".into()],
            vec![-1, 0],
            &sample_transforms(2),
            Vec::new(),
        );
        let mut bytes = Vec::new();
        skeleton.write_to(&mut bytes).unwrap();
        let (joint_count, parents, pool, bind_pose) = Skeleton::read_from(&mut bytes.as_slice()).unwrap();
        assert_eq!(joint_count, 2);
        assert_eq!(parents, vec![-1, 0]);
        assert_eq!(unpack_name_pool(&pool, 2), skeleton.joint_names);
        assert_eq!(bind_pose, skeleton.bind_pose);
    }
}
