//! Mesh Builder (§4.7): one foreign glTF mesh primitive → one
//! [`crate::mesh::StaticObject`] binary plus the metadata-tree mutations
//! that attach a "Mesh Collider" → "Mesh" pair of hierarchy entries.
//!
//! Grounded on the teacher's `src/assets/loaders/gltf.rs` vertex-attribute
//! extraction (`POSITION`/`NORMAL`/`TANGENT`/`TEXCOORD_0`/`COLOR_0`
//! accessor reads) for *how* to pull vertex streams out of a
//! `gltf::Primitive`, generalised here to also emit the compact tangent
//! frame and sorted-index binary the spec calls for instead of a GPU
//! vertex buffer.

use std::path::Path;

use glam::{Vec2, Vec3};

use crate::errors::{CompileError, Result};
use crate::hierarchy::component::{Component, PhysicsType, RenderStages};
use crate::hierarchy::entry::HierarchyEntry;
use crate::mesh::{BoundingBox, CompressedTangentFrame, StaticObject, VertexColorSlot};

/// Extracted per-primitive vertex/index streams, pre-correction (i.e. in
/// the foreign glTF `{Right, Up, Forward}` basis).
pub struct RawPrimitive {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    /// `(tangent.xyz, handedness)`; missing bitangents default to
    /// `(0,0,1)` per §4.7 step 3 applied to the *tangent* itself when the
    /// source carries no `TANGENT` attribute at all.
    pub tangents: Vec<(Vec3, f32)>,
    pub texcoords: Vec<Vec2>,
    pub color_slots: Vec<Vec<[u8; 4]>>,
    pub indices: Vec<u32>,
}

/// Counts used vertex-color slots and flags any slot carrying
/// non-opaque alpha (§4.7 step 2).
#[must_use]
pub fn classify_vertex_color_slots(color_slots: &[Vec<[u8; 4]>]) -> Vec<VertexColorSlot> {
    color_slots
        .iter()
        .map(|slot| VertexColorSlot {
            is_used: !slot.is_empty(),
            has_alpha: slot.iter().any(|c| c[3] != 255),
        })
        .collect()
}

/// Builds the on-disk [`StaticObject`] from extracted raw streams,
/// applying coordinate correction to positions/normals/tangents, the
/// `(u, 1-v)` texcoord flip, the compact tangent-frame packing, and the
/// sum-of-indices triangle sort (§4.7 steps 1, 3, 4, 5).
#[must_use]
pub fn build_static_object(raw: &RawPrimitive) -> StaticObject {
    let positions: Vec<Vec3> = raw
        .positions
        .iter()
        .map(|&p| convert_and_adjust_transform_point(p))
        .collect();

    let tangent_frames: Vec<CompressedTangentFrame> = raw
        .normals
        .iter()
        .zip(raw.tangents.iter())
        .map(|(&n, &(t, sign))| {
            let normal = convert_and_adjust_transform_point(n).normalize_or_zero();
            let tangent = convert_and_adjust_transform_point(t).normalize_or_zero();
            CompressedTangentFrame::encode(normal, tangent, sign)
        })
        .collect();

    let texcoords: Vec<Vec2> = raw.texcoords.iter().map(|uv| Vec2::new(uv.x, 1.0 - uv.y)).collect();

    let mut indices = raw.indices.clone();
    StaticObject::sort_triangles_by_index_sum(&mut indices);

    let bounds = BoundingBox::from_positions(&positions);

    StaticObject {
        positions,
        tangent_frames,
        texcoords,
        vertex_colors: raw.color_slots.clone(),
        indices,
        bounds,
    }
}

/// Applies the same axis correction [`convert_and_adjust_transform`] uses
/// for transforms, to a bare direction/position vector (normals,
/// tangents, and vertex positions all live in the same corrected basis,
/// §4.6 "Coordinate correction").
fn convert_and_adjust_transform_point(v: Vec3) -> Vec3 {
    Vec3::new(v.x, -v.z, v.y)
}

/// Writes the mesh binary to `<shared_path><mesh-binary-extension>`
/// (§4.7 step 6). Returns `Ok(())` on success; errors are reported by the
/// caller but do not abort the rest of the scene compile (§4.7: "On
/// failure, report but continue").
pub fn write_mesh_binary(mesh: &StaticObject, shared_path: &Path, extension: &str) -> Result<()> {
    let path = shared_path.with_extension(extension);
    let mut file = std::fs::File::create(&path).map_err(CompileError::IoError)?;
    mesh.write_to(&mut file).map_err(CompileError::IoError)?;
    Ok(())
}

/// Ensures the `"Mesh Collider" -> "Mesh"` child/grandchild pair exists
/// under `scene_root`, per §4.7 step 7 (idempotent: a re-compile must not
/// duplicate the pair, matching §8's "determinism of identity").
pub fn ensure_mesh_collider_entry(
    scene_root: &mut HierarchyEntry,
    mesh_guid: crate::guid::Guid,
    material_instance_guid: crate::guid::Guid,
) {
    scene_root.physics_type.get_or_insert(PhysicsType::Static);

    let already_present = scene_root.children.iter().any(|c| c.name == "Mesh Collider");
    if already_present {
        return;
    }

    let mesh_entry = HierarchyEntry::new(
        "Mesh",
        "Mesh",
        Component::StaticMesh {
            mesh: mesh_guid,
            material_instance: material_instance_guid,
            stages: RenderStages::default(),
        },
    );
    let collider_entry = HierarchyEntry::new(
        "Mesh Collider",
        "Mesh Collider",
        Component::MeshCollider {
            mesh: mesh_guid,
            physical_material: Default::default(),
        },
    )
    .with_children(vec![mesh_entry]);

    scene_root.children.push(collider_entry);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guid::Guid;

    fn cube_raw() -> RawPrimitive {
        let positions = vec![Vec3::ZERO; 4];
        let normals = vec![Vec3::Y; 4];
        let tangents = vec![(Vec3::X, 1.0); 4];
        let texcoords = vec![Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(1.0, 1.0), Vec2::new(0.0, 1.0)];
        RawPrimitive { positions, normals, tangents, texcoords, color_slots: Vec::new(), indices: vec![0, 1, 2, 0, 2, 3] }
    }

    #[test]
    fn texcoords_flip_v() {
        let mesh = build_static_object(&cube_raw());
        assert_eq!(mesh.texcoords[0], Vec2::new(0.0, 1.0));
        assert_eq!(mesh.texcoords[2], Vec2::new(1.0, 0.0));
    }

    #[test]
    fn vertex_count_and_triangle_count_match_input() {
        let mesh = build_static_object(&cube_raw());
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_index_count(), 6);
    }

    #[test]
    fn vertex_color_slots_flag_alpha_when_present() {
        let slots = vec![vec![[255, 0, 0, 255], [0, 255, 0, 200]]];
        let classified = classify_vertex_color_slots(&slots);
        assert!(classified[0].is_used);
        assert!(classified[0].has_alpha);
    }

    #[test]
    fn ensure_mesh_collider_entry_is_idempotent() {
        let mut root = HierarchyEntry::new("Root", "Root", Component::Scene { scene: Guid::new() });
        let mesh_guid = Guid::new();
        let material_guid = Guid::new();
        ensure_mesh_collider_entry(&mut root, mesh_guid, material_guid);
        ensure_mesh_collider_entry(&mut root, mesh_guid, material_guid);
        assert_eq!(root.children.iter().filter(|c| c.name == "Mesh Collider").count(), 1);
    }
}
