//! The tagged component union carried by every [`super::HierarchyEntry`]
//! (§3 "Hierarchy Entry").
//!
//! Grounded on the teacher's `scene/light.rs`/`scene/camera.rs` (field
//! shapes for point/directional/spot lights and perspective cameras) and
//! `scene/node.rs` (the idea of a node carrying exactly one "kind" of
//! payload), generalised from live runtime components into a serializable
//! sum type with one variant per component kind, per design note "Tagged
//! component union": "implement as a sum type with one variant per
//! component kind".

use serde::{Deserialize, Serialize};

use crate::guid::{Guid, TypeGuid};

/// Physics body classification (§3), optional on every hierarchy entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhysicsType {
    Static,
    Dynamic,
    Kinematic,
}

impl Default for PhysicsType {
    fn default() -> Self {
        PhysicsType::Static
    }
}

/// Physical-material reference carried by every collider variant, with a
/// default GUID (§3: "all carry a physical-material GUID (with default)").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhysicalMaterialRef(pub Guid);

impl Default for PhysicalMaterialRef {
    fn default() -> Self {
        PhysicalMaterialRef(Guid::from_name(&TypeGuid::physics_body().0, "DefaultPhysicalMaterial"))
    }
}

/// Render-stage GUIDs a light/mesh contributes to (§3: "render-stage
/// GUIDs"), e.g. shadows / pbr-lighting / materials (§6).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderStages(pub Vec<Guid>);

/// Default animation controller reference attached to a `SkeletonMesh`
/// (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultAnimationController {
    pub animation: Guid,
}

/// One of the mutually-exclusive component variants a [`super::HierarchyEntry`]
/// may carry (§3 invariant (iii): "exactly one component variant is set").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Component {
    PointLight {
        color: [f32; 3],
        intensity: f32,
        radius: f32,
        stages: RenderStages,
    },
    DirectionalLight {
        color: [f32; 3],
        intensity: f32,
        stages: RenderStages,
    },
    SpotLight {
        color: [f32; 3],
        intensity: f32,
        radius: f32,
        fov: f32,
        stages: RenderStages,
    },
    Camera {
        fov: f32,
        near: f32,
        far: f32,
    },
    Scene {
        scene: Guid,
    },
    StaticMesh {
        mesh: Guid,
        material_instance: Guid,
        stages: RenderStages,
    },
    SkinnedMesh {
        mesh: Guid,
        material_instance: Guid,
        stages: RenderStages,
        mesh_skin: Guid,
        skeleton: Guid,
    },
    SkeletonMesh {
        skeleton: Guid,
        default_animation: Option<DefaultAnimationController>,
    },
    BoxCollider {
        half_size: [f32; 3],
        physical_material: PhysicalMaterialRef,
    },
    CapsuleCollider {
        radius: f32,
        half_height: f32,
        physical_material: PhysicalMaterialRef,
    },
    SphereCollider {
        radius: f32,
        physical_material: PhysicalMaterialRef,
    },
    InfinitePlaneCollider {
        physical_material: PhysicalMaterialRef,
    },
    MeshCollider {
        mesh: Guid,
        physical_material: PhysicalMaterialRef,
    },
    Simple,
}

impl Component {
    /// The type GUID this variant serializes its subtree under (§6:
    /// "Component-variant-specific subtrees keyed by the type GUID string
    /// of the variant").
    #[must_use]
    pub fn type_guid(&self) -> TypeGuid {
        match self {
            Component::PointLight { .. } => TypeGuid::point_light(),
            Component::DirectionalLight { .. } => TypeGuid::directional_light(),
            Component::SpotLight { .. } => TypeGuid::spot_light(),
            Component::Camera { .. } => TypeGuid::camera(),
            Component::Scene { .. } => TypeGuid::scene(),
            Component::StaticMesh { .. } => TypeGuid::static_mesh(),
            Component::SkinnedMesh { .. } => TypeGuid::skinned_mesh(),
            Component::SkeletonMesh { .. } => TypeGuid::skeleton_mesh(),
            Component::BoxCollider { .. } => TypeGuid::box_collider(),
            Component::CapsuleCollider { .. } => TypeGuid::capsule_collider(),
            Component::SphereCollider { .. } => TypeGuid::sphere_collider(),
            Component::InfinitePlaneCollider { .. } => TypeGuid::plane_collider(),
            Component::MeshCollider { .. } => TypeGuid::mesh_collider(),
            Component::Simple => TypeGuid::simple(),
        }
    }

    /// Maps a type GUID read back from an on-disk metadata document to the
    /// Rust enum variant name serde's externally-tagged representation
    /// uses, so [`super::entry::HierarchyEntry::from_value`] can rebuild a
    /// [`Component`] from the keyed subtree (§6).
    #[must_use]
    pub fn variant_name_for_type_guid(type_guid: &str) -> Option<&'static str> {
        let table: &[(fn() -> TypeGuid, &str)] = &[
            (TypeGuid::point_light, "PointLight"),
            (TypeGuid::directional_light, "DirectionalLight"),
            (TypeGuid::spot_light, "SpotLight"),
            (TypeGuid::camera, "Camera"),
            (TypeGuid::scene, "Scene"),
            (TypeGuid::static_mesh, "StaticMesh"),
            (TypeGuid::skinned_mesh, "SkinnedMesh"),
            (TypeGuid::skeleton_mesh, "SkeletonMesh"),
            (TypeGuid::box_collider, "BoxCollider"),
            (TypeGuid::capsule_collider, "CapsuleCollider"),
            (TypeGuid::sphere_collider, "SphereCollider"),
            (TypeGuid::plane_collider, "InfinitePlaneCollider"),
            (TypeGuid::mesh_collider, "MeshCollider"),
            (TypeGuid::simple, "Simple"),
        ];
        table
            .iter()
            .find(|(f, _)| f().0.to_string() == type_guid)
            .map(|(_, name)| *name)
    }

    /// Every asset GUID this component variant references (mesh,
    /// material-instance, skeleton, mesh-skin, scene, collider mesh, ...),
    /// feeding the root entry's deduplicated `dependencies[]` (§3 invariant
    /// (i), §8 "Dependency closure").
    #[must_use]
    pub fn referenced_guids(&self) -> Vec<Guid> {
        match self {
            Component::PointLight { stages, .. } | Component::DirectionalLight { stages, .. } => {
                stages.0.clone()
            }
            Component::SpotLight { stages, .. } => stages.0.clone(),
            Component::Camera { .. } | Component::Simple | Component::InfinitePlaneCollider { .. } => {
                Vec::new()
            }
            Component::Scene { scene } => vec![*scene],
            Component::StaticMesh { mesh, material_instance, stages } => {
                let mut v = vec![*mesh, *material_instance];
                v.extend(stages.0.iter().copied());
                v
            }
            Component::SkinnedMesh { mesh, material_instance, stages, mesh_skin, skeleton } => {
                let mut v = vec![*mesh, *material_instance, *mesh_skin, *skeleton];
                v.extend(stages.0.iter().copied());
                v
            }
            Component::SkeletonMesh { skeleton, default_animation } => {
                let mut v = vec![*skeleton];
                if let Some(anim) = default_animation {
                    v.push(anim.animation);
                }
                v
            }
            Component::BoxCollider { physical_material, .. }
            | Component::CapsuleCollider { physical_material, .. }
            | Component::SphereCollider { physical_material, .. } => vec![physical_material.0],
            Component::MeshCollider { mesh, physical_material } => vec![*mesh, physical_material.0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_mesh_references_its_mesh_and_material() {
        let c = Component::StaticMesh {
            mesh: Guid::new(),
            material_instance: Guid::new(),
            stages: RenderStages::default(),
        };
        assert_eq!(c.referenced_guids().len(), 2);
    }

    #[test]
    fn simple_component_has_no_dependencies() {
        assert!(Component::Simple.referenced_guids().is_empty());
    }
}
