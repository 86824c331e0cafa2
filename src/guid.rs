//! Stable asset identity.
//!
//! Every emitted asset carries a 128-bit [`Guid`], either read back from
//! existing metadata (preserving identity across re-compiles) or freshly
//! generated on first compile. The teacher crate already threads
//! `uuid::Uuid` through `AssetStorage`/`Skeleton::id` for exactly this
//! purpose; this module just gives that convention a compile-core-specific
//! name and a couple of helpers the spec's "asset reference" and
//! "type GUID" concepts need.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A 128-bit stable identifier for one emitted asset.
///
/// Serializes as the canonical hyphenated UUID string, matching how the
/// teacher's loaders already read/write UUIDs in JSON-adjacent contexts
/// (`src/assets/storage.rs` keys its `lookup` map on [`Uuid`] directly).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Guid(Uuid);

impl Guid {
    /// The nil GUID, used as a sentinel for "no dependency" / "not yet
    /// assigned" fields before a builder fills them in.
    pub const NIL: Guid = Guid(Uuid::nil());

    /// Generates a fresh random GUID for a newly discovered asset.
    #[must_use]
    pub fn new() -> Self {
        Guid(Uuid::new_v4())
    }

    /// Derives a deterministic GUID from a stable namespace and name.
    ///
    /// Used for the small set of compile-time-known type GUIDs (see
    /// [`TypeGuid`]) so they are identical across process runs without being
    /// hand-typed literals.
    #[must_use]
    pub fn from_name(namespace: &Guid, name: &str) -> Self {
        Guid(Uuid::new_v5(&namespace.0, name.as_bytes()))
    }

    /// Wraps a [`Uuid`] already read back from on-disk metadata.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Guid(uuid)
    }

    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }

    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for Guid {
    fn default() -> Self {
        Guid::NIL
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Guid {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Guid)
    }
}

/// An asset reference: a GUID plus the type GUID of the asset it points at.
///
/// Stored in place of file paths anywhere a hierarchy entry or metadata
/// document references another asset (§3: "never a file path").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetRef {
    pub guid: Guid,
    pub type_guid: TypeGuid,
}

impl AssetRef {
    #[must_use]
    pub fn new(guid: Guid, type_guid: TypeGuid) -> Self {
        Self { guid, type_guid }
    }

    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.guid.is_nil()
    }
}

/// Fixed, compile-time-known GUIDs for each asset/component type the core
/// emits. Derived deterministically via [`Guid::from_name`] from a private
/// namespace so they are stable across builds and readable in metadata
/// dumps without hand-maintaining 16-byte literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeGuid(pub Guid);

macro_rules! type_guids {
    ($namespace:expr; $($name:ident => $label:literal),+ $(,)?) => {
        impl TypeGuid {
            $(
                pub fn $name() -> TypeGuid {
                    TypeGuid(Guid::from_name(&$namespace, $label))
                }
            )+
        }
    };
}

const TYPE_GUID_NAMESPACE: Guid = Guid(Uuid::from_bytes([
    0x9a, 0x1e, 0x4f, 0x02, 0x6c, 0x77, 0x4b, 0x5a, 0x8e, 0x23, 0x1d, 0x0b, 0x5b, 0x77, 0xf4, 0x01,
]));

type_guids! { TYPE_GUID_NAMESPACE;
    point_light => "PointLightComponent",
    directional_light => "DirectionalLightComponent",
    spot_light => "SpotLightComponent",
    camera => "CameraComponent",
    scene => "SceneComponent",
    static_mesh => "StaticMeshComponent",
    skinned_mesh => "SkinnedMeshComponent",
    skeleton_mesh => "SkeletonMeshComponent",
    box_collider => "BoxColliderComponent",
    capsule_collider => "CapsuleColliderComponent",
    sphere_collider => "SphereColliderComponent",
    plane_collider => "InfinitePlaneColliderComponent",
    mesh_collider => "MeshColliderComponent",
    simple => "SimpleComponent",
    transform_3d => "Transform3DComponent",
    render_item => "RenderItemComponent",
    editor_info => "EditorInfoDataComponent",
    physics_body => "PhysicsBodyDataComponent",
    animation_controller => "AnimationControllerDataComponent",
    texture_asset => "TextureAsset",
    mesh_asset => "MeshAsset",
    material_instance_asset => "MaterialInstanceAsset",
    skeleton_asset => "SkeletonAsset",
    mesh_skin_asset => "MeshSkinAsset",
    animation_asset => "AnimationAsset",
    scene_asset => "SceneAsset",
    mesh_scene_asset => "MeshSceneAsset",
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_guids_are_stable_across_calls() {
        assert_eq!(TypeGuid::static_mesh().0, TypeGuid::static_mesh().0);
        assert_ne!(TypeGuid::static_mesh().0, TypeGuid::skinned_mesh().0);
    }

    #[test]
    fn fresh_guids_are_unique() {
        assert_ne!(Guid::new(), Guid::new());
    }

    #[test]
    fn nil_guid_roundtrips() {
        assert_eq!(Guid::NIL.to_string().parse::<Guid>().unwrap(), Guid::NIL);
        assert!(Guid::NIL.is_nil());
    }
}
