//! Asset Dependency Cache (§3 "Queued* Maps", §4.6), confined to one
//! [`super::walker::HierarchyProcessInfo`] and destroyed with the compile
//! session (§3 "Lifecycle").
//!
//! The spec keys every map on "foreign-pointer identity" (design note
//! "Foreign-pointer dedup keys"). The `gltf` crate's document model is
//! index-based rather than pointer-based, but a glTF node/mesh/material's
//! index is stable for the lifetime of one `gltf::Document` — exactly the
//! "preserve the adapter's object identity explicitly" option the design
//! note calls out as equivalent to a raw pointer, so that's what every
//! `Foreign*Id` newtype here wraps.

use std::path::PathBuf;

use rustc_hash::FxHashMap;

use crate::guid::Guid;
use crate::job::JobId;
use crate::skeleton::JointEntry;

/// Stable identity of a foreign glTF material within one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ForeignMaterialId(pub usize);

/// Stable identity of a foreign glTF mesh within one document. A glTF
/// "mesh" is itself a list of primitives sharing one node; the spec's
/// "foreign mesh pointer" maps onto this directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ForeignMeshId(pub usize);

/// Stable identity of a foreign skeleton root node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ForeignSkeletonRootId(pub usize);

/// First-lookup-wins cache entry for a compiled material instance.
#[derive(Debug, Clone)]
pub struct MaterialCacheEntry {
    pub material_instance_guid: Guid,
    pub save_job: JobId,
}

/// First-lookup-wins cache entry for a compiled texture.
#[derive(Debug, Clone)]
pub struct TextureCacheEntry {
    pub metadata_path: PathBuf,
    pub compile_job: JobId,
}

/// First-lookup-wins cache entry for a compiled mesh.
#[derive(Debug, Clone)]
pub struct MeshCacheEntry {
    pub mesh_name: String,
    pub metadata_path: PathBuf,
    pub mesh_guid: Guid,
    pub material_guid: Guid,
    pub skin_guid: Option<Guid>,
    pub skeleton_guid: Option<Guid>,
    pub default_animation_guid: Option<Guid>,
    pub compile_job: JobId,
}

/// First-lookup-wins cache entry for a compiled skeleton.
#[derive(Debug, Clone)]
pub struct SkeletonCacheEntry {
    pub skeleton_guid: Guid,
    pub default_animation_guid: Option<Guid>,
    pub joint_names: Vec<String>,
    pub joint_index_map: FxHashMap<String, JointEntry>,
    pub char_count: usize,
    pub joint_count: usize,
    pub build_job: JobId,
}

/// First-lookup-wins cache entry for a mesh's skin binding.
#[derive(Debug, Clone, Copy)]
pub struct MeshSkinCacheEntry {
    pub mesh_skin_guid: Guid,
    pub build_job: JobId,
}

/// The six `Queued*` maps (§3), all keyed on foreign-object identity within
/// one compile session and cleared when the session (one top-level
/// `Compile` call) ends.
#[derive(Default)]
pub struct DependencyCache {
    materials: FxHashMap<ForeignMaterialId, MaterialCacheEntry>,
    textures: FxHashMap<PathBuf, TextureCacheEntry>,
    meshes: FxHashMap<ForeignMeshId, MeshCacheEntry>,
    skeletons: FxHashMap<ForeignSkeletonRootId, SkeletonCacheEntry>,
    mesh_skins: FxHashMap<ForeignMeshId, MeshSkinCacheEntry>,
    /// `mesh_name -> scene_guid`, for combined multi-material meshes
    /// (§3: "for combined multi-material meshes").
    combined_mesh_scenes: FxHashMap<String, Guid>,
}

/// Either a freshly inserted entry (caller must queue the compile job) or
/// an existing one to chain a dependency onto (§5: "first-lookup-wins ...
/// chain dependencies onto the first job").
pub enum Lookup<T> {
    Fresh,
    Cached(T),
}

impl DependencyCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup_material(&mut self, id: ForeignMaterialId) -> Option<MaterialCacheEntry> {
        self.materials.get(&id).cloned()
    }

    pub fn insert_material(&mut self, id: ForeignMaterialId, entry: MaterialCacheEntry) {
        self.materials.entry(id).or_insert(entry);
    }

    pub fn lookup_texture(&mut self, path: &std::path::Path) -> Option<TextureCacheEntry> {
        self.textures.get(path).cloned()
    }

    pub fn insert_texture(&mut self, path: PathBuf, entry: TextureCacheEntry) {
        self.textures.entry(path).or_insert(entry);
    }

    pub fn lookup_mesh(&mut self, id: ForeignMeshId) -> Option<MeshCacheEntry> {
        self.meshes.get(&id).cloned()
    }

    pub fn insert_mesh(&mut self, id: ForeignMeshId, entry: MeshCacheEntry) {
        self.meshes.entry(id).or_insert(entry);
    }

    pub fn lookup_skeleton(&mut self, id: ForeignSkeletonRootId) -> Option<SkeletonCacheEntry> {
        self.skeletons.get(&id).cloned()
    }

    pub fn insert_skeleton(&mut self, id: ForeignSkeletonRootId, entry: SkeletonCacheEntry) {
        self.skeletons.entry(id).or_insert(entry);
    }

    pub fn lookup_mesh_skin(&mut self, id: ForeignMeshId) -> Option<MeshSkinCacheEntry> {
        self.mesh_skins.get(&id).copied()
    }

    pub fn insert_mesh_skin(&mut self, id: ForeignMeshId, entry: MeshSkinCacheEntry) {
        self.mesh_skins.entry(id).or_insert(entry);
    }

    pub fn lookup_combined_mesh_scene(&self, mesh_name: &str) -> Option<Guid> {
        self.combined_mesh_scenes.get(mesh_name).copied()
    }

    pub fn insert_combined_mesh_scene(&mut self, mesh_name: String, scene_guid: Guid) {
        self.combined_mesh_scenes.entry(mesh_name).or_insert(scene_guid);
    }

    /// Picks a non-colliding metadata path for a mesh by appending `-N`
    /// starting at `N=2` until no already-queued mesh uses it (§4.6
    /// "Naming collision").
    #[must_use]
    pub fn unique_mesh_metadata_path(&self, candidate: &std::path::Path) -> PathBuf {
        let already_used = |p: &std::path::Path| self.meshes.values().any(|m| m.metadata_path == p);
        if !already_used(candidate) {
            return candidate.to_path_buf();
        }
        let stem = candidate.file_stem().and_then(|s| s.to_str()).unwrap_or("asset");
        let ext = candidate.extension().and_then(|s| s.to_str());
        let dir = candidate.parent().unwrap_or_else(|| std::path::Path::new(""));

        let mut n = 2;
        loop {
            let name = match ext {
                Some(ext) => format!("{stem}-{n}.{ext}"),
                None => format!("{stem}-{n}"),
            };
            let candidate = dir.join(name);
            if !already_used(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_insert_wins_on_repeated_lookup() {
        let mut cache = DependencyCache::new();
        let id = ForeignMaterialId(3);
        let guid = Guid::new();
        cache.insert_material(id, MaterialCacheEntry { material_instance_guid: guid, save_job: JobId::default() });
        cache.insert_material(id, MaterialCacheEntry { material_instance_guid: Guid::new(), save_job: JobId::default() });

        assert_eq!(cache.lookup_material(id).unwrap().material_instance_guid, guid);
    }

    #[test]
    fn naming_collision_appends_suffix() {
        let mut cache = DependencyCache::new();
        let path = PathBuf::from("/assets/Cube.mesh");
        cache.insert_mesh(
            ForeignMeshId(0),
            MeshCacheEntry {
                mesh_name: "Cube".into(),
                metadata_path: path.clone(),
                mesh_guid: Guid::new(),
                material_guid: Guid::new(),
                skin_guid: None,
                skeleton_guid: None,
                default_animation_guid: None,
                compile_job: JobId::default(),
            },
        );
        let unique = cache.unique_mesh_metadata_path(&path);
        assert_eq!(unique, PathBuf::from("/assets/Cube-2.mesh"));
    }
}
