//! Scene ingest pipeline (§4.6-§4.10): foreign node traversal, the mesh,
//! skeleton, mesh-skin, and animation builders each node's components route
//! through, the dependency cache that dedups across all of them, the
//! top-level compiler that wires it into a job graph, and the exporter that
//! runs the inverse path back to a foreign scene blob.

pub mod animation_builder;
pub mod compiler;
pub mod dependency_cache;
pub mod exporter;
pub mod materials;
pub mod mesh_builder;
pub mod skeleton_builder;
pub mod skin_builder;
pub mod walker;

pub use compiler::{compile_scene, estimate_job_count, CompiledScene};
pub use dependency_cache::{DependencyCache, ForeignMaterialId, ForeignMeshId, ForeignSkeletonRootId};
pub use exporter::{AssetLoader, ExportState, ForeignNode, SceneExporter};
pub use materials::{default_material_instance_guid, is_default_material_name, resolve_material};
pub use mesh_builder::{build_static_object, RawPrimitive};
pub use skeleton_builder::{build_skeleton, walk_skin_joints, RawJoint};
pub use skin_builder::build_mesh_skin;
pub use walker::{walk_node, HierarchyProcessInfo, INTENSITY_CUTOFF};
