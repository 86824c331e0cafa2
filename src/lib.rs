//! Asset Compilation Core: a parallel, dependency-aware asset build
//! pipeline that ingests foreign 3D scene/texture source formats and emits
//! engine-native metadata JSON plus binary blobs.
//!
//! The crate is organized leaf-first, mirroring the component table in the
//! design: [`codec`] hides every third-party library behind a thin adapter,
//! [`texture`] is the Texture Compilation Engine (format policy, pixel
//! classification, block compression, mip generation, and the
//! GPU-backed cubemap/IBL prefilter behind the `ibl` feature), [`hierarchy`]
//! is the engine-neutral scene tree and its JSON (de)serialization,
//! [`scene`] is the Scene/Mesh Ingest Pipeline (walker, per-kind builders,
//! the dependency cache, the top-level compiler, and the inverse exporter),
//! and [`job`] is the parallel job graph/scheduler the other modules build
//! against. [`plugin`] is the extension-keyed boundary callers use instead
//! of reaching into `scene`/`texture` directly.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod codec;
pub mod errors;
pub mod guid;
pub mod hierarchy;
pub mod job;
pub mod mesh;
pub mod mesh_skin;
pub mod plugin;
pub mod scene;
pub mod skeleton;
pub mod texture;

pub use errors::{CompileError, Result};
pub use guid::{AssetRef, Guid, TypeGuid};
pub use hierarchy::{Component, HierarchyEntry, LocalTransform};
pub use job::{JobGraph, JobId, Priority, Scheduler};
pub use mesh::StaticObject;
pub use mesh_skin::MeshSkin;
pub use plugin::{AssetCompilerPlugin, CompileOutput, PluginRegistry};
pub use scene::{compile_scene, CompiledScene};
pub use skeleton::Skeleton;
pub use texture::{compressor, TextureAssetMetadata, TexturePreset};
