//! Hierarchy Model (§3, design note "Tagged component union").
//!
//! The engine-neutral tree of typed component records every foreign scene
//! compiles down to, plus its JSON (de)serialization and the coordinate
//! correction applied to every local transform on ingest/export.

pub mod component;
pub mod entry;
pub mod transform;

pub use component::{Component, DefaultAnimationController, PhysicalMaterialRef, PhysicsType, RenderStages};
pub use entry::HierarchyEntry;
pub use transform::{convert_and_adjust_transform, convert_and_adjust_transform_inverse, rotate_90_about_x, LocalTransform};
