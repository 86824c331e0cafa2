//! Job graph & scheduler (§5).
//!
//! A compile session builds a [`graph::JobGraph`] while walking a foreign
//! scene or a single texture, then hands it to a [`scheduler::Scheduler`]
//! which runs it to completion across a fixed worker pool. See the module
//! docs on each submodule for the grounding of specific choices.

pub mod graph;
pub mod scheduler;

pub use graph::{JobGraph, JobId};
pub use scheduler::{JobFn, JobOutcome, JobRunner, Priority, Scheduler};
