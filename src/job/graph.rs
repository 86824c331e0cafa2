//! The prerequisite/subsequent DAG a compile session builds up before
//! handing it to the [`super::scheduler::Scheduler`].
//!
//! Nodes are added with [`JobGraph::push`] and wired together with
//! [`JobGraph::add_prerequisite`] (mirrors the design note's
//! `AddSubsequentStage`, named from the consumer's point of view here since
//! that's how a `Scene Compiler` actually builds the graph: it knows a
//! node's prerequisites before it knows who depends on it).

use slotmap::{new_key_type, SlotMap};
use std::sync::atomic::{AtomicUsize, Ordering};

use super::scheduler::{JobFn, Priority};

new_key_type! {
    /// Stable handle to one node in a [`JobGraph`].
    pub struct JobId;
}

pub(super) struct JobNode {
    pub(super) func: Option<JobFn>,
    pub(super) priority: Priority,
    pub(super) label: &'static str,
    /// Number of prerequisites not yet finished. A node becomes runnable
    /// when this hits zero.
    pub(super) remaining_prerequisites: AtomicUsize,
    pub(super) subsequents: Vec<JobId>,
}

/// An immutable-once-built DAG of compile jobs.
///
/// Built incrementally during a scene walk (§4.6: `jobsToQueue` /
/// `jobDependencies`), then submitted whole to the [`super::scheduler::Scheduler`].
#[derive(Default)]
pub struct JobGraph {
    nodes: SlotMap<JobId, JobNode>,
}

impl JobGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new job with no prerequisites yet. Returns its id so
    /// callers can wire up `add_prerequisite` edges afterward.
    pub fn push(&mut self, label: &'static str, priority: Priority, func: JobFn) -> JobId {
        self.nodes.insert(JobNode {
            func: Some(func),
            priority,
            label,
            remaining_prerequisites: AtomicUsize::new(0),
            subsequents: Vec::new(),
        })
    }

    /// Declares that `subsequent` must not run until `prerequisite` has
    /// finished. Mirrors §5's "first-lookup-wins ... chain dependencies
    /// onto the first job" ordering guarantee.
    pub fn add_prerequisite(&mut self, subsequent: JobId, prerequisite: JobId) {
        if let Some(pre) = self.nodes.get_mut(prerequisite) {
            pre.subsequents.push(subsequent);
        }
        if let Some(sub) = self.nodes.get_mut(subsequent) {
            *sub.remaining_prerequisites.get_mut() += 1;
        }
    }

    pub(super) fn nodes_with_no_prerequisites(&self) -> Vec<JobId> {
        self.nodes
            .iter()
            .filter(|(_, n)| n.remaining_prerequisites.load(Ordering::Acquire) == 0)
            .map(|(id, _)| id)
            .collect()
    }

    pub(super) fn node_mut(&mut self, id: JobId) -> Option<&mut JobNode> {
        self.nodes.get_mut(id)
    }

    pub(super) fn node(&self, id: JobId) -> Option<&JobNode> {
        self.nodes.get(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
