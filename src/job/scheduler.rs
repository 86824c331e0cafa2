//! Multi-threaded job scheduler driving one [`super::graph::JobGraph`].
//!
//! Grounded on the same concurrency primitives the teacher crate already
//! depends on (`flume` channels, `parking_lot` locks — see the teacher's
//! `Cargo.toml`) rather than bare `std::sync::mpsc`/`Mutex`; the scheduler
//! itself has no teacher equivalent (the teacher is a renderer, not a build
//! pipeline), so its shape is grounded directly on §5 of the design notes:
//! a DAG with prerequisite/subsequent edges, explicit priorities, and an
//! `AwaitExternalFinish` suspension protocol that never blocks a worker
//! thread.

use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use super::graph::{JobGraph, JobId};

/// Job priority classes named directly after the design notes (§5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    /// Everything this crate schedules: texture/mesh/skeleton/scene compile
    /// jobs.
    AssetCompilation,
    /// Reserved for callers that interleave compile jobs with renderer
    /// pipeline warm-up; never produced by this crate, but kept so a caller
    /// embedding this scheduler alongside a renderer can rank its own jobs
    /// above or below ours.
    LoadGraphicsPipeline,
}

/// What a job function reports when it returns.
pub enum JobOutcome {
    /// The job is done; its subsequents become eligible to run once every
    /// other prerequisite also finished.
    Finished,
    /// The job failed; `failed_any` is set and subsequents still run (per
    /// §5: "no explicit cancellation... still run to release resources").
    Failed(String),
    /// The job suspended itself pending an external event (GPU fence, async
    /// asset load, nested job batch). It must later be woken with
    /// [`JobRunner::resume`]; until then its subsequents stay blocked.
    AwaitExternalFinish,
}

/// The boxed job body. Takes a [`JobRunner`] so a suspending job can stash
/// the runner handle needed to call `resume` later from another thread.
pub type JobFn = Box<dyn FnOnce(&JobRunner) -> JobOutcome + Send>;

/// Handle workers and suspended jobs use to interact with the scheduler
/// while a job is running or waiting.
#[derive(Clone)]
pub struct JobRunner {
    inner: Arc<Inner>,
}

struct Inner {
    graph: Mutex<JobGraph>,
    ready_tx: flume::Sender<JobId>,
    ready_rx: flume::Receiver<JobId>,
    suspended: Mutex<HashSet<JobId>>,
    failed_any: AtomicBool,
    remaining: AtomicBool, // true while any node is neither finished nor suspended-forever
}

impl JobRunner {
    /// Runs at most one ready job inline on the calling thread, returning
    /// whether one was available. This is the `DoRunNextJob()` pattern: a
    /// job that needs to wait on something calls this in a loop instead of
    /// blocking, so the thread keeps making progress on other work.
    pub fn run_next_job(&self) -> bool {
        let Ok(id) = self.inner.ready_rx.try_recv() else {
            return false;
        };
        self.execute(id);
        true
    }

    /// Blocks briefly (bounded poll, never indefinitely) for readiness,
    /// used by worker threads that have nothing else queued.
    fn wait_for_job(&self, timeout: Duration) -> Option<JobId> {
        self.inner.ready_rx.recv_timeout(timeout).ok()
    }

    /// Wakes a job that previously returned [`JobOutcome::AwaitExternalFinish`],
    /// propagating completion to its subsequents exactly as a normally
    /// finished job would.
    pub fn resume(&self, id: JobId) {
        {
            let mut suspended = self.inner.suspended.lock();
            if !suspended.remove(&id) {
                return;
            }
        }
        self.complete(id);
    }

    /// Marks the shared failure flag; used by a job that wants to report
    /// failure without unwinding (mirrors §7's shared atomic `failedAny`).
    pub fn mark_failed(&self) {
        self.inner.failed_any.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn has_failed(&self) -> bool {
        self.inner.failed_any.load(Ordering::Acquire)
    }

    fn execute(&self, id: JobId) {
        let func = {
            let mut graph = self.inner.graph.lock();
            graph.node_mut(id).and_then(|n| n.func.take())
        };
        let Some(func) = func else { return };

        match func(self) {
            JobOutcome::Finished => self.complete(id),
            JobOutcome::Failed(msg) => {
                log::warn!("compile job failed: {msg}");
                self.inner.failed_any.store(true, Ordering::Release);
                self.complete(id);
            }
            JobOutcome::AwaitExternalFinish => {
                self.inner.suspended.lock().insert(id);
            }
        }
    }

    fn complete(&self, id: JobId) {
        let ready = {
            let graph = self.inner.graph.lock();
            let Some(node) = graph.node(id) else {
                return;
            };
            node.subsequents.clone()
        };

        let mut newly_ready = Vec::new();
        {
            let graph = self.inner.graph.lock();
            for sub in ready {
                let Some(node) = graph.node(sub) else { continue };
                let prev = node
                    .remaining_prerequisites
                    .fetch_sub(1, Ordering::AcqRel);
                if prev == 1 {
                    newly_ready.push(sub);
                }
            }
        }
        for sub in newly_ready {
            let _ = self.inner.ready_tx.send(sub);
        }
    }
}

/// Owns worker threads and a submitted [`JobGraph`]; [`Scheduler::run_to_completion`]
/// blocks the *caller* (never a worker) until every job has finished or
/// suspended forever (which would indicate a programmer error: a suspended
/// job whose resume trigger never fires).
pub struct Scheduler {
    runner: JobRunner,
    workers: Vec<JoinHandle<()>>,
}

impl Scheduler {
    /// Spawns `worker_count` threads and submits `graph`, wiring the
    /// channel so every initially-runnable node (no prerequisites) starts
    /// immediately.
    #[must_use]
    pub fn spawn(mut graph: JobGraph, worker_count: usize) -> Self {
        let (ready_tx, ready_rx) = flume::unbounded();
        let initial = graph.nodes_with_no_prerequisites();

        let inner = Arc::new(Inner {
            graph: Mutex::new(graph),
            ready_tx: ready_tx.clone(),
            ready_rx,
            suspended: Mutex::new(HashSet::new()),
            failed_any: AtomicBool::new(false),
            remaining: AtomicBool::new(true),
        });
        let runner = JobRunner { inner };

        for id in initial {
            let _ = ready_tx.send(id);
        }

        let worker_count = worker_count.max(1);
        let workers = (0..worker_count)
            .map(|_| {
                let runner = runner.clone();
                std::thread::spawn(move || loop {
                    match runner.wait_for_job(Duration::from_millis(50)) {
                        Some(id) => runner.execute(id),
                        None => {
                            if runner.inner.graph.lock().is_empty()
                                && runner.inner.suspended.lock().is_empty()
                            {
                                break;
                            }
                        }
                    }
                })
            })
            .collect();

        Self { runner, workers }
    }

    #[must_use]
    pub fn runner(&self) -> JobRunner {
        self.runner.clone()
    }

    /// Waits for every worker thread to exit (i.e. the ready queue drained
    /// and stayed empty). Returns whether any job reported failure.
    pub fn join(self) -> bool {
        for worker in self.workers {
            let _ = worker.join();
        }
        self.runner.has_failed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::graph::JobGraph;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn prerequisite_ordering_is_respected() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut graph = JobGraph::new();

        let order_a = order.clone();
        let a = graph.push(
            "a",
            Priority::AssetCompilation,
            Box::new(move |_| {
                order_a.lock().push('a');
                JobOutcome::Finished
            }),
        );
        let order_b = order.clone();
        let b = graph.push(
            "b",
            Priority::AssetCompilation,
            Box::new(move |_| {
                order_b.lock().push('b');
                JobOutcome::Finished
            }),
        );
        graph.add_prerequisite(b, a);

        let scheduler = Scheduler::spawn(graph, 2);
        scheduler.join();

        assert_eq!(*order.lock(), vec!['a', 'b']);
    }

    #[test]
    fn await_external_finish_blocks_subsequents_until_resumed() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut graph = JobGraph::new();

        let suspend_runner: Arc<Mutex<Option<JobRunner>>> = Arc::new(Mutex::new(None));
        let captured = suspend_runner.clone();
        let suspending = graph.push(
            "suspend",
            Priority::AssetCompilation,
            Box::new(move |runner| {
                *captured.lock() = Some(runner.clone());
                JobOutcome::AwaitExternalFinish
            }),
        );
        let counter_clone = counter.clone();
        let dependent = graph.push(
            "dependent",
            Priority::AssetCompilation,
            Box::new(move |_| {
                counter_clone.fetch_add(1, Ordering::SeqCst);
                JobOutcome::Finished
            }),
        );
        graph.add_prerequisite(dependent, suspending);

        let scheduler = Scheduler::spawn(graph, 2);
        let runner = scheduler.runner();

        // Give the worker pool a moment to hit the suspend point.
        for _ in 0..200 {
            if suspend_runner.lock().is_some() {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        runner.resume(suspending);
        scheduler.join();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
