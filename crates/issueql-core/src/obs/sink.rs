//! Optimizer sink boundary.
//!
//! Analysis and rewrite code MUST NOT depend on obs::metrics directly.
//! All instrumentation flows through OptimizeEvent and OptimizeSink.
use crate::obs::metrics::{self, OptimizerCounters};
use std::cell::RefCell;

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<*const dyn OptimizeSink>> = const { RefCell::new(None) };
}

///
/// SkipReason
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SkipReason {
    /// The project set of the tree is not statically known.
    Undetermined,

    /// The tree is determined but names no literal project.
    NoProjects,

    /// The query carries no predicate tree.
    NoClause,

    /// The tree is determined but holds no zero-argument call to the target.
    NoTarget,
}

///
/// OptimizeEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OptimizeEvent<'a> {
    Analyzed {
        determined: bool,
        projects: usize,
    },
    Rewritten {
        function: &'a str,
        terminals: usize,
    },
    Skipped {
        function: &'a str,
        reason: SkipReason,
    },
    QueryOptimized {
        changed: bool,
    },
}

///
/// OptimizeSink
///

pub trait OptimizeSink {
    fn record(&self, event: OptimizeEvent<'_>);
}

/// GlobalOptimizeSink
/// Default sink that accumulates into the thread-local counters.
/// Acts as the concrete sink when no scoped override is installed.

pub(crate) struct GlobalOptimizeSink;

impl OptimizeSink for GlobalOptimizeSink {
    fn record(&self, event: OptimizeEvent<'_>) {
        match event {
            OptimizeEvent::Analyzed { determined, .. } => {
                metrics::with_state_mut(|m| {
                    m.analyses = m.analyses.saturating_add(1);
                    if determined {
                        m.determined = m.determined.saturating_add(1);
                    } else {
                        m.undetermined = m.undetermined.saturating_add(1);
                    }
                });
            }

            OptimizeEvent::Rewritten {
                function,
                terminals,
            } => {
                metrics::with_state_mut(|m| {
                    let entry = m.functions.entry(function.to_string()).or_default();
                    entry.rewrites = entry.rewrites.saturating_add(1);
                    entry.terminals_rewritten = entry
                        .terminals_rewritten
                        .saturating_add(u64::try_from(terminals).unwrap_or(u64::MAX));
                });
            }

            OptimizeEvent::Skipped { function, reason } => {
                metrics::with_state_mut(|m| {
                    let entry = m.functions.entry(function.to_string()).or_default();
                    match reason {
                        SkipReason::Undetermined => {
                            entry.skipped_undetermined = entry.skipped_undetermined.saturating_add(1);
                        }
                        SkipReason::NoProjects => {
                            entry.skipped_no_projects = entry.skipped_no_projects.saturating_add(1);
                        }
                        SkipReason::NoClause => {
                            entry.skipped_no_clause = entry.skipped_no_clause.saturating_add(1);
                        }
                        SkipReason::NoTarget => {
                            entry.skipped_no_target = entry.skipped_no_target.saturating_add(1);
                        }
                    }
                });
            }

            OptimizeEvent::QueryOptimized { changed } => {
                metrics::with_state_mut(|m| {
                    m.queries_optimized = m.queries_optimized.saturating_add(1);
                    if changed {
                        m.queries_changed = m.queries_changed.saturating_add(1);
                    }
                });
            }
        }
    }
}

pub(crate) const GLOBAL_OPTIMIZE_SINK: GlobalOptimizeSink = GlobalOptimizeSink;

pub(crate) fn record(event: OptimizeEvent<'_>) {
    let override_ptr = SINK_OVERRIDE.with(|cell| *cell.borrow());
    if let Some(ptr) = override_ptr {
        // SAFETY:
        // Preconditions:
        // - `ptr` was produced from a valid `&dyn OptimizeSink` in `with_optimize_sink`.
        // - `with_optimize_sink` always restores the previous pointer before returning,
        //   including unwind paths via `Guard::drop`.
        // - `record` is synchronous and never stores `ptr` beyond this call.
        //
        // Aliasing:
        // - Only a shared reference is materialized, matching the shared borrow
        //   used to install the override.
        unsafe { (&*ptr).record(event) };
    } else {
        GLOBAL_OPTIMIZE_SINK.record(event);
    }
}

/// Snapshot the optimizer counters of the calling thread.
#[must_use]
pub fn optimizer_report() -> OptimizerCounters {
    metrics::report()
}

/// Reset the optimizer counters of the calling thread.
pub fn optimizer_reset() {
    metrics::reset();
}

/// Run a closure with a temporary sink override on the calling thread.
pub fn with_optimize_sink<T>(sink: &dyn OptimizeSink, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<*const dyn OptimizeSink>);

    impl Drop for Guard {
        fn drop(&mut self) {
            SINK_OVERRIDE.with(|cell| {
                *cell.borrow_mut() = self.0;
            });
        }
    }

    // SAFETY:
    // - `sink_ptr` is installed only for this dynamic scope.
    // - `Guard` restores the previous slot on all exits, including panic.
    // - `record` only dereferences synchronously and never persists `sink_ptr`.
    let sink_ptr =
        unsafe { std::mem::transmute::<&dyn OptimizeSink, *const dyn OptimizeSink>(sink) };
    let prev = SINK_OVERRIDE.with(|cell| cell.borrow_mut().replace(sink_ptr));
    let _guard = Guard(prev);

    f()
}

///
/// TESTS
///
