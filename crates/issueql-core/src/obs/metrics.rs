use serde::{Deserialize, Serialize};
use std::{cell::RefCell, collections::BTreeMap};

///
/// OptimizerCounters
/// Ephemeral, in-memory counters for optimizer activity on this thread.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct OptimizerCounters {
    // Pipeline entrypoint
    pub queries_optimized: u64,
    pub queries_changed: u64,

    // Determinism analysis
    pub analyses: u64,
    pub determined: u64,
    pub undetermined: u64,

    // Per rewrite pass, keyed by target function name
    pub functions: BTreeMap<String, FunctionCounters>,
}

///
/// FunctionCounters
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct FunctionCounters {
    pub rewrites: u64,
    pub terminals_rewritten: u64,
    pub skipped_undetermined: u64,
    pub skipped_no_projects: u64,
    pub skipped_no_clause: u64,
    pub skipped_no_target: u64,
}

thread_local! {
    static COUNTERS: RefCell<OptimizerCounters> = RefCell::new(OptimizerCounters::default());
}

/// Borrow counters immutably.
pub(crate) fn with_state<R>(f: impl FnOnce(&OptimizerCounters) -> R) -> R {
    COUNTERS.with(|m| f(&m.borrow()))
}

/// Borrow counters mutably.
pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut OptimizerCounters) -> R) -> R {
    COUNTERS.with(|m| f(&mut m.borrow_mut()))
}

/// Snapshot of the current counters.
#[must_use]
pub(crate) fn report() -> OptimizerCounters {
    with_state(OptimizerCounters::clone)
}

/// Reset all counters (useful in tests).
pub(crate) fn reset() {
    with_state_mut(|m| *m = OptimizerCounters::default());
}
