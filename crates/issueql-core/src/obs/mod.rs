//! Observability: optimizer counters and the sink abstraction they flow
//! through.
//!
//! Optimizer logic never touches counter state directly; it emits
//! `OptimizeEvent`s via `sink::record`.

pub(crate) mod metrics;
pub(crate) mod sink;

// re-exports
pub use metrics::{FunctionCounters, OptimizerCounters};
pub use sink::{
    OptimizeEvent, OptimizeSink, SkipReason, optimizer_report, optimizer_reset, with_optimize_sink,
};
