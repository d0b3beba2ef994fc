//! Query optimization: project-determinism analysis and the function
//! rewrites built on it.
//!
//! Every pass is a pure function from one immutable tree to another, so a
//! single tree may be optimized from any number of threads at once.

mod determinism;
mod pipeline;
mod rewrite;

#[cfg(test)]
mod tests;

pub use determinism::{DeterminedProjects, ProjectAnalyzer};
pub use pipeline::QueryOptimizationService;
pub use rewrite::FunctionRewrite;

use crate::query::Query;

///
/// QueryOptimizer
///
/// A single semantics-preserving pass over a query. Implementations must
/// leave every attribute other than the predicate tree untouched.
///

pub trait QueryOptimizer: Send + Sync {
    /// Stable identifier used in diagnostics.
    fn name(&self) -> &str;

    fn optimize(&self, query: &Query) -> Query;
}

/// Optimize `query` with the default pipeline.
///
/// `None` in, `None` out.
#[must_use]
pub fn optimize_query(query: Option<&Query>) -> Option<Query> {
    QueryOptimizationService::default().optimize_query(query)
}
