//! Core of IssueQL: the search predicate tree, project-determinism analysis,
//! and the version-function rewrites that bind a query's projects into
//! `releasedVersions()` / `unreleasedVersions()` calls.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod error;
pub mod obs;
pub mod optimize;
pub mod query;

pub use issueql_config::{
    ConfigError, OptimizerConfig, PROJECT_FIELD, RELEASED_VERSIONS_FUNCTION, TraversalPolicy,
    UNRELEASED_VERSIONS_FUNCTION,
};

///
/// Prelude
///
/// Tree vocabulary and the optimizer entry points.
///

pub mod prelude {
    pub use crate::{
        optimize::{QueryOptimizationService, QueryOptimizer, optimize_query},
        query::{Clause, Operand, Operator, Query},
    };
}
