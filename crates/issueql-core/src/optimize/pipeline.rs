use crate::{
    error::Error,
    obs::sink::{self, OptimizeEvent},
    optimize::{FunctionRewrite, ProjectAnalyzer, QueryOptimizer},
    query::Query,
};
use issueql_config::OptimizerConfig;
use std::{fmt, sync::Arc};

///
/// QueryOptimizationService
///
/// Ordered chain of optimizer passes. Each pass receives the previous pass's
/// output; passes run in the order they were configured.
///
/// The default chain binds `releasedVersions()` first and
/// `unreleasedVersions()` second.
///

pub struct QueryOptimizationService {
    optimizers: Vec<Box<dyn QueryOptimizer>>,
}

impl QueryOptimizationService {
    /// One [`FunctionRewrite`] per configured function, in config order.
    #[must_use]
    pub fn new(config: &OptimizerConfig) -> Self {
        let analyzer = ProjectAnalyzer::new(config);
        let optimizers = config
            .rewrite_functions
            .iter()
            .map(|function| {
                Box::new(FunctionRewrite::new(function.as_str(), analyzer.clone()))
                    as Box<dyn QueryOptimizer>
            })
            .collect();

        Self { optimizers }
    }

    /// Build from a TOML document; see [`OptimizerConfig`].
    pub fn from_toml_str(source: &str) -> Result<Self, Error> {
        let config = OptimizerConfig::from_toml_str(source)?;

        Ok(Self::new(&config))
    }

    /// Chain arbitrary passes, applied in iteration order.
    #[must_use]
    pub fn with_optimizers(optimizers: impl IntoIterator<Item = Box<dyn QueryOptimizer>>) -> Self {
        Self {
            optimizers: optimizers.into_iter().collect(),
        }
    }

    /// Names of the configured passes, in application order.
    pub fn pass_names(&self) -> impl Iterator<Item = &str> {
        self.optimizers.iter().map(|optimizer| optimizer.name())
    }

    /// Run every pass over `query`.
    ///
    /// The result shares its predicate tree with `query` when no pass
    /// changed anything.
    #[must_use]
    pub fn optimize(&self, query: &Query) -> Query {
        let optimized = self
            .optimizers
            .iter()
            .fold(query.clone(), |current, optimizer| {
                optimizer.optimize(&current)
            });

        let changed = match (query.where_clause(), optimized.where_clause()) {
            (Some(before), Some(after)) => !Arc::ptr_eq(before, after),
            (None, None) => false,
            _ => true,
        };
        sink::record(OptimizeEvent::QueryOptimized { changed });

        optimized
    }

    /// `None` in, `None` out; otherwise [`Self::optimize`].
    #[must_use]
    pub fn optimize_query(&self, query: Option<&Query>) -> Option<Query> {
        query.map(|query| self.optimize(query))
    }
}

impl Default for QueryOptimizationService {
    fn default() -> Self {
        Self::new(&OptimizerConfig::default())
    }
}

impl fmt::Debug for QueryOptimizationService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.pass_names()).finish()
    }
}

///
/// TESTS
///
