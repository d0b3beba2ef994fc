use issueql_config::ConfigError;
use std::fmt;
use thiserror::Error as ThisError;

///
/// Error
///
/// Crate-level error. Analysis and rewriting are total and never fail; only
/// model construction and configuration loading can.
///

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

///
/// ModelError
///
/// Construction-time rejection of a malformed clause or operand.
/// Malformed trees never reach the optimizer.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ModelError {
    #[error("multi-value operand requires at least one value")]
    EmptyMultiOperand,

    #[error("{kind} clause requires at least one child")]
    EmptyJunction { kind: JunctionKind },

    #[error("history predicate conjunction requires at least one predicate")]
    EmptyHistoryPredicate,

    #[error("function operand requires a name")]
    EmptyFunctionName,
}

///
/// JunctionKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum JunctionKind {
    And,
    Or,
}

impl fmt::Display for JunctionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::And => "AND",
            Self::Or => "OR",
        };
        write!(f, "{label}")
    }
}
