use derive_more::Display;
use serde::{Deserialize, Serialize};

///
/// Operator
///
/// Comparison and history operators of the query language. `Display`
/// renders the surface syntax.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, Hash, PartialEq, Serialize)]
pub enum Operator {
    #[display("=")]
    Equals,
    #[display("!=")]
    NotEquals,
    #[display("~")]
    Like,
    #[display("!~")]
    NotLike,
    #[display(">")]
    GreaterThan,
    #[display(">=")]
    GreaterThanEquals,
    #[display("<")]
    LessThan,
    #[display("<=")]
    LessThanEquals,
    #[display("in")]
    In,
    #[display("not in")]
    NotIn,
    #[display("is")]
    Is,
    #[display("is not")]
    IsNot,
    #[display("was")]
    Was,
    #[display("was not")]
    WasNot,
    #[display("was in")]
    WasIn,
    #[display("was not in")]
    WasNotIn,
    #[display("changed")]
    Changed,

    // history predicate operators
    #[display("after")]
    After,
    #[display("before")]
    Before,
    #[display("during")]
    During,
    #[display("on")]
    On,
    #[display("by")]
    By,
    #[display("from")]
    From,
    #[display("to")]
    To,
}

impl Operator {
    /// Operators that confine a field to the values of its operand.
    /// These are the only operators that can make a project clause
    /// determining.
    #[must_use]
    pub const fn is_confining(self) -> bool {
        matches!(self, Self::Equals | Self::In | Self::Is)
    }
}

///
/// TESTS
///
