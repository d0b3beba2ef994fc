//! Search query model: the predicate tree, its operands, and the query
//! envelope that carries the tree alongside ordering.

mod clause;
mod history;
mod operand;
mod operator;

pub use clause::{
    AndClause, ChangedClause, Clause, ClauseVisitor, NotClause, OrClause, TerminalClause,
    WasClause,
};
pub use history::{HistoryConjunction, HistoryPredicate};
pub use operand::{FunctionOperand, Literal, MultiOperand, Operand, OperandVisitor};
pub use operator::Operator;

use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};

///
/// Query
///
/// A parsed search: an optional predicate tree plus the attributes that
/// travel with it. Optimization only ever replaces `where_clause`.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Query {
    where_clause: Option<Arc<Clause>>,
    order_by: Option<OrderBy>,
    query_string: Option<String>,
}

impl Query {
    #[must_use]
    pub const fn new(where_clause: Option<Arc<Clause>>, order_by: Option<OrderBy>) -> Self {
        Self {
            where_clause,
            order_by,
            query_string: None,
        }
    }

    /// Query over `clause` with no ordering.
    #[must_use]
    pub fn with_clause(clause: impl Into<Arc<Clause>>) -> Self {
        Self {
            where_clause: Some(clause.into()),
            order_by: None,
            query_string: None,
        }
    }

    /// Attach the source text the query was parsed from.
    #[must_use]
    pub fn with_query_string(mut self, query_string: impl Into<String>) -> Self {
        self.query_string = Some(query_string.into());
        self
    }

    #[must_use]
    pub const fn where_clause(&self) -> Option<&Arc<Clause>> {
        self.where_clause.as_ref()
    }

    #[must_use]
    pub const fn order_by(&self) -> Option<&OrderBy> {
        self.order_by.as_ref()
    }

    #[must_use]
    pub fn query_string(&self) -> Option<&str> {
        self.query_string.as_deref()
    }

    /// Same query with its predicate tree replaced; every other attribute
    /// is carried over unchanged.
    #[must_use]
    pub fn replace_where_clause(&self, where_clause: Option<Arc<Clause>>) -> Self {
        Self {
            where_clause,
            order_by: self.order_by.clone(),
            query_string: self.query_string.clone(),
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.where_clause, &self.order_by) {
            (Some(clause), Some(order_by)) => write!(f, "{clause} {order_by}"),
            (Some(clause), None) => write!(f, "{clause}"),
            (None, Some(order_by)) => write!(f, "{order_by}"),
            (None, None) => Ok(()),
        }
    }
}

///
/// OrderBy
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct OrderBy {
    sorts: Vec<SearchSort>,
}

impl OrderBy {
    #[must_use]
    pub fn new(sorts: impl IntoIterator<Item = SearchSort>) -> Self {
        Self {
            sorts: sorts.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn sorts(&self) -> &[SearchSort] {
        &self.sorts
    }
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ORDER BY")?;
        for (i, sort) in self.sorts.iter().enumerate() {
            f.write_str(if i == 0 { " " } else { ", " })?;
            write!(f, "{sort}")?;
        }

        Ok(())
    }
}

///
/// SearchSort
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SearchSort {
    pub field: String,
    pub order: Option<SortOrder>,
}

impl SearchSort {
    #[must_use]
    pub fn new(field: impl Into<String>, order: Option<SortOrder>) -> Self {
        Self {
            field: field.into(),
            order,
        }
    }
}

impl fmt::Display for SearchSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.order {
            Some(order) => write!(f, "{} {order}", self.field),
            None => write!(f, "{}", self.field),
        }
    }
}

///
/// SortOrder
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
pub enum SortOrder {
    #[display("ASC")]
    Asc,
    #[display("DESC")]
    Desc,
}

///
/// TESTS
///
