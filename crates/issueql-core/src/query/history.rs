use crate::{
    error::ModelError,
    query::{operand::Operand, operator::Operator},
};
use serde::{Deserialize, Serialize};
use std::fmt;

///
/// HistoryPredicate
///
/// Qualifier on a `was` / `changed` clause, e.g. `after "2024/01/01" by bob`.
/// Carried through optimization untouched.
///

#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum HistoryPredicate {
    Terminal { operator: Operator, operand: Operand },
    And(HistoryConjunction),
}

impl HistoryPredicate {
    #[must_use]
    pub const fn terminal(operator: Operator, operand: Operand) -> Self {
        Self::Terminal { operator, operand }
    }

    pub fn and(predicates: impl IntoIterator<Item = Self>) -> Result<Self, ModelError> {
        HistoryConjunction::new(predicates).map(Self::And)
    }
}

impl fmt::Display for HistoryPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Terminal { operator, operand } => write!(f, "{operator} {operand}"),
            Self::And(conjunction) => write!(f, "{conjunction}"),
        }
    }
}

///
/// HistoryConjunction
///
/// Non-empty list of history predicates that must all hold.
///

#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(try_from = "Vec<HistoryPredicate>", into = "Vec<HistoryPredicate>")]
pub struct HistoryConjunction {
    predicates: Vec<HistoryPredicate>,
}

impl HistoryConjunction {
    pub fn new(predicates: impl IntoIterator<Item = HistoryPredicate>) -> Result<Self, ModelError> {
        let predicates: Vec<_> = predicates.into_iter().collect();
        if predicates.is_empty() {
            return Err(ModelError::EmptyHistoryPredicate);
        }

        Ok(Self { predicates })
    }

    #[must_use]
    pub fn predicates(&self) -> &[HistoryPredicate] {
        &self.predicates
    }
}

impl TryFrom<Vec<HistoryPredicate>> for HistoryConjunction {
    type Error = ModelError;

    fn try_from(predicates: Vec<HistoryPredicate>) -> Result<Self, Self::Error> {
        Self::new(predicates)
    }
}

impl From<HistoryConjunction> for Vec<HistoryPredicate> {
    fn from(conjunction: HistoryConjunction) -> Self {
        conjunction.predicates
    }
}

impl fmt::Display for HistoryConjunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, predicate) in self.predicates.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{predicate}")?;
        }

        Ok(())
    }
}
