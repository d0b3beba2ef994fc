use crate::{
    error::{JunctionKind, ModelError},
    query::{history::HistoryPredicate, operand::Operand, operator::Operator},
};
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    ops::{BitAnd, BitOr, Not},
    sync::Arc,
};

///
/// Clause
///
/// Node of the search predicate tree.
///
/// Nodes are immutable values. Compound nodes hold their children behind
/// `Arc`, so rewritten trees share every untouched subtree with the tree
/// they were derived from and any number of threads may read one tree at
/// once. Equality and hashing are structural.
///

#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Clause {
    Terminal(TerminalClause),
    And(AndClause),
    Or(OrClause),
    Not(NotClause),
    Was(WasClause),
    Changed(ChangedClause),
}

impl Clause {
    #[must_use]
    pub fn terminal(field: impl Into<String>, operator: Operator, operand: Operand) -> Self {
        Self::Terminal(TerminalClause::new(field, operator, operand))
    }

    pub fn and<I, C>(children: I) -> Result<Self, ModelError>
    where
        I: IntoIterator<Item = C>,
        C: Into<Arc<Self>>,
    {
        AndClause::new(children).map(Self::And)
    }

    pub fn or<I, C>(children: I) -> Result<Self, ModelError>
    where
        I: IntoIterator<Item = C>,
        C: Into<Arc<Self>>,
    {
        OrClause::new(children).map(Self::Or)
    }

    #[allow(clippy::should_implement_trait)]
    #[must_use]
    pub fn not(child: impl Into<Arc<Self>>) -> Self {
        Self::Not(NotClause::new(child))
    }

    /// Double dispatch into `visitor` on this clause's variant.
    pub fn accept<V: ClauseVisitor + ?Sized>(&self, visitor: &mut V) -> V::Output {
        match self {
            Self::Terminal(clause) => visitor.visit_terminal(clause),
            Self::And(clause) => visitor.visit_and(clause),
            Self::Or(clause) => visitor.visit_or(clause),
            Self::Not(clause) => visitor.visit_not(clause),
            Self::Was(clause) => visitor.visit_was(clause),
            Self::Changed(clause) => visitor.visit_changed(clause),
        }
    }

    const fn is_junction(&self) -> bool {
        matches!(self, Self::And(_) | Self::Or(_))
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Terminal(clause) => write!(f, "{clause}"),
            Self::And(clause) => write!(f, "{clause}"),
            Self::Or(clause) => write!(f, "{clause}"),
            Self::Not(clause) => write!(f, "{clause}"),
            Self::Was(clause) => write!(f, "{clause}"),
            Self::Changed(clause) => write!(f, "{clause}"),
        }
    }
}

impl BitAnd for Clause {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        Self::And(AndClause {
            children: vec![Arc::new(self), Arc::new(rhs)],
        })
    }
}

impl BitOr for Clause {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self::Or(OrClause {
            children: vec![Arc::new(self), Arc::new(rhs)],
        })
    }
}

impl Not for Clause {
    type Output = Self;

    fn not(self) -> Self::Output {
        Self::Not(NotClause::new(self))
    }
}

///
/// ClauseVisitor
///
/// One required method per clause variant and no default methods, so a new
/// variant must be handled by every visitor before the crate compiles.
///

pub trait ClauseVisitor {
    type Output;

    fn visit_terminal(&mut self, clause: &TerminalClause) -> Self::Output;
    fn visit_and(&mut self, clause: &AndClause) -> Self::Output;
    fn visit_or(&mut self, clause: &OrClause) -> Self::Output;
    fn visit_not(&mut self, clause: &NotClause) -> Self::Output;
    fn visit_was(&mut self, clause: &WasClause) -> Self::Output;
    fn visit_changed(&mut self, clause: &ChangedClause) -> Self::Output;
}

///
/// TerminalClause
///
/// `field operator operand`
///

#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct TerminalClause {
    field: String,
    operator: Operator,
    operand: Operand,
}

impl TerminalClause {
    #[must_use]
    pub fn new(field: impl Into<String>, operator: Operator, operand: Operand) -> Self {
        Self {
            field: field.into(),
            operator,
            operand,
        }
    }

    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    #[must_use]
    pub const fn operator(&self) -> Operator {
        self.operator
    }

    #[must_use]
    pub const fn operand(&self) -> &Operand {
        &self.operand
    }

    /// Same field and operator over a different operand.
    #[must_use]
    pub fn with_operand(&self, operand: Operand) -> Self {
        Self {
            field: self.field.clone(),
            operator: self.operator,
            operand,
        }
    }
}

impl fmt::Display for TerminalClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.field, self.operator, self.operand)
    }
}

///
/// AndClause
///

#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(try_from = "Vec<Arc<Clause>>", into = "Vec<Arc<Clause>>")]
pub struct AndClause {
    children: Vec<Arc<Clause>>,
}

impl AndClause {
    pub fn new<I, C>(children: I) -> Result<Self, ModelError>
    where
        I: IntoIterator<Item = C>,
        C: Into<Arc<Clause>>,
    {
        collect_children(children, JunctionKind::And).map(|children| Self { children })
    }

    #[must_use]
    pub fn children(&self) -> &[Arc<Clause>] {
        &self.children
    }

    /// Rebuild with every child passed through `f`.
    /// Returns `None` when `f` hands back every child unchanged.
    pub(crate) fn map_children(
        &self,
        f: impl FnMut(&Arc<Clause>) -> Arc<Clause>,
    ) -> Option<Self> {
        map_children(&self.children, f).map(|children| Self { children })
    }
}

impl TryFrom<Vec<Arc<Clause>>> for AndClause {
    type Error = ModelError;

    fn try_from(children: Vec<Arc<Clause>>) -> Result<Self, Self::Error> {
        Self::new(children)
    }
}

impl From<AndClause> for Vec<Arc<Clause>> {
    fn from(clause: AndClause) -> Self {
        clause.children
    }
}

impl fmt::Display for AndClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, child) in self.children.iter().enumerate() {
            if i > 0 {
                f.write_str(" AND ")?;
            }
            // AND binds tighter than OR
            if matches!(child.as_ref(), Clause::Or(_)) {
                write!(f, "({child})")?;
            } else {
                write!(f, "{child}")?;
            }
        }

        Ok(())
    }
}

///
/// OrClause
///

#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(try_from = "Vec<Arc<Clause>>", into = "Vec<Arc<Clause>>")]
pub struct OrClause {
    children: Vec<Arc<Clause>>,
}

impl OrClause {
    pub fn new<I, C>(children: I) -> Result<Self, ModelError>
    where
        I: IntoIterator<Item = C>,
        C: Into<Arc<Clause>>,
    {
        collect_children(children, JunctionKind::Or).map(|children| Self { children })
    }

    #[must_use]
    pub fn children(&self) -> &[Arc<Clause>] {
        &self.children
    }

    /// Rebuild with every child passed through `f`.
    /// Returns `None` when `f` hands back every child unchanged.
    pub(crate) fn map_children(
        &self,
        f: impl FnMut(&Arc<Clause>) -> Arc<Clause>,
    ) -> Option<Self> {
        map_children(&self.children, f).map(|children| Self { children })
    }
}

impl TryFrom<Vec<Arc<Clause>>> for OrClause {
    type Error = ModelError;

    fn try_from(children: Vec<Arc<Clause>>) -> Result<Self, Self::Error> {
        Self::new(children)
    }
}

impl From<OrClause> for Vec<Arc<Clause>> {
    fn from(clause: OrClause) -> Self {
        clause.children
    }
}

impl fmt::Display for OrClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, child) in self.children.iter().enumerate() {
            if i > 0 {
                f.write_str(" OR ")?;
            }
            write!(f, "{child}")?;
        }

        Ok(())
    }
}

fn collect_children<I, C>(children: I, kind: JunctionKind) -> Result<Vec<Arc<Clause>>, ModelError>
where
    I: IntoIterator<Item = C>,
    C: Into<Arc<Clause>>,
{
    let children: Vec<Arc<Clause>> = children.into_iter().map(Into::into).collect();
    if children.is_empty() {
        return Err(ModelError::EmptyJunction { kind });
    }

    Ok(children)
}

// Child count is preserved, so a rebuilt junction stays non-empty.
fn map_children(
    children: &[Arc<Clause>],
    mut f: impl FnMut(&Arc<Clause>) -> Arc<Clause>,
) -> Option<Vec<Arc<Clause>>> {
    let mut changed = false;
    let mapped: Vec<Arc<Clause>> = children
        .iter()
        .map(|child| {
            let next = f(child);
            changed |= !Arc::ptr_eq(&next, child);
            next
        })
        .collect();

    changed.then_some(mapped)
}

///
/// NotClause
///

#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct NotClause {
    child: Arc<Clause>,
}

impl NotClause {
    #[must_use]
    pub fn new(child: impl Into<Arc<Clause>>) -> Self {
        Self {
            child: child.into(),
        }
    }

    #[must_use]
    pub const fn child(&self) -> &Arc<Clause> {
        &self.child
    }

    /// Rebuild with the child passed through `f`; `None` if it came back
    /// unchanged.
    pub(crate) fn map_child(&self, f: impl FnOnce(&Arc<Clause>) -> Arc<Clause>) -> Option<Self> {
        let child = f(&self.child);

        (!Arc::ptr_eq(&child, &self.child)).then_some(Self { child })
    }
}

impl fmt::Display for NotClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.child.is_junction() {
            write!(f, "NOT ({})", self.child)
        } else {
            write!(f, "NOT {}", self.child)
        }
    }
}

///
/// WasClause
///
/// Historical predicate: `field was[ not][ in] operand [history predicate]`.
///

#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct WasClause {
    field: String,
    operator: Operator,
    operand: Operand,
    predicate: Option<HistoryPredicate>,
}

impl WasClause {
    #[must_use]
    pub fn new(
        field: impl Into<String>,
        operator: Operator,
        operand: Operand,
        predicate: Option<HistoryPredicate>,
    ) -> Self {
        Self {
            field: field.into(),
            operator,
            operand,
            predicate,
        }
    }

    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    #[must_use]
    pub const fn operator(&self) -> Operator {
        self.operator
    }

    #[must_use]
    pub const fn operand(&self) -> &Operand {
        &self.operand
    }

    #[must_use]
    pub const fn predicate(&self) -> Option<&HistoryPredicate> {
        self.predicate.as_ref()
    }
}

impl fmt::Display for WasClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.field, self.operator, self.operand)?;
        if let Some(predicate) = &self.predicate {
            write!(f, " {predicate}")?;
        }

        Ok(())
    }
}

///
/// ChangedClause
///
/// Historical predicate: `field changed [history predicate]`.
///

#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct ChangedClause {
    field: String,
    predicate: Option<HistoryPredicate>,
}

impl ChangedClause {
    #[must_use]
    pub fn new(field: impl Into<String>, predicate: Option<HistoryPredicate>) -> Self {
        Self {
            field: field.into(),
            predicate,
        }
    }

    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    #[must_use]
    pub const fn predicate(&self) -> Option<&HistoryPredicate> {
        self.predicate.as_ref()
    }
}

impl fmt::Display for ChangedClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, Operator::Changed)?;
        if let Some(predicate) = &self.predicate {
            write!(f, " {predicate}")?;
        }

        Ok(())
    }
}

///
/// TESTS
///
