use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    hash::{Hash, Hasher},
};

///
/// Operand
///
/// Right-hand side of a terminal clause. Immutable once built; the
/// invariants of each variant are enforced by its constructor.
///

#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Operand {
    /// No value was supplied (`field is EMPTY`).
    Empty,
    Single(Literal),
    Multi(MultiOperand),
    Function(FunctionOperand),
}

impl Operand {
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Single(Literal::Text(value.into()))
    }

    #[must_use]
    pub const fn integer(value: i64) -> Self {
        Self::Single(Literal::Integer(value))
    }

    /// Build a multi-value operand, rejecting an empty value list.
    pub fn multi(values: impl IntoIterator<Item = Self>) -> Result<Self, ModelError> {
        MultiOperand::new(values).map(Self::Multi)
    }

    /// Build a function-call operand.
    pub fn function<I, S>(name: impl Into<String>, args: I) -> Result<Self, ModelError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FunctionOperand::new(name, args).map(Self::Function)
    }

    /// Double dispatch into `visitor` on this operand's variant.
    pub fn accept<V: OperandVisitor + ?Sized>(&self, visitor: &mut V) -> V::Output {
        match self {
            Self::Empty => visitor.visit_empty(),
            Self::Single(literal) => visitor.visit_single(literal),
            Self::Multi(multi) => visitor.visit_multi(multi),
            Self::Function(function) => visitor.visit_function(function),
        }
    }

    /// Surface rendering of the operand.
    ///
    /// Text literals are double-quoted, integers bare, multi-values
    /// parenthesized, and function calls rendered as `name(arg, ...)`.
    #[must_use]
    pub fn display_string(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("EMPTY"),
            Self::Single(literal) => write!(f, "{literal}"),
            Self::Multi(multi) => write!(f, "{multi}"),
            Self::Function(function) => write!(f, "{function}"),
        }
    }
}

impl From<Literal> for Operand {
    fn from(literal: Literal) -> Self {
        Self::Single(literal)
    }
}

impl From<MultiOperand> for Operand {
    fn from(multi: MultiOperand) -> Self {
        Self::Multi(multi)
    }
}

impl From<FunctionOperand> for Operand {
    fn from(function: FunctionOperand) -> Self {
        Self::Function(function)
    }
}

///
/// OperandVisitor
///
/// One required method per operand variant; adding a variant breaks every
/// visitor at compile time.
///

pub trait OperandVisitor {
    type Output;

    fn visit_empty(&mut self) -> Self::Output;
    fn visit_single(&mut self, literal: &Literal) -> Self::Output;
    fn visit_multi(&mut self, multi: &MultiOperand) -> Self::Output;
    fn visit_function(&mut self, function: &FunctionOperand) -> Self::Output;
}

///
/// Literal
///
/// Payload of a single-value operand: exactly one of a text value or an
/// integer identity.
///

#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Literal {
    Text(String),
    Integer(i64),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(value) => write!(f, "\"{value}\""),
            Self::Integer(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

///
/// MultiOperand
///
/// Ordered, non-empty list of operands (`in (a, b, c)`).
///

#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(try_from = "Vec<Operand>", into = "Vec<Operand>")]
pub struct MultiOperand {
    values: Vec<Operand>,
}

impl MultiOperand {
    pub fn new(values: impl IntoIterator<Item = Operand>) -> Result<Self, ModelError> {
        let values: Vec<Operand> = values.into_iter().collect();
        if values.is_empty() {
            return Err(ModelError::EmptyMultiOperand);
        }

        Ok(Self { values })
    }

    #[must_use]
    pub fn values(&self) -> &[Operand] {
        &self.values
    }
}

impl TryFrom<Vec<Operand>> for MultiOperand {
    type Error = ModelError;

    fn try_from(values: Vec<Operand>) -> Result<Self, Self::Error> {
        Self::new(values)
    }
}

impl From<MultiOperand> for Vec<Operand> {
    fn from(multi: MultiOperand) -> Self {
        multi.values
    }
}

impl fmt::Display for MultiOperand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{value}")?;
        }
        f.write_str(")")
    }
}

///
/// FunctionOperand
///
/// A function call with ordered string arguments. The name is matched
/// ASCII case-insensitively, so equality and hashing ignore its case.
///

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(try_from = "FunctionOperandRepr", into = "FunctionOperandRepr")]
pub struct FunctionOperand {
    name: String,
    args: Vec<String>,
}

impl FunctionOperand {
    pub fn new<I, S>(name: impl Into<String>, args: I) -> Result<Self, ModelError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ModelError::EmptyFunctionName);
        }

        Ok(Self {
            name,
            args: args.into_iter().map(Into::into).collect(),
        })
    }

    /// Function name, in the case it was written.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    #[must_use]
    pub const fn is_zero_arg(&self) -> bool {
        self.args.is_empty()
    }

    #[must_use]
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Same call with `args` replacing the current arguments.
    #[must_use]
    pub fn with_args<I, S>(&self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: self.name.clone(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl PartialEq for FunctionOperand {
    fn eq(&self, other: &Self) -> bool {
        self.is_named(&other.name) && self.args == other.args
    }
}

impl Eq for FunctionOperand {}

impl Hash for FunctionOperand {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.len().hash(state);
        for byte in self.name.bytes() {
            byte.to_ascii_lowercase().hash(state);
        }
        self.args.hash(state);
    }
}

impl fmt::Display for FunctionOperand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.args.join(", "))
    }
}

// Serialized shape; deserialization goes through `FunctionOperand::new`.
#[derive(Clone, Deserialize, Serialize)]
struct FunctionOperandRepr {
    name: String,
    #[serde(default)]
    args: Vec<String>,
}

impl TryFrom<FunctionOperandRepr> for FunctionOperand {
    type Error = ModelError;

    fn try_from(repr: FunctionOperandRepr) -> Result<Self, Self::Error> {
        Self::new(repr.name, repr.args)
    }
}

impl From<FunctionOperand> for FunctionOperandRepr {
    fn from(function: FunctionOperand) -> Self {
        Self {
            name: function.name,
            args: function.args,
        }
    }
}

///
/// TESTS
///
