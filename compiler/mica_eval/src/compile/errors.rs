//! Compile-time errors and warnings.

use std::fmt;

use mica_imports::UntypedError;
use mica_value::EvalError;

/// A fatal compile-time error. Compilation of the unit stops.
#[derive(Clone, Debug, thiserror::Error)]
pub enum CompileError {
    /// The compiler reached a state it should never emit code for.
    #[error("internal compiler error: {0}")]
    Internal(String),
    #[error("undefined: {0}")]
    Undefined(String),
    #[error("{0} redeclared in this block")]
    Redeclared(String),
    #[error("cannot use {got} as {expected} in {context}")]
    TypeMismatch {
        expected: String,
        got: String,
        context: String,
    },
    #[error("{} arguments in call to {name}: have {got}, want {expected}", if .got < .expected { "not enough" } else { "too many" })]
    ArityMismatch {
        name: String,
        expected: usize,
        got: usize,
    },
    #[error("wrong number of return values: have {got}, want {expected}")]
    ResultCount { expected: usize, got: usize },
    #[error("invalid operation: cannot call non-function (type {0})")]
    NotCallable(String),
    #[error("undefined package: {0}")]
    UnknownPackage(String),
    #[error("undefined: {package}.{member}")]
    UnknownMember { package: String, member: String },
    #[error("{0} is not constant")]
    NotConstant(String),
    #[error("cannot assign to {0} (neither addressable nor a map index expression)")]
    NotAssignable(String),
    #[error("multiple-value expression in single-value context")]
    MultiValue,
    #[error("expression has no value")]
    NoValue,
    #[error("invalid operation: operator {op} not defined on {ty}")]
    InvalidOperation { op: &'static str, ty: String },
    #[error("cannot convert {from} to type {to}")]
    InvalidConversion { from: String, to: String },
    #[error(transparent)]
    Untyped(#[from] UntypedError),
    #[error("constant evaluation failed: {0}")]
    ConstantEval(EvalError),
}

/// A recoverable problem: the offending declaration was left out and
/// compilation went on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Warning {
    pub name: String,
    pub message: String,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.message)
    }
}
