//! Run-time evaluation errors.
//!
//! Every failure inside a compiled closure becomes an `EvalError` that
//! unwinds the current evaluation through `?`. Nothing is retried here.
//! Factory functions are the public API: they fill in both the structured
//! `kind` and the rendered `message`.

use std::fmt;

use crate::Value;

/// Result of evaluating a compiled closure.
pub type EvalResult<T = Value> = Result<T, EvalError>;

/// Structured category of a run-time failure.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EvalErrorKind {
    #[error("{}", arity_message(.name, *.expected, *.got))]
    ArityMismatch {
        name: String,
        expected: usize,
        got: usize,
    },
    #[error("type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },
    #[error("{type_name} is not callable")]
    NotCallable { type_name: String },
    #[error("{name} returned {got} values, declared {expected}")]
    ResultCountMismatch {
        name: String,
        expected: usize,
        got: usize,
    },
    #[error("environment slot {slot} out of range (frame has {len} slots)")]
    SlotOutOfRange { slot: usize, len: usize },
    #[error("no enclosing frame at depth {depth}")]
    MissingFrame { depth: usize },
    #[error("{name} panicked: {message}")]
    CallablePanicked { name: String, message: String },
    #[error("maximum call depth exceeded (limit: {limit})")]
    StackOverflow { limit: usize },
    #[error("{message}")]
    Custom { message: String },
}

fn arity_message(name: &str, expected: usize, got: usize) -> String {
    let word = if expected == 1 {
        "argument"
    } else {
        "arguments"
    };
    if name.is_empty() {
        format!("expected {expected} {word}, got {got}")
    } else {
        format!("{name} expects {expected} {word}, got {got}")
    }
}

/// A run-time failure.
#[derive(Clone, Debug)]
pub struct EvalError {
    pub kind: EvalErrorKind,
    /// Rendered message; equals `kind.to_string()` unless context was added.
    pub message: String,
    /// Call chain, innermost first, recorded while the error unwinds.
    pub trace: Vec<String>,
}

impl EvalError {
    /// An uncategorized failure.
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::from_kind(EvalErrorKind::Custom { message })
    }

    pub fn from_kind(kind: EvalErrorKind) -> Self {
        let message = kind.to_string();
        EvalError {
            kind,
            message,
            trace: Vec::new(),
        }
    }

    /// Record that the error passed through a call of `name`.
    #[must_use]
    pub fn in_call(mut self, name: &str) -> Self {
        self.trace.push(name.to_string());
        self
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        for frame in &self.trace {
            write!(f, "\n  in {frame}")?;
        }
        Ok(())
    }
}

impl std::error::Error for EvalError {}

impl From<EvalErrorKind> for EvalError {
    fn from(kind: EvalErrorKind) -> Self {
        EvalError::from_kind(kind)
    }
}

#[cold]
pub fn arity_mismatch(name: &str, expected: usize, got: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::ArityMismatch {
        name: name.to_string(),
        expected,
        got,
    })
}

#[cold]
pub fn type_mismatch(expected: impl Into<String>, got: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::TypeMismatch {
        expected: expected.into(),
        got: got.into(),
    })
}

#[cold]
pub fn not_callable(type_name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NotCallable {
        type_name: type_name.to_string(),
    })
}

#[cold]
pub fn result_count_mismatch(name: &str, expected: usize, got: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::ResultCountMismatch {
        name: name.to_string(),
        expected,
        got,
    })
}

#[cold]
pub fn slot_out_of_range(slot: usize, len: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::SlotOutOfRange { slot, len })
}

#[cold]
pub fn missing_frame(depth: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::MissingFrame { depth })
}

#[cold]
pub fn callable_panicked(name: &str, message: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::CallablePanicked {
        name: name.to_string(),
        message: message.into(),
    })
}

#[cold]
pub fn stack_overflow(limit: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::StackOverflow { limit })
}
