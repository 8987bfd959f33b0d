#![allow(
    clippy::result_large_err,
    reason = "EvalError travels through every compiled closure; boxing it would not pay off"
)]
//! Mica Value - the runtime side of the evaluator's data model.
//!
//! - [`Value`]: the tagged union every dynamic slot holds
//! - [`Scalar`]: the bridge between `Value` and the unboxed Rust type of each
//!   specialization kind
//! - [`Callable`] / [`Function`]: the handle the call invoker dispatches on
//! - [`EvalError`] / [`EvalResult`]: run-time failures

mod errors;
mod function;
mod scalar;
mod value;

pub use errors::{
    arity_mismatch, callable_panicked, missing_frame, not_callable, result_count_mismatch,
    slot_out_of_range, stack_overflow, type_mismatch, EvalError, EvalErrorKind, EvalResult,
};
pub use function::{Callable, Function, NativeFunction};
pub use scalar::{Arith, Ordered, Scalar};
pub use value::{Complex128, Complex64, Heap, Opaque, SharedVar, Str, Uintptr, Value};
