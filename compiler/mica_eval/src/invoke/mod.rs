//! Foreign call invoker.
//!
//! Every dynamic call, native or interpreted, goes through [`Invoker::invoke`].
//! It marshals the arguments against the callee's declared signature, guards
//! the call depth, turns a panicking native function into an `EvalError`,
//! and checks the number of results. It never retries.

use std::cell::Cell;
use std::panic::{catch_unwind, AssertUnwindSafe};

use mica_ir::{FuncType, Kind, TypeDesc};
use mica_value::{
    arity_mismatch, callable_panicked, not_callable, result_count_mismatch, stack_overflow,
    type_mismatch, EvalResult, Function, Value,
};
use smallvec::SmallVec;

/// Argument buffer. Most calls have few arguments.
pub type Args = SmallVec<[Value; 4]>;

/// Default limit on nested calls per thread.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 10_000;

thread_local! {
    static CALL_DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// Current nesting of invoker calls on this thread.
pub fn call_depth() -> usize {
    CALL_DEPTH.with(Cell::get)
}

struct DepthGuard;

impl DepthGuard {
    fn enter(limit: usize) -> EvalResult<DepthGuard> {
        CALL_DEPTH.with(|depth| {
            let current = depth.get();
            if current >= limit {
                return Err(stack_overflow(limit));
            }
            depth.set(current + 1);
            Ok(DepthGuard)
        })
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        CALL_DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

/// Call settings, copied into every compiled call site.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Invoker {
    pub max_call_depth: usize,
    /// Grow the native stack on demand around each call.
    pub stack_growth: bool,
}

impl Default for Invoker {
    fn default() -> Self {
        Invoker {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            stack_growth: true,
        }
    }
}

impl Invoker {
    /// Call `callee`, which must hold a function.
    pub fn invoke(&self, callee: &Value, args: Args) -> EvalResult<Vec<Value>> {
        match callee.as_func() {
            Some(function) => self.invoke_func(&function, args),
            None => Err(not_callable(callee.type_name())),
        }
    }

    #[tracing::instrument(level = "trace", skip_all, fields(callee = function.name()))]
    pub fn invoke_func(&self, function: &Function, args: Args) -> EvalResult<Vec<Value>> {
        let sig = function.signature();
        let name = function.name();
        let args = marshal_args(name, sig, args)?;

        let _depth = DepthGuard::enter(self.max_call_depth)?;
        let call = || catch_unwind(AssertUnwindSafe(|| function.call_unchecked(&args)));
        let outcome = if self.stack_growth {
            mica_stack::ensure_sufficient_stack(call)
        } else {
            call()
        };

        let results = match outcome {
            Ok(Ok(results)) => results,
            Ok(Err(err)) => return Err(err.in_call(name)),
            Err(payload) => return Err(callable_panicked(name, panic_message(&*payload))),
        };
        if results.len() != sig.results.len() {
            return Err(result_count_mismatch(name, sig.results.len(), results.len()));
        }
        Ok(results)
    }
}

/// Check arity and argument kinds, reading foreign variables through.
///
/// Interface and composite parameters accept any value; primitive parameters
/// require the exact tag. Trailing arguments of a variadic function are
/// checked against the element type and passed flat.
fn marshal_args(name: &str, sig: &FuncType, mut args: Args) -> EvalResult<Args> {
    let fixed = if sig.variadic {
        sig.params.len().saturating_sub(1)
    } else {
        sig.params.len()
    };
    let arity_ok = if sig.variadic {
        args.len() >= fixed
    } else {
        args.len() == fixed
    };
    if !arity_ok {
        return Err(arity_mismatch(name, sig.params.len(), args.len()));
    }

    for (idx, arg) in args.iter_mut().enumerate() {
        if let Value::Var(_) = arg {
            *arg = arg.load();
        }
        let param = if idx < fixed {
            sig.params.get(idx)
        } else {
            sig.params.last().map(variadic_elem)
        };
        let expected = param.map_or(Kind::Other, TypeDesc::kind);
        if expected != Kind::Other && arg.kind() != expected {
            return Err(type_mismatch(expected.name(), arg.type_name()));
        }
    }
    Ok(args)
}

fn variadic_elem(param: &TypeDesc) -> &TypeDesc {
    match param {
        TypeDesc::Slice(elem) => elem,
        other => other,
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
