//! A compiled unit, ready to run any number of times.

use std::sync::Arc;

use mica_value::{slot_out_of_range, EvalError, EvalResult, Value};
use rustc_hash::FxHashMap;

use crate::compile::Compiled;
use crate::invoke::Invoker;
use crate::Env;

/// The closures of a compiled unit.
///
/// Immutable and `Send + Sync`: several threads may run the same program,
/// each against its own global frame or a shared one.
pub struct Program {
    stmts: Arc<[Compiled<()>]>,
    results: Arc<[Compiled<Vec<Value>>]>,
    frame_size: usize,
    /// Declared global functions by name, with their slot.
    functions: FxHashMap<String, usize>,
    invoker: Invoker,
}

impl Program {
    pub(crate) fn new(
        stmts: Vec<Compiled<()>>,
        results: Vec<Compiled<Vec<Value>>>,
        frame_size: usize,
        functions: FxHashMap<String, usize>,
        invoker: Invoker,
    ) -> Self {
        Program {
            stmts: stmts.into(),
            results: results.into(),
            frame_size,
            functions,
            invoker,
        }
    }

    /// Slots the global frame needs.
    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// A fresh global frame.
    pub fn new_env(&self) -> Arc<Env> {
        Env::root(self.frame_size)
    }

    /// Run the statements in `env`, then evaluate the results in order.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn run(&self, env: &Arc<Env>) -> EvalResult<Vec<Value>> {
        if env.len() < self.frame_size {
            return Err(slot_out_of_range(self.frame_size - 1, env.len()));
        }
        let body = || {
            for stmt in self.stmts.iter() {
                stmt(env)?;
            }
            let mut values = Vec::with_capacity(self.results.len());
            for result in self.results.iter() {
                values.extend(result(env)?);
            }
            Ok(values)
        };
        if self.invoker.stack_growth {
            mica_stack::ensure_sufficient_stack(body)
        } else {
            body()
        }
    }

    /// Run against a fresh global frame.
    pub fn eval(&self) -> EvalResult<Vec<Value>> {
        self.run(&self.new_env())
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Call a declared global function. `env` must be a frame this program
    /// has already run in.
    pub fn call(
        &self,
        env: &Arc<Env>,
        name: &str,
        args: impl IntoIterator<Item = Value>,
    ) -> EvalResult<Vec<Value>> {
        let Some(&slot) = self.functions.get(name) else {
            return Err(EvalError::new(format!("undefined function {name}")));
        };
        let callee = env.lookup(slot, 0)?;
        self.invoker.invoke(&callee, args.into_iter().collect())
    }
}
