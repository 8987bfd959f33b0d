#![allow(
    clippy::result_large_err,
    reason = "EvalError travels through every compiled closure; boxing it would not pay off"
)]
//! Mica Eval - compiles a typed tree into closures and runs them.
//!
//! - [`Compiler`]: walks the tree once, producing an [`Expr`] per node or a
//!   whole [`Program`]
//! - [`compile::call`]: per-kind call site specialization
//! - [`Invoker`]: the one place every call goes through
//! - [`Env`] / [`CompileScope`]: the run-time frames and their compile-time
//!   mirror
//!
//! # Debugging
//!
//! Call [`init_tracing`] and set `MICA_LOG` (or `RUST_LOG`):
//! - `MICA_LOG=mica_eval=debug` - compile entry points and call shapes
//! - `MICA_LOG=mica_eval::invoke=trace` - every invocation

pub mod compile;
mod environment;
pub mod invoke;
mod program;
pub mod scope;

use std::sync::Once;

pub use compile::{
    Call, CompileError, Compiled, Compiler, CompilerBuilder, CompilerOptions, Expr, ExprFn,
    Warning,
};
pub use environment::Env;
pub use invoke::{call_depth, Args, Invoker, DEFAULT_MAX_CALL_DEPTH};
pub use program::Program;
pub use scope::{CompileScope, ScopeSnapshot, StorageKind, Symbol};

static TRACING_INIT: Once = Once::new();

/// Install a hierarchical tracing subscriber on stderr.
///
/// Does nothing unless `MICA_LOG` or `RUST_LOG` is set. Safe to call more
/// than once.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{prelude::*, EnvFilter};

        let filter = std::env::var("MICA_LOG")
            .or_else(|_| std::env::var("RUST_LOG"))
            .ok()
            .and_then(|directives| EnvFilter::try_new(directives).ok());
        if let Some(filter) = filter {
            let _ = tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_tree::HierarchicalLayer::new(2)
                        .with_targets(true)
                        .with_writer(std::io::stderr),
                )
                .try_init();
        }
    });
}
