//! Closure compiler.
//!
//! Walks the typed tree once and turns every node into a closure over the
//! run-time frame. The static type of each node decides the closure's Rust
//! return type; see [`expr_fn`] for the shapes and [`call`] for how call
//! sites pick theirs.
//!
//! A `Compiler` keeps its global scope between units, so a host can compile
//! a program and then more expressions against the same globals.

mod binary;
pub mod call;
mod convert;
mod errors;
mod expr;
pub mod expr_fn;
mod func_lit;
mod stmt;

use std::sync::Arc;

use mica_imports::ImportRegistry;
use mica_ir::{ast, Name, SharedInterner, StringLookup, TypeDesc};
use rustc_hash::FxHashMap;

use crate::invoke::{Invoker, DEFAULT_MAX_CALL_DEPTH};
use crate::program::Program;
use crate::scope::CompileScope;
use crate::Env;

pub use call::Call;
pub use errors::{CompileError, Warning};
pub use expr_fn::{dispatch, Compiled, Expr, ExprFn, KindVisitor, Specialize};

pub type Result<T, E = CompileError> = std::result::Result<T, E>;

/// Settings fixed for the lifetime of a compiler.
#[derive(Clone)]
pub struct CompilerOptions {
    pub registry: Arc<ImportRegistry>,
    pub interner: SharedInterner,
    pub max_call_depth: usize,
    pub stack_growth: bool,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        CompilerOptions {
            registry: Arc::new(ImportRegistry::new()),
            interner: SharedInterner::new(),
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            stack_growth: true,
        }
    }
}

/// Builder for [`Compiler`].
#[derive(Default)]
pub struct CompilerBuilder {
    options: CompilerOptions,
    imports: Vec<(Option<String>, String)>,
}

impl CompilerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn registry(mut self, registry: impl Into<Arc<ImportRegistry>>) -> Self {
        self.options.registry = registry.into();
        self
    }

    /// Share the front end's interner, so `Name`s in the tree resolve.
    #[must_use]
    pub fn interner(mut self, interner: SharedInterner) -> Self {
        self.options.interner = interner;
        self
    }

    #[must_use]
    pub fn max_call_depth(mut self, limit: usize) -> Self {
        self.options.max_call_depth = limit;
        self
    }

    #[must_use]
    pub fn stack_growth(mut self, enabled: bool) -> Self {
        self.options.stack_growth = enabled;
        self
    }

    /// Import `path` under the package's declared name.
    #[must_use]
    pub fn import(mut self, path: impl Into<String>) -> Self {
        self.imports.push((None, path.into()));
        self
    }

    #[must_use]
    pub fn import_as(mut self, alias: impl Into<String>, path: impl Into<String>) -> Self {
        self.imports.push((Some(alias.into()), path.into()));
        self
    }

    pub fn build(self) -> Result<Compiler> {
        let mut compiler = Compiler::with_options(self.options);
        for (alias, path) in self.imports {
            match alias {
                Some(alias) => compiler.import_as(&alias, &path)?,
                None => compiler.import(&path)?,
            }
        }
        Ok(compiler)
    }
}

/// Compiles typed trees into closures.
pub struct Compiler {
    registry: Arc<ImportRegistry>,
    interner: SharedInterner,
    invoker: Invoker,
    scope: CompileScope,
    /// Local package name to import path.
    imports: FxHashMap<Name, String>,
    warnings: Vec<Warning>,
}

impl Compiler {
    pub fn new() -> Self {
        Self::with_options(CompilerOptions::default())
    }

    pub fn builder() -> CompilerBuilder {
        CompilerBuilder::new()
    }

    pub fn with_options(options: CompilerOptions) -> Self {
        Compiler {
            registry: options.registry,
            interner: options.interner,
            invoker: Invoker {
                max_call_depth: options.max_call_depth,
                stack_growth: options.stack_growth,
            },
            scope: CompileScope::new(),
            imports: FxHashMap::default(),
            warnings: Vec::new(),
        }
    }

    /// Make the package at `path` visible under its declared name.
    pub fn import(&mut self, path: &str) -> Result<()> {
        let package = self
            .registry
            .package(path)
            .ok_or_else(|| CompileError::UnknownPackage(path.to_string()))?;
        let local = self.interner.intern(&package.name);
        self.imports.insert(local, path.to_string());
        Ok(())
    }

    pub fn import_as(&mut self, alias: &str, path: &str) -> Result<()> {
        if !self.registry.contains(path) {
            return Err(CompileError::UnknownPackage(path.to_string()));
        }
        let local = self.interner.intern(alias);
        self.imports.insert(local, path.to_string());
        Ok(())
    }

    pub fn interner(&self) -> &SharedInterner {
        &self.interner
    }

    pub fn registry(&self) -> &Arc<ImportRegistry> {
        &self.registry
    }

    pub fn invoker(&self) -> Invoker {
        self.invoker
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn take_warnings(&mut self) -> Vec<Warning> {
        std::mem::take(&mut self.warnings)
    }

    /// Slots the global frame needs for everything compiled so far.
    pub fn global_size(&self) -> usize {
        self.scope.frame_size()
    }

    /// A global frame sized for everything compiled so far.
    pub fn new_env(&self) -> Arc<Env> {
        Env::root(self.global_size())
    }

    /// Compile a single expression against the current globals.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn compile_expr(&mut self, expr: &ast::Expr) -> Result<Expr> {
        self.unit(|compiler| compiler.expr(expr))
    }

    /// Compile a whole unit. Its statements run in the global frame; its
    /// result expressions become the program's results.
    ///
    /// On error no declaration of the unit stays in scope.
    #[tracing::instrument(level = "debug", skip_all, fields(stmts = block.stmts.len()))]
    pub fn compile_program(&mut self, block: &ast::Block) -> Result<Program> {
        self.unit(|compiler| compiler.program(block))
    }

    /// Run `compile`, rolling the scope back if it fails.
    fn unit<T>(&mut self, compile: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let snapshot = self.scope.snapshot();
        let result = compile(self);
        if result.is_err() {
            self.scope.restore(snapshot);
        }
        result
    }

    fn program(&mut self, block: &ast::Block) -> Result<Program> {
        let mut stmts = Vec::with_capacity(block.stmts.len());
        for stmt in &block.stmts {
            if let Some(compiled) = self.stmt(stmt)? {
                stmts.push(compiled);
            }
        }
        let results = block
            .results
            .iter()
            .map(|result| self.expr(result)?.values())
            .collect::<Result<Vec<_>>>()?;

        let functions = block
            .stmts
            .iter()
            .filter_map(|stmt| match stmt {
                ast::Stmt::FuncDecl(decl) => self.scope.resolve(decl.name),
                _ => None,
            })
            .filter_map(|(sym, depth)| {
                let slot = sym.slot?;
                (depth == 0).then(|| (self.name(sym.name).to_string(), slot))
            })
            .collect();

        tracing::debug!(
            frame_size = self.global_size(),
            warnings = self.warnings.len(),
            "compiled program"
        );
        Ok(Program::new(
            stmts,
            results,
            self.global_size(),
            functions,
            self.invoker,
        ))
    }

    fn name(&self, name: Name) -> &str {
        self.interner.lookup(name)
    }

    fn type_name(&self, ty: &TypeDesc) -> String {
        ty.display(&self.interner)
    }

    fn warn(&mut self, name: &str, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(name, "{message}");
        self.warnings.push(Warning {
            name: name.to_string(),
            message,
        });
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
