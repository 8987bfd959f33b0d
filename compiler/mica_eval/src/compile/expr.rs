//! Leaves and blocks: literals, identifiers, package selectors.

use std::sync::Arc;

use mica_imports::Binding;
use mica_ir::ast::{self, Literal};
use mica_ir::{Name, TypeDesc};
use mica_value::{Complex128, Complex64, Uintptr, Value};

use super::expr_fn::{dispatch, Compiled, Expr, ExprFn, KindVisitor, Specialize};
use super::{func_lit, CompileError, Compiler, Result};
use crate::scope::StorageKind;
use crate::Env;

impl Compiler {
    pub(super) fn expr(&mut self, expr: &ast::Expr) -> Result<Expr> {
        match expr {
            ast::Expr::Lit(lit) => literal(lit),
            ast::Expr::Ident(name) => self.ident(*name),
            ast::Expr::Selector { package, member } => self.selector(*package, *member),
            ast::Expr::Call { func, args } => self.call(func, args),
            ast::Expr::Binary { op, lhs, rhs } => self.binary(*op, lhs, rhs),
            ast::Expr::Convert { ty, expr } => self.convert(ty, expr),
            ast::Expr::FuncLit(lit) => self.func_lit(lit),
            ast::Expr::Block(block) => self.block(block),
        }
    }

    fn ident(&mut self, name: Name) -> Result<Expr> {
        let Some((symbol, depth)) = self.scope.resolve(name) else {
            return Err(CompileError::Undefined(self.name(name).to_string()));
        };
        match (&symbol.storage, symbol.slot) {
            (StorageKind::Constant(value), _) => Expr::constant(value.clone(), symbol.ty.clone()),
            (_, Some(slot)) => {
                let func = dispatch(symbol.ty.kind(), SlotRead { slot, depth });
                Ok(Expr::new(func, symbol.ty.clone()))
            }
            (_, None) => Err(CompileError::Internal(format!(
                "{} has neither a slot nor a value",
                self.name(name)
            ))),
        }
    }

    /// `pkg.Member`. Constants fold, functions become constant callees,
    /// variables read through their shared cell on every evaluation.
    fn selector(&mut self, package: Name, member: Name) -> Result<Expr> {
        let path = self.package_path(package)?;
        let registry = Arc::clone(&self.registry);
        let binding = registry.lookup_bind(&path, self.name(member)).ok_or_else(|| {
            CompileError::UnknownMember {
                package: self.name(package).to_string(),
                member: self.name(member).to_string(),
            }
        })?;
        match binding {
            Binding::Const { value, ty } => Expr::constant(value.clone(), ty.clone()),
            Binding::Func(function) => {
                let ty = TypeDesc::from_func(function.signature().clone());
                Expr::constant(Value::func(function.clone()), ty)
            }
            Binding::Var { cell, ty } => {
                let func = dispatch(ty.kind(), CellRead { cell: cell.clone() });
                Ok(Expr::new(func, ty.clone()))
            }
        }
    }

    pub(super) fn package_path(&self, package: Name) -> Result<String> {
        self.imports
            .get(&package)
            .cloned()
            .ok_or_else(|| CompileError::UnknownPackage(self.name(package).to_string()))
    }

    /// A block expression. Every block scopes its names; it gets its own
    /// run-time frame only when it declares slots.
    fn block(&mut self, block: &ast::Block) -> Result<Expr> {
        let framed = block.declares_slots();
        if framed {
            self.scope.push();
        } else {
            self.scope.push_lexical();
        }
        let body = self.block_body(block);
        let size = self.scope.pop();
        let (stmts, result) = body?;

        if stmts.is_empty() && !framed {
            return Ok(result);
        }
        let prelude = Prelude {
            stmts: stmts.into(),
            frame: framed.then_some(size),
        };
        let func = match &result.func {
            ExprFn::Multi(f) => ExprFn::Multi(prelude.wrap(Arc::clone(f))),
            ExprFn::Void(f) => ExprFn::Void(prelude.wrap(Arc::clone(f))),
            other => dispatch(result.kind(), WithPrelude(prelude, other))
                .ok_or_else(|| CompileError::Internal("block result shape".to_string()))?,
        };
        Ok(Expr::new(func, result.ty))
    }

    /// Statements and results of a block, compiled into the current frame.
    pub(super) fn block_body(
        &mut self,
        block: &ast::Block,
    ) -> Result<(Vec<Compiled<()>>, Expr)> {
        let mut stmts = Vec::with_capacity(block.stmts.len());
        for stmt in &block.stmts {
            if let Some(compiled) = self.stmt(stmt)? {
                stmts.push(compiled);
            }
        }
        let result = match block.results.as_slice() {
            [] => Expr::new(ExprFn::Void(Arc::new(|_| Ok(()))), TypeDesc::any()),
            [single] => self.expr(single)?,
            many => {
                let values = many
                    .iter()
                    .map(|result| self.expr(result)?.boxed())
                    .collect::<Result<Vec<_>>>()?;
                let func: Compiled<Vec<Value>> =
                    Arc::new(move |env| values.iter().map(|value| value(env)).collect());
                Expr::new(ExprFn::Multi(func), TypeDesc::any())
            }
        };
        Ok((stmts, result))
    }
}

fn literal(lit: &Literal) -> Result<Expr> {
    let value = match lit {
        Literal::Bool(v) => Value::Bool(*v),
        Literal::Int(v) => Value::Int(*v as isize),
        Literal::Int8(v) => Value::Int8(*v),
        Literal::Int16(v) => Value::Int16(*v),
        Literal::Int32(v) => Value::Int32(*v),
        Literal::Int64(v) => Value::Int64(*v),
        Literal::Uint(v) => Value::Uint(*v as usize),
        Literal::Uint8(v) => Value::Uint8(*v),
        Literal::Uint16(v) => Value::Uint16(*v),
        Literal::Uint32(v) => Value::Uint32(*v),
        Literal::Uint64(v) => Value::Uint64(*v),
        Literal::Uintptr(v) => Value::Uintptr(Uintptr(*v as usize)),
        Literal::Float32(v) => Value::Float32(*v),
        Literal::Float64(v) => Value::Float64(*v),
        Literal::Complex64(re, im) => Value::Complex64(Complex64::new(*re, *im)),
        Literal::Complex128(re, im) => Value::Complex128(Complex128::new(*re, *im)),
        Literal::Str(s) => Value::string(s),
        Literal::Nil(_) => Value::Nil,
    };
    Expr::constant(value, lit.ty())
}

struct SlotRead {
    slot: usize,
    depth: usize,
}

impl KindVisitor for SlotRead {
    type Output = ExprFn;

    fn visit<T: Specialize>(self) -> ExprFn {
        let SlotRead { slot, depth } = self;
        T::wrap(Arc::new(move |env| {
            T::from_value(&func_lit::attach(env.lookup(slot, depth)?))
        }))
    }
}

struct CellRead {
    cell: Value,
}

impl KindVisitor for CellRead {
    type Output = ExprFn;

    fn visit<T: Specialize>(self) -> ExprFn {
        let cell = self.cell;
        T::wrap(Arc::new(move |_| T::from_value(&cell)))
    }
}

/// Statements to run, in a fresh frame when `frame` is set, before a
/// block's result.
#[derive(Clone)]
struct Prelude {
    stmts: Arc<[Compiled<()>]>,
    frame: Option<usize>,
}

impl Prelude {
    fn wrap<T: Send + Sync + 'static>(&self, result: Compiled<T>) -> Compiled<T> {
        let Prelude { stmts, frame } = self.clone();
        Arc::new(move |env| {
            let env = match frame {
                Some(size) => Env::child(env, size),
                None => Arc::clone(env),
            };
            for stmt in stmts.iter() {
                stmt(&env)?;
            }
            result(&env)
        })
    }
}

struct WithPrelude<'a>(Prelude, &'a ExprFn);

impl KindVisitor for WithPrelude<'_> {
    type Output = Option<ExprFn>;

    fn visit<T: Specialize>(self) -> Option<ExprFn> {
        let result = T::unwrap(self.1)?;
        Some(T::wrap(self.0.wrap(result)))
    }
}
