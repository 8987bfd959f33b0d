//! Call sites.
//!
//! The shape of a call's closure is decided here, once, from the callee's
//! signature:
//!
//! - no results: a `Void` closure that discards the (empty) result list
//! - one result: a closure returning the Rust type of the result's kind,
//!   unboxing slot 0 with that kind's accessor
//! - several results: a `Multi` closure returning the whole list
//!
//! Every shape evaluates the callee first, then the arguments left to right,
//! and hands them to the [`Invoker`]. The single-result body is written once
//! in [`ret1`] and instantiated per kind through [`dispatch`].

use std::sync::Arc;

use mica_ir::{ast, FuncType, ReturnShape, TypeDesc};
use mica_value::{result_count_mismatch, EvalResult, Function, Value};

use super::expr_fn::{dispatch, Compiled, Expr, ExprFn, KindVisitor, Specialize};
use super::{CompileError, Compiler, Result};
use crate::invoke::{Args, Invoker};
use crate::Env;

/// A checked call: callee, arguments, and the shape its closure will take.
pub struct Call {
    name: String,
    callee: Expr,
    args: Arc<[Compiled<Value>]>,
    sig: FuncType,
    shape: ReturnShape,
    invoker: Invoker,
}

/// What the emitted closure calls.
enum Target {
    /// Resolved at compile time.
    Const(Function),
    /// Evaluated on every call, before the arguments.
    Dynamic(Compiled<Value>),
}

/// The run-time half of a call site, shared by every shape.
struct CallSite {
    name: String,
    target: Target,
    args: Arc<[Compiled<Value>]>,
    invoker: Invoker,
}

impl CallSite {
    #[inline]
    fn eval_args(&self, env: &Arc<Env>) -> EvalResult<Args> {
        let mut argv = Args::with_capacity(self.args.len());
        for arg in self.args.iter() {
            argv.push(arg(env)?);
        }
        Ok(argv)
    }

    #[inline]
    fn run(&self, env: &Arc<Env>) -> EvalResult<Vec<Value>> {
        match &self.target {
            Target::Const(function) => {
                let argv = self.eval_args(env)?;
                self.invoker.invoke_func(function, argv)
            }
            Target::Dynamic(callee) => {
                let callee = callee(env)?;
                let argv = self.eval_args(env)?;
                self.invoker.invoke(&callee, argv)
            }
        }
    }
}

/// Single-result body: run the call, unbox slot 0 as `T`.
fn ret1<T: Specialize>(site: Arc<CallSite>) -> ExprFn {
    T::wrap(Arc::new(move |env| {
        let results = site.run(env)?;
        match results.first() {
            Some(value) => T::from_value(value),
            None => Err(result_count_mismatch(&site.name, 1, 0)),
        }
    }))
}

struct Ret1(Arc<CallSite>);

impl KindVisitor for Ret1 {
    type Output = ExprFn;

    fn visit<T: Specialize>(self) -> ExprFn {
        ret1::<T>(self.0)
    }
}

impl Call {
    /// Check `args` against the callee's signature and build the call.
    pub fn new(
        name: impl Into<String>,
        callee: Expr,
        args: &[Expr],
        invoker: Invoker,
    ) -> Result<Call> {
        let name = name.into();
        let sig = callee
            .ty
            .func_type()
            .cloned()
            .ok_or_else(|| CompileError::NotCallable(name.clone()))?;
        let args = args.iter().map(Expr::boxed).collect::<Result<Vec<_>>>()?;
        let shape = ReturnShape::classify(&sig);
        Ok(Call {
            name,
            callee,
            args: args.into(),
            sig,
            shape,
            invoker,
        })
    }

    pub fn shape(&self) -> ReturnShape {
        self.shape
    }

    pub fn signature(&self) -> &FuncType {
        &self.sig
    }

    /// Emit the closure for this call's shape, picking the constant-callee
    /// entry point when the callee is known at compile time.
    pub fn emit(&self) -> Result<Expr> {
        let constant = match &self.callee.constant {
            None => None,
            Some(Value::Func(function)) => Some(function.clone()),
            Some(other) => {
                return Err(CompileError::Internal(format!(
                    "constant callee {} has function type but holds a {} value",
                    self.name,
                    other.type_name()
                )))
            }
        };
        tracing::debug!(
            callee = %self.name,
            shape = ?self.shape,
            constant = constant.is_some(),
            "call shape selected"
        );
        match (self.shape, constant) {
            (ReturnShape::One(_), Some(function)) => self.call_const_ret1(&function),
            (ReturnShape::One(_), None) => self.call_ret1(),
            (ReturnShape::Zero, constant) => self.call_void(constant),
            (ReturnShape::Many(_), constant) => self.call_multi(constant),
        }
    }

    /// Single-result call through a callee evaluated at run time.
    ///
    /// The callee must not be a compile-time constant; those go through
    /// [`Call::call_const_ret1`].
    pub fn call_ret1(&self) -> Result<Expr> {
        if self.callee.is_constant() {
            return Err(CompileError::Internal(format!(
                "dynamic call path used for constant callee {}",
                self.name
            )));
        }
        let target = Target::Dynamic(self.callee.boxed()?);
        self.single(target)
    }

    /// Single-result call of a function known at compile time.
    pub fn call_const_ret1(&self, function: &Function) -> Result<Expr> {
        self.single(Target::Const(function.clone()))
    }

    /// Call returning several values, boxed in a list.
    pub fn call_multi(&self, constant: Option<Function>) -> Result<Expr> {
        let site = self.site(self.target(constant)?);
        let func: Compiled<Vec<Value>> = Arc::new(move |env| site.run(env));
        Ok(Expr::new(ExprFn::Multi(func), TypeDesc::any()))
    }

    /// Call returning nothing.
    pub fn call_void(&self, constant: Option<Function>) -> Result<Expr> {
        let site = self.site(self.target(constant)?);
        let func: Compiled<()> = Arc::new(move |env| site.run(env).map(drop));
        Ok(Expr::new(ExprFn::Void(func), TypeDesc::any()))
    }

    fn single(&self, target: Target) -> Result<Expr> {
        let ReturnShape::One(kind) = self.shape else {
            return Err(CompileError::Internal(format!(
                "single-result path used for {} returning {} values",
                self.name,
                self.shape.arity()
            )));
        };
        let ty = self.sig.results[0].clone();
        let func = dispatch(kind, Ret1(self.site(target)));
        Ok(Expr::new(func, ty))
    }

    fn target(&self, constant: Option<Function>) -> Result<Target> {
        match constant {
            Some(function) => Ok(Target::Const(function)),
            None => Ok(Target::Dynamic(self.callee.boxed()?)),
        }
    }

    fn site(&self, target: Target) -> Arc<CallSite> {
        Arc::new(CallSite {
            name: self.name.clone(),
            target,
            args: Arc::clone(&self.args),
            invoker: self.invoker,
        })
    }
}

impl Compiler {
    pub(super) fn call(&mut self, func: &ast::Expr, args: &[ast::Expr]) -> Result<Expr> {
        let name = self.callee_name(func);
        let callee = self.expr(func)?;
        let Some(sig) = callee.ty.func_type().cloned() else {
            return Err(CompileError::NotCallable(self.type_name(&callee.ty)));
        };
        let args = args
            .iter()
            .map(|arg| self.expr(arg))
            .collect::<Result<Vec<_>>>()?;
        self.check_args(&name, &sig, &args)?;
        Call::new(name, callee, &args, self.invoker)?.emit()
    }

    /// Arity and assignability of every argument, against the declared
    /// parameters. Trailing arguments of a variadic callee are checked
    /// against the element type.
    fn check_args(&self, name: &str, sig: &FuncType, args: &[Expr]) -> Result<()> {
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
            return Err(CompileError::ArityMismatch {
                name: name.to_string(),
                expected: sig.params.len(),
                got: args.len(),
            });
        }

        let context = format!("argument to {name}");
        for (idx, arg) in args.iter().enumerate() {
            match arg.value_count() {
                Some(1) => {}
                Some(_) => return Err(CompileError::NoValue),
                None => return Err(CompileError::MultiValue),
            }
            let param = if idx < fixed {
                &sig.params[idx]
            } else {
                match sig.params.last() {
                    Some(TypeDesc::Slice(elem)) => elem,
                    Some(other) => other,
                    None => break,
                }
            };
            self.check_assignable(&arg.ty, param, &context)?;
        }
        Ok(())
    }

    fn callee_name(&self, func: &ast::Expr) -> String {
        match func {
            ast::Expr::Ident(name) => self.name(*name).to_string(),
            ast::Expr::Selector { package, member } => {
                format!("{}.{}", self.name(*package), self.name(*member))
            }
            _ => "function value".to_string(),
        }
    }
}
