//! Interpreted functions: literals and declarations.
//!
//! A function body is compiled once into a [`FuncTemplate`]. Each time the
//! literal or declaration is evaluated, the template is paired with the
//! frame it closes over to form a [`Closure`], which implements `Callable`
//! and therefore goes through the same invoker as native functions.
//!
//! A closure holds the frame it closes over strongly, except while it sits
//! in a slot of that same frame: there it is [`detach`]ed to a weak handle,
//! so the frame does not own itself. Reading the slot [`attach`]es it again,
//! so any copy that leaves the frame keeps the frame alive.

use std::any::Any;
use std::ptr;
use std::sync::{Arc, Weak};

use mica_ir::ast::{FuncDecl, FuncLit};
use mica_ir::{FuncType, TypeDesc};
use mica_value::{missing_frame, Callable, EvalResult, Function, Value};

use super::expr_fn::{Compiled, Expr, ExprFn};
use super::{CompileError, Compiler, Result};
use crate::scope::StorageKind;
use crate::Env;

struct FuncTemplate {
    name: String,
    sig: FuncType,
    frame_size: usize,
    body: Compiled<Vec<Value>>,
}

enum Captured {
    Strong(Arc<Env>),
    /// Stored in a slot of the captured frame.
    // TODO: only the captured frame itself detaches; a closure assigned to a
    // slot of an enclosing frame still reaches that frame through its own
    // frame's parent link.
    Detached(Weak<Env>),
}

struct Closure {
    template: Arc<FuncTemplate>,
    captured: Captured,
}

impl Callable for Closure {
    fn name(&self) -> &str {
        &self.template.name
    }

    fn signature(&self) -> &FuncType {
        &self.template.sig
    }

    fn call(&self, args: &[Value]) -> EvalResult<Vec<Value>> {
        let outer = match &self.captured {
            Captured::Strong(env) => Arc::clone(env),
            Captured::Detached(env) => env.upgrade().ok_or_else(|| missing_frame(1))?,
        };
        let env = Env::child(&outer, self.template.frame_size);
        for (slot, arg) in args.iter().enumerate() {
            env.bind(slot, arg.clone())?;
        }
        (self.template.body)(&env)
    }

    fn as_any(&self) -> Option<&dyn Any> {
        Some(self)
    }
}

/// Prepare `value` for storage in `frame`: a closure over `frame` itself
/// holds it weakly from then on.
pub(super) fn detach(value: Value, frame: &Env) -> Value {
    recapture(&value, |captured| match captured {
        Captured::Strong(env) if ptr::eq(Arc::as_ptr(env), frame) => {
            Some(Captured::Detached(Arc::downgrade(env)))
        }
        _ => None,
    })
    .unwrap_or(value)
}

/// Undo [`detach`] for a value read out of a slot.
pub(super) fn attach(value: Value) -> Value {
    recapture(&value, |captured| match captured {
        Captured::Detached(env) => env.upgrade().map(Captured::Strong),
        Captured::Strong(_) => None,
    })
    .unwrap_or(value)
}

fn recapture(
    value: &Value,
    rebind: impl FnOnce(&Captured) -> Option<Captured>,
) -> Option<Value> {
    let Value::Func(function) = value else {
        return None;
    };
    let closure = function.downcast_ref::<Closure>()?;
    let captured = rebind(&closure.captured)?;
    Some(Value::func(Function::new(Closure {
        template: Arc::clone(&closure.template),
        captured,
    })))
}

impl Compiler {
    pub(super) fn func_lit(&mut self, lit: &FuncLit) -> Result<Expr> {
        let template = self.function_template("func literal".to_string(), lit)?;
        let ty = TypeDesc::from_func(template.sig.clone());
        let func: Compiled<Value> = Arc::new(move |env| {
            Ok(Value::func(Function::new(Closure {
                template: Arc::clone(&template),
                captured: Captured::Strong(Arc::clone(env)),
            })))
        });
        Ok(Expr::new(ExprFn::Value(func), ty))
    }

    pub(super) fn func_decl(&mut self, decl: &FuncDecl) -> Result<Option<Compiled<()>>> {
        let name = self.name(decl.name).to_string();
        if !decl.type_params.is_empty() {
            self.warn(&name, "generic function declarations are not supported yet");
            return Ok(None);
        }
        self.check_fresh(decl.name)?;
        // Declared before the body is compiled so the body can recurse.
        let ty = TypeDesc::from_func(signature(&decl.func));
        let slot = self.declare_slot(decl.name, ty, StorageKind::Func)?;
        let template = self.function_template(name, &decl.func)?;

        Ok(Some(Arc::new(move |env| {
            let closure = Closure {
                template: Arc::clone(&template),
                captured: Captured::Detached(Arc::downgrade(env)),
            };
            env.bind(slot, Value::func(Function::new(closure)))
        })))
    }

    fn function_template(&mut self, name: String, lit: &FuncLit) -> Result<Arc<FuncTemplate>> {
        self.scope.push();
        let body = self.function_body(lit);
        let frame_size = self.scope.pop();
        Ok(Arc::new(FuncTemplate {
            name,
            sig: signature(lit),
            frame_size,
            body: body?,
        }))
    }

    /// Parameters take slots `0..n` of the function's frame; the body's
    /// statements share that frame.
    fn function_body(&mut self, lit: &FuncLit) -> Result<Compiled<Vec<Value>>> {
        for param in &lit.params {
            self.check_fresh(param.name)?;
            self.scope.declare(param.name, param.ty.clone(), StorageKind::Var);
        }
        let mut stmts = Vec::with_capacity(lit.body.stmts.len());
        for stmt in &lit.body.stmts {
            if let Some(compiled) = self.stmt(stmt)? {
                stmts.push(compiled);
            }
        }
        if lit.body.results.len() != lit.results.len() {
            return Err(CompileError::ResultCount {
                expected: lit.results.len(),
                got: lit.body.results.len(),
            });
        }
        let mut results = Vec::with_capacity(lit.results.len());
        for (expr, declared) in lit.body.results.iter().zip(&lit.results) {
            let expr = self.expr(expr)?;
            self.check_assignable(&expr.ty, declared, "return statement")?;
            results.push(expr.boxed()?);
        }

        Ok(Arc::new(move |env| {
            for stmt in &stmts {
                stmt(env)?;
            }
            results.iter().map(|result| result(env)).collect()
        }))
    }
}

fn signature(lit: &FuncLit) -> FuncType {
    FuncType::new(
        lit.params.iter().map(|param| param.ty.clone()).collect(),
        lit.results.clone(),
    )
}
