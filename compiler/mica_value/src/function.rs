//! Callable handles.
//!
//! Everything the call invoker can dispatch on implements [`Callable`]: native
//! Rust functions exported through the import registry, and interpreted
//! closures built by the compiler. A [`Function`] is the shared, cloneable
//! handle stored inside `Value::Func`.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use mica_ir::FuncType;

use crate::{EvalResult, Value};

/// A function the invoker can call.
///
/// Implementations receive arguments already checked against `signature()`
/// and must return exactly `signature().results.len()` values.
pub trait Callable: Send + Sync {
    /// Name used in diagnostics and error traces.
    fn name(&self) -> &str;

    fn signature(&self) -> &FuncType;

    fn call(&self, args: &[Value]) -> EvalResult<Vec<Value>>;

    /// The concrete callable, for implementations that want to be
    /// recognized through [`Function::downcast_ref`].
    fn as_any(&self) -> Option<&dyn Any> {
        None
    }
}

/// Shared handle to a callable.
#[derive(Clone)]
pub struct Function(Arc<dyn Callable>);

impl Function {
    pub fn new(callable: impl Callable + 'static) -> Self {
        Function(Arc::new(callable))
    }

    pub fn from_arc(callable: Arc<dyn Callable>) -> Self {
        Function(callable)
    }

    /// Wrap a Rust closure as a native function.
    pub fn native<F>(name: impl Into<String>, sig: FuncType, body: F) -> Self
    where
        F: Fn(&[Value]) -> EvalResult<Vec<Value>> + Send + Sync + 'static,
    {
        Function::new(NativeFunction::new(name, sig, body))
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.0.name()
    }

    #[inline]
    pub fn signature(&self) -> &FuncType {
        self.0.signature()
    }

    /// Call without any argument checking. Use the invoker instead.
    #[inline]
    pub fn call_unchecked(&self, args: &[Value]) -> EvalResult<Vec<Value>> {
        self.0.call(args)
    }

    /// The callable as `T`, if it is one and opted in through
    /// [`Callable::as_any`].
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.as_any()?.downcast_ref()
    }

    pub fn ptr_eq(&self, other: &Function) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name())
            .field("params", &self.signature().params.len())
            .field("results", &self.signature().results.len())
            .finish()
    }
}

type NativeBody = dyn Fn(&[Value]) -> EvalResult<Vec<Value>> + Send + Sync;

/// A Rust function exported to interpreted code.
pub struct NativeFunction {
    name: String,
    sig: FuncType,
    body: Box<NativeBody>,
}

impl NativeFunction {
    pub fn new<F>(name: impl Into<String>, sig: FuncType, body: F) -> Self
    where
        F: Fn(&[Value]) -> EvalResult<Vec<Value>> + Send + Sync + 'static,
    {
        NativeFunction {
            name: name.into(),
            sig,
            body: Box::new(body),
        }
    }
}

impl Callable for NativeFunction {
    fn name(&self) -> &str {
        &self.name
    }

    fn signature(&self) -> &FuncType {
        &self.sig
    }

    fn call(&self, args: &[Value]) -> EvalResult<Vec<Value>> {
        (self.body)(args)
    }
}
