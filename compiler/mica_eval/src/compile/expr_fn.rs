//! Compiled closures and their return kinds.
//!
//! A compiled expression is a closure over the run-time frame whose Rust
//! return type is fixed when it is built: `i8` for an `int8` expression,
//! `Str` for a string, `Value` for anything composite. [`ExprFn`] is the
//! closed set of those shapes. Code that is the same for every kind is
//! written once against [`Specialize`] and instantiated through
//! [`dispatch`], the one place that maps a `Kind` to a Rust type.

use std::sync::Arc;

use mica_ir::{Kind, TypeDesc};
use mica_value::{Complex128, Complex64, EvalError, EvalResult, Scalar, Str, Uintptr, Value};

use super::CompileError;
use crate::Env;

/// A compiled closure producing `T`.
pub type Compiled<T> = Arc<dyn Fn(&Arc<Env>) -> EvalResult<T> + Send + Sync>;

/// A compiled closure, tagged by what it returns.
#[derive(Clone)]
pub enum ExprFn {
    Bool(Compiled<bool>),
    Int(Compiled<isize>),
    Int8(Compiled<i8>),
    Int16(Compiled<i16>),
    Int32(Compiled<i32>),
    Int64(Compiled<i64>),
    Uint(Compiled<usize>),
    Uint8(Compiled<u8>),
    Uint16(Compiled<u16>),
    Uint32(Compiled<u32>),
    Uint64(Compiled<u64>),
    Uintptr(Compiled<Uintptr>),
    Float32(Compiled<f32>),
    Float64(Compiled<f64>),
    Complex64(Compiled<Complex64>),
    Complex128(Compiled<Complex128>),
    Str(Compiled<Str>),
    /// Boxed single value (`Kind::Other`).
    Value(Compiled<Value>),
    /// Zero or several values: multi-result calls and blocks.
    Multi(Compiled<Vec<Value>>),
    /// No value at all.
    Void(Compiled<()>),
}

/// A Rust type with a dedicated `ExprFn` variant.
pub trait Specialize: Scalar {
    fn wrap(func: Compiled<Self>) -> ExprFn;
    fn unwrap(func: &ExprFn) -> Option<Compiled<Self>>;
}

macro_rules! specialize {
    ($($ty:ty => $variant:ident),* $(,)?) => {$(
        impl Specialize for $ty {
            #[inline]
            fn wrap(func: Compiled<Self>) -> ExprFn {
                ExprFn::$variant(func)
            }

            #[inline]
            fn unwrap(func: &ExprFn) -> Option<Compiled<Self>> {
                match func {
                    ExprFn::$variant(f) => Some(Arc::clone(f)),
                    _ => None,
                }
            }
        }
    )*};
}

specialize! {
    bool => Bool,
    isize => Int,
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    usize => Uint,
    u8 => Uint8,
    u16 => Uint16,
    u32 => Uint32,
    u64 => Uint64,
    Uintptr => Uintptr,
    f32 => Float32,
    f64 => Float64,
    Complex64 => Complex64,
    Complex128 => Complex128,
    Str => Str,
    Value => Value,
}

/// Code generic over the return kind.
pub trait KindVisitor {
    type Output;

    fn visit<T: Specialize>(self) -> Self::Output;
}

/// Run `visitor` with the Rust type of `kind`.
pub fn dispatch<V: KindVisitor>(kind: Kind, visitor: V) -> V::Output {
    match kind {
        Kind::Bool => visitor.visit::<bool>(),
        Kind::Int => visitor.visit::<isize>(),
        Kind::Int8 => visitor.visit::<i8>(),
        Kind::Int16 => visitor.visit::<i16>(),
        Kind::Int32 => visitor.visit::<i32>(),
        Kind::Int64 => visitor.visit::<i64>(),
        Kind::Uint => visitor.visit::<usize>(),
        Kind::Uint8 => visitor.visit::<u8>(),
        Kind::Uint16 => visitor.visit::<u16>(),
        Kind::Uint32 => visitor.visit::<u32>(),
        Kind::Uint64 => visitor.visit::<u64>(),
        Kind::Uintptr => visitor.visit::<Uintptr>(),
        Kind::Float32 => visitor.visit::<f32>(),
        Kind::Float64 => visitor.visit::<f64>(),
        Kind::Complex64 => visitor.visit::<Complex64>(),
        Kind::Complex128 => visitor.visit::<Complex128>(),
        Kind::String => visitor.visit::<Str>(),
        Kind::Other => visitor.visit::<Value>(),
    }
}

/// A compiled expression: the closure, the static type it was compiled
/// against, and its value when known at compile time.
#[derive(Clone)]
pub struct Expr {
    pub func: ExprFn,
    pub ty: TypeDesc,
    pub constant: Option<Value>,
}

impl Expr {
    pub fn new(func: ExprFn, ty: TypeDesc) -> Self {
        Expr {
            func,
            ty,
            constant: None,
        }
    }

    /// A compile-time constant of type `ty`. The value is unboxed once, here.
    pub fn constant(value: Value, ty: TypeDesc) -> Result<Self, CompileError> {
        struct Constant<'a>(&'a Value);

        impl KindVisitor for Constant<'_> {
            type Output = EvalResult<ExprFn>;

            fn visit<T: Specialize>(self) -> EvalResult<ExprFn> {
                let unboxed = T::from_value(self.0)?;
                Ok(T::wrap(Arc::new(move |_| Ok(unboxed.clone()))))
            }
        }

        let func = dispatch(ty.kind(), Constant(&value)).map_err(CompileError::ConstantEval)?;
        Ok(Expr {
            func,
            ty,
            constant: Some(value),
        })
    }

    /// Specialization kind of a single-valued expression.
    pub fn kind(&self) -> Kind {
        self.ty.kind()
    }

    pub fn is_constant(&self) -> bool {
        self.constant.is_some()
    }

    /// Number of values the expression yields, when statically known:
    /// `None` for a `Multi` closure.
    pub fn value_count(&self) -> Option<usize> {
        match self.func {
            ExprFn::Void(_) => Some(0),
            ExprFn::Multi(_) => None,
            _ => Some(1),
        }
    }

    /// The closure with its result boxed.
    pub fn boxed(&self) -> Result<Compiled<Value>, CompileError> {
        struct Boxed<'a>(&'a ExprFn);

        impl KindVisitor for Boxed<'_> {
            type Output = Option<Compiled<Value>>;

            fn visit<T: Specialize>(self) -> Option<Compiled<Value>> {
                let f = T::unwrap(self.0)?;
                Some(Arc::new(move |env| Ok(f(env)?.into_value())))
            }
        }

        match &self.func {
            ExprFn::Value(f) => Ok(Arc::clone(f)),
            ExprFn::Multi(_) => Err(CompileError::MultiValue),
            ExprFn::Void(_) => Err(CompileError::NoValue),
            other => dispatch(self.kind(), Boxed(other)).ok_or_else(|| self.shape_mismatch()),
        }
    }

    /// The closure as one returning `T`, unboxing through the kind accessor
    /// when it was compiled with a different shape.
    pub fn typed<T: Specialize>(&self) -> Result<Compiled<T>, CompileError> {
        if let Some(f) = T::unwrap(&self.func) {
            return Ok(f);
        }
        let boxed = self.boxed()?;
        Ok(Arc::new(move |env| T::from_value(&boxed(env)?)))
    }

    /// All values, boxed, whatever the shape.
    pub fn values(&self) -> Result<Compiled<Vec<Value>>, CompileError> {
        match &self.func {
            ExprFn::Multi(f) => Ok(Arc::clone(f)),
            ExprFn::Void(f) => {
                let f = Arc::clone(f);
                Ok(Arc::new(move |env| {
                    f(env)?;
                    Ok(Vec::new())
                }))
            }
            _ => {
                let f = self.boxed()?;
                Ok(Arc::new(move |env| Ok(vec![f(env)?])))
            }
        }
    }

    /// Evaluate for side effects only.
    pub fn effect(&self) -> Result<Compiled<()>, CompileError> {
        struct Effect<'a>(&'a ExprFn);

        impl KindVisitor for Effect<'_> {
            type Output = Option<Compiled<()>>;

            fn visit<T: Specialize>(self) -> Option<Compiled<()>> {
                let f = T::unwrap(self.0)?;
                Some(Arc::new(move |env| f(env).map(drop)))
            }
        }

        match &self.func {
            ExprFn::Void(f) => Ok(Arc::clone(f)),
            ExprFn::Multi(f) => {
                let f = Arc::clone(f);
                Ok(Arc::new(move |env| f(env).map(drop)))
            }
            other => dispatch(self.kind(), Effect(other)).ok_or_else(|| self.shape_mismatch()),
        }
    }

    #[cold]
    fn shape_mismatch(&self) -> CompileError {
        CompileError::Internal(format!(
            "closure shape does not match static kind {}",
            self.kind()
        ))
    }

    /// Evaluate to a boxed value. Intended for embedders and tests.
    pub fn eval(&self, env: &Arc<Env>) -> EvalResult<Value> {
        match self.boxed() {
            Ok(f) => f(env),
            Err(err) => Err(EvalError::new(err.to_string())),
        }
    }

    /// Evaluate to all values, boxed.
    pub fn eval_all(&self, env: &Arc<Env>) -> EvalResult<Vec<Value>> {
        match self.values() {
            Ok(f) => f(env),
            Err(err) => Err(EvalError::new(err.to_string())),
        }
    }
}
