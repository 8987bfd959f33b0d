//! Runtime values.
//!
//! `Value` is the boxed representation: what travels through the call
//! invoker, sits in environment slots, and is stored in the import registry.
//! Specialized closures never build one on their hot path; they work with the
//! unboxed Rust type of their kind (see [`crate::Scalar`]).
//!
//! Heap payloads go through `Heap<T>`, whose constructor is private to this
//! module, so every allocation happens in a `Value::` factory method.

mod complex;
mod convert;
mod heap;

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use mica_ir::{Kind, TypeDesc};
use parking_lot::RwLock;

use crate::Function;

pub use complex::{Complex128, Complex64};
pub use heap::Heap;

/// Immutable shared string.
pub type Str = Heap<str>;

/// Pointer-sized unsigned integer, kept distinct from `usize` (`uint`) so the
/// two kinds have different Rust types.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Uintptr(pub usize);

/// Storage cell of a variable exported by a foreign package.
pub type SharedVar = Heap<RwLock<Value>>;

/// A value whose type the core does not model: a struct, a pointer, a slice
/// produced by a foreign callable. The payload is only ever handed back to
/// foreign code.
#[derive(Clone)]
pub struct Opaque {
    pub ty: TypeDesc,
    pub payload: Arc<dyn Any + Send + Sync>,
}

impl Opaque {
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }
}

/// A dynamically typed runtime value.
///
/// The primitive variants mirror `Kind` one to one. When a compiled closure
/// was specialized for a kind, the values it produces carry exactly that tag.
#[derive(Clone)]
pub enum Value {
    Bool(bool),
    Int(isize),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Uint(usize),
    Uint8(u8),
    Uint16(u16),
    Uint32(u32),
    Uint64(u64),
    Uintptr(Uintptr),
    Float32(f32),
    Float64(f64),
    Complex64(Complex64),
    Complex128(Complex128),
    Str(Str),

    /// Zero value of a reference type.
    Nil,
    /// Callable handle.
    Func(Function),
    /// Foreign variable storage, read through on every access.
    Var(SharedVar),
    /// Arbitrary boxed payload.
    Opaque(Opaque),
}

// Factory methods

impl Value {
    #[inline]
    pub fn string(s: impl AsRef<str>) -> Self {
        Value::Str(Heap::from_text(s.as_ref()))
    }

    #[inline]
    pub fn func(function: Function) -> Self {
        Value::Func(function)
    }

    /// Wrap a foreign variable's storage, initialized to `init`.
    pub fn var(init: Value) -> Self {
        Value::Var(Heap::new(RwLock::new(init)))
    }

    pub fn opaque<T: Any + Send + Sync>(ty: TypeDesc, payload: T) -> Self {
        Value::Opaque(Opaque {
            ty,
            payload: Arc::new(payload),
        })
    }
}

// Accessors

impl Value {
    /// The specialization kind of the tag. Generic variants are `Other`.
    pub fn kind(&self) -> Kind {
        match self {
            Value::Bool(_) => Kind::Bool,
            Value::Int(_) => Kind::Int,
            Value::Int8(_) => Kind::Int8,
            Value::Int16(_) => Kind::Int16,
            Value::Int32(_) => Kind::Int32,
            Value::Int64(_) => Kind::Int64,
            Value::Uint(_) => Kind::Uint,
            Value::Uint8(_) => Kind::Uint8,
            Value::Uint16(_) => Kind::Uint16,
            Value::Uint32(_) => Kind::Uint32,
            Value::Uint64(_) => Kind::Uint64,
            Value::Uintptr(_) => Kind::Uintptr,
            Value::Float32(_) => Kind::Float32,
            Value::Float64(_) => Kind::Float64,
            Value::Complex64(_) => Kind::Complex64,
            Value::Complex128(_) => Kind::Complex128,
            Value::Str(_) => Kind::String,
            Value::Var(cell) => cell.read().kind(),
            Value::Nil | Value::Func(_) | Value::Opaque(_) => Kind::Other,
        }
    }

    /// Name of the tag for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Func(_) => "func",
            Value::Var(_) => "var",
            Value::Opaque(_) => "opaque",
            other => other.kind().name(),
        }
    }

    /// Signed accessor: any signed integer tag, widened to `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v as i64),
            Value::Int8(v) => Some(i64::from(*v)),
            Value::Int16(v) => Some(i64::from(*v)),
            Value::Int32(v) => Some(i64::from(*v)),
            Value::Int64(v) => Some(*v),
            Value::Var(cell) => cell.read().as_i64(),
            _ => None,
        }
    }

    /// Unsigned accessor: any unsigned integer tag, widened to `u64`.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Uint(v) => Some(*v as u64),
            Value::Uint8(v) => Some(u64::from(*v)),
            Value::Uint16(v) => Some(u64::from(*v)),
            Value::Uint32(v) => Some(u64::from(*v)),
            Value::Uint64(v) => Some(*v),
            Value::Uintptr(v) => Some(v.0 as u64),
            Value::Var(cell) => cell.read().as_u64(),
            _ => None,
        }
    }

    /// Float accessor: either float tag, widened to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float32(v) => Some(f64::from(*v)),
            Value::Float64(v) => Some(*v),
            Value::Var(cell) => cell.read().as_f64(),
            _ => None,
        }
    }

    /// Complex accessor: either complex tag, widened to `complex128`.
    pub fn as_complex(&self) -> Option<Complex128> {
        match self {
            Value::Complex64(c) => Some(c.widen()),
            Value::Complex128(c) => Some(*c),
            Value::Var(cell) => cell.read().as_complex(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Var(cell) => cell.read().as_bool(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<Str> {
        match self {
            Value::Str(s) => Some(s.clone()),
            Value::Var(cell) => cell.read().as_str(),
            _ => None,
        }
    }

    pub fn as_func(&self) -> Option<Function> {
        match self {
            Value::Func(f) => Some(f.clone()),
            Value::Var(cell) => cell.read().as_func(),
            _ => None,
        }
    }

    /// The current content of a foreign variable, or the value itself.
    pub fn load(&self) -> Value {
        match self {
            Value::Var(cell) => cell.read().clone(),
            other => other.clone(),
        }
    }

    /// Store into a foreign variable. Returns `false` for non-variables.
    pub fn store(&self, value: Value) -> bool {
        match self {
            Value::Var(cell) => {
                *cell.write() = value;
                true
            }
            _ => false,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Int8(a), Value::Int8(b)) => a == b,
            (Value::Int16(a), Value::Int16(b)) => a == b,
            (Value::Int32(a), Value::Int32(b)) => a == b,
            (Value::Int64(a), Value::Int64(b)) => a == b,
            (Value::Uint(a), Value::Uint(b)) => a == b,
            (Value::Uint8(a), Value::Uint8(b)) => a == b,
            (Value::Uint16(a), Value::Uint16(b)) => a == b,
            (Value::Uint32(a), Value::Uint32(b)) => a == b,
            (Value::Uint64(a), Value::Uint64(b)) => a == b,
            (Value::Uintptr(a), Value::Uintptr(b)) => a == b,
            (Value::Float32(a), Value::Float32(b)) => a == b,
            (Value::Float64(a), Value::Float64(b)) => a == b,
            (Value::Complex64(a), Value::Complex64(b)) => a == b,
            (Value::Complex128(a), Value::Complex128(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Nil, Value::Nil) => true,
            (Value::Func(a), Value::Func(b)) => a.ptr_eq(b),
            (Value::Var(a), Value::Var(b)) => a.ptr_eq(b),
            (Value::Opaque(a), Value::Opaque(b)) => Arc::ptr_eq(&a.payload, &b.payload),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "Bool({v})"),
            Value::Int(v) => write!(f, "Int({v})"),
            Value::Int8(v) => write!(f, "Int8({v})"),
            Value::Int16(v) => write!(f, "Int16({v})"),
            Value::Int32(v) => write!(f, "Int32({v})"),
            Value::Int64(v) => write!(f, "Int64({v})"),
            Value::Uint(v) => write!(f, "Uint({v})"),
            Value::Uint8(v) => write!(f, "Uint8({v})"),
            Value::Uint16(v) => write!(f, "Uint16({v})"),
            Value::Uint32(v) => write!(f, "Uint32({v})"),
            Value::Uint64(v) => write!(f, "Uint64({v})"),
            Value::Uintptr(v) => write!(f, "Uintptr({})", v.0),
            Value::Float32(v) => write!(f, "Float32({v})"),
            Value::Float64(v) => write!(f, "Float64({v})"),
            Value::Complex64(v) => write!(f, "Complex64{v}"),
            Value::Complex128(v) => write!(f, "Complex128{v}"),
            Value::Str(s) => write!(f, "Str({:?})", &**s),
            Value::Nil => write!(f, "Nil"),
            Value::Func(func) => write!(f, "Func({})", func.name()),
            Value::Var(cell) => write!(f, "Var({:?})", &*cell.read()),
            Value::Opaque(_) => write!(f, "Opaque"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Int8(v) => write!(f, "{v}"),
            Value::Int16(v) => write!(f, "{v}"),
            Value::Int32(v) => write!(f, "{v}"),
            Value::Int64(v) => write!(f, "{v}"),
            Value::Uint(v) => write!(f, "{v}"),
            Value::Uint8(v) => write!(f, "{v}"),
            Value::Uint16(v) => write!(f, "{v}"),
            Value::Uint32(v) => write!(f, "{v}"),
            Value::Uint64(v) => write!(f, "{v}"),
            Value::Uintptr(v) => write!(f, "{:#x}", v.0),
            Value::Float32(v) => write!(f, "{v}"),
            Value::Float64(v) => write!(f, "{v}"),
            Value::Complex64(v) => write!(f, "{v}"),
            Value::Complex128(v) => write!(f, "{v}"),
            Value::Str(s) => f.write_str(s),
            Value::Nil => f.write_str("<nil>"),
            Value::Func(func) => write!(f, "<func {}>", func.name()),
            Value::Var(cell) => write!(f, "{}", &*cell.read()),
            Value::Opaque(_) => f.write_str("<opaque>"),
        }
    }
}
