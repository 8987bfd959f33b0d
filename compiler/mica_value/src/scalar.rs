//! Unboxed representations of the specialization kinds.
//!
//! Each `Kind` has exactly one Rust type implementing [`Scalar`]. The
//! compiler writes a closure body once, generic over `T: Scalar`, and picks
//! the instantiation from the static kind. `from_value` is the kind-specific
//! accessor applied when a boxed result crosses into specialized code:
//!
//! - signed kinds read any signed tag as `i64`, then truncate
//! - unsigned kinds (and `uintptr`) read any unsigned tag as `u64`, then truncate
//! - floats and complexes read the widest representation, then narrow
//!
//! A tag from another family is a type mismatch.

use mica_ir::Kind;

use crate::{type_mismatch, Complex128, Complex64, EvalError, EvalResult, Str, Uintptr, Value};

/// A Rust type that a specialized closure can return unboxed.
pub trait Scalar: Clone + PartialEq + Send + Sync + 'static {
    const KIND: Kind;

    /// Unbox, narrowing to this kind's width.
    fn from_value(value: &Value) -> EvalResult<Self>;

    /// Box into the tag matching `KIND`.
    fn into_value(self) -> Value;
}

/// Arithmetic closed over a kind. Integer arithmetic wraps.
pub trait Arith: Scalar + Copy {
    fn add(self, rhs: Self) -> Self;
    fn sub(self, rhs: Self) -> Self;
    fn mul(self, rhs: Self) -> Self;
}

/// Kinds with a total or partial order usable by `<`.
pub trait Ordered: Scalar {
    fn less(&self, rhs: &Self) -> bool;
}

#[cold]
fn wrong_tag(kind: Kind, value: &Value) -> EvalError {
    type_mismatch(kind.name(), value.type_name())
}

macro_rules! signed_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {$(
        impl Scalar for $ty {
            const KIND: Kind = Kind::$variant;

            #[inline]
            #[allow(clippy::unnecessary_cast)]
            fn from_value(value: &Value) -> EvalResult<Self> {
                match value.as_i64() {
                    Some(v) => Ok(v as $ty),
                    None => Err(wrong_tag(Self::KIND, value)),
                }
            }

            #[inline]
            fn into_value(self) -> Value {
                Value::$variant(self)
            }
        }

        impl Arith for $ty {
            #[inline]
            fn add(self, rhs: Self) -> Self {
                self.wrapping_add(rhs)
            }
            #[inline]
            fn sub(self, rhs: Self) -> Self {
                self.wrapping_sub(rhs)
            }
            #[inline]
            fn mul(self, rhs: Self) -> Self {
                self.wrapping_mul(rhs)
            }
        }

        impl Ordered for $ty {
            #[inline]
            fn less(&self, rhs: &Self) -> bool {
                self < rhs
            }
        }
    )*};
}

macro_rules! unsigned_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {$(
        impl Scalar for $ty {
            const KIND: Kind = Kind::$variant;

            #[inline]
            #[allow(clippy::unnecessary_cast)]
            fn from_value(value: &Value) -> EvalResult<Self> {
                match value.as_u64() {
                    Some(v) => Ok(v as $ty),
                    None => Err(wrong_tag(Self::KIND, value)),
                }
            }

            #[inline]
            fn into_value(self) -> Value {
                Value::$variant(self)
            }
        }

        impl Arith for $ty {
            #[inline]
            fn add(self, rhs: Self) -> Self {
                self.wrapping_add(rhs)
            }
            #[inline]
            fn sub(self, rhs: Self) -> Self {
                self.wrapping_sub(rhs)
            }
            #[inline]
            fn mul(self, rhs: Self) -> Self {
                self.wrapping_mul(rhs)
            }
        }

        impl Ordered for $ty {
            #[inline]
            fn less(&self, rhs: &Self) -> bool {
                self < rhs
            }
        }
    )*};
}

signed_scalar! {
    isize => Int,
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
}

unsigned_scalar! {
    usize => Uint,
    u8 => Uint8,
    u16 => Uint16,
    u32 => Uint32,
    u64 => Uint64,
}

impl Scalar for Uintptr {
    const KIND: Kind = Kind::Uintptr;

    #[inline]
    fn from_value(value: &Value) -> EvalResult<Self> {
        match value.as_u64() {
            Some(v) => Ok(Uintptr(v as usize)),
            None => Err(wrong_tag(Self::KIND, value)),
        }
    }

    #[inline]
    fn into_value(self) -> Value {
        Value::Uintptr(self)
    }
}

impl Arith for Uintptr {
    fn add(self, rhs: Self) -> Self {
        Uintptr(self.0.wrapping_add(rhs.0))
    }
    fn sub(self, rhs: Self) -> Self {
        Uintptr(self.0.wrapping_sub(rhs.0))
    }
    fn mul(self, rhs: Self) -> Self {
        Uintptr(self.0.wrapping_mul(rhs.0))
    }
}

impl Ordered for Uintptr {
    fn less(&self, rhs: &Self) -> bool {
        self < rhs
    }
}

impl Scalar for f32 {
    const KIND: Kind = Kind::Float32;

    #[inline]
    fn from_value(value: &Value) -> EvalResult<Self> {
        match value.as_f64() {
            Some(v) => Ok(v as f32),
            None => Err(wrong_tag(Self::KIND, value)),
        }
    }

    #[inline]
    fn into_value(self) -> Value {
        Value::Float32(self)
    }
}

impl Scalar for f64 {
    const KIND: Kind = Kind::Float64;

    #[inline]
    fn from_value(value: &Value) -> EvalResult<Self> {
        value.as_f64().ok_or_else(|| wrong_tag(Self::KIND, value))
    }

    #[inline]
    fn into_value(self) -> Value {
        Value::Float64(self)
    }
}

macro_rules! float_arith {
    ($($ty:ty),*) => {$(
        impl Arith for $ty {
            #[inline]
            fn add(self, rhs: Self) -> Self {
                self + rhs
            }
            #[inline]
            fn sub(self, rhs: Self) -> Self {
                self - rhs
            }
            #[inline]
            fn mul(self, rhs: Self) -> Self {
                self * rhs
            }
        }
    )*};
}

float_arith!(f32, f64, Complex64, Complex128);

impl Ordered for f32 {
    fn less(&self, rhs: &Self) -> bool {
        self < rhs
    }
}

impl Ordered for f64 {
    fn less(&self, rhs: &Self) -> bool {
        self < rhs
    }
}

impl Scalar for Complex64 {
    const KIND: Kind = Kind::Complex64;

    fn from_value(value: &Value) -> EvalResult<Self> {
        match value.as_complex() {
            Some(c) => Ok(c.narrow()),
            None => Err(wrong_tag(Self::KIND, value)),
        }
    }

    fn into_value(self) -> Value {
        Value::Complex64(self)
    }
}

impl Scalar for Complex128 {
    const KIND: Kind = Kind::Complex128;

    fn from_value(value: &Value) -> EvalResult<Self> {
        value.as_complex().ok_or_else(|| wrong_tag(Self::KIND, value))
    }

    fn into_value(self) -> Value {
        Value::Complex128(self)
    }
}

impl Scalar for bool {
    const KIND: Kind = Kind::Bool;

    fn from_value(value: &Value) -> EvalResult<Self> {
        value.as_bool().ok_or_else(|| wrong_tag(Self::KIND, value))
    }

    fn into_value(self) -> Value {
        Value::Bool(self)
    }
}

impl Scalar for Str {
    const KIND: Kind = Kind::String;

    fn from_value(value: &Value) -> EvalResult<Self> {
        value.as_str().ok_or_else(|| wrong_tag(Self::KIND, value))
    }

    fn into_value(self) -> Value {
        Value::Str(self)
    }
}

impl Ordered for Str {
    fn less(&self, rhs: &Self) -> bool {
        **self < **rhs
    }
}

/// The generic fallback: no unboxing, foreign variables are read through.
impl Scalar for Value {
    const KIND: Kind = Kind::Other;

    #[inline]
    fn from_value(value: &Value) -> EvalResult<Self> {
        Ok(value.load())
    }

    #[inline]
    fn into_value(self) -> Value {
        self
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
