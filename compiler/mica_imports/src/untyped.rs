//! Untyped constants.
//!
//! An untyped constant has arbitrary precision, so a package exports it
//! twice: an approximate typed value in `binds`, and its exact text in
//! `untypeds`, marshaled as `kind:text`. Complex text is `re,im`.
//!
//! The approximate integer representation is chosen by [`detect_int_kind`].

use mica_ir::Kind;
use mica_value::{Complex128, Value};

/// Category of an untyped constant.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum UntypedKind {
    Bool,
    Int,
    Rune,
    Float,
    Complex,
    String,
}

impl UntypedKind {
    pub const fn name(self) -> &'static str {
        match self {
            UntypedKind::Bool => "bool",
            UntypedKind::Int => "int",
            UntypedKind::Rune => "rune",
            UntypedKind::Float => "float",
            UntypedKind::Complex => "complex",
            UntypedKind::String => "string",
        }
    }

    pub fn from_name(name: &str) -> Option<UntypedKind> {
        Some(match name {
            "bool" => UntypedKind::Bool,
            "int" => UntypedKind::Int,
            "rune" => UntypedKind::Rune,
            "float" => UntypedKind::Float,
            "complex" => UntypedKind::Complex,
            "string" => UntypedKind::String,
            _ => return None,
        })
    }

    /// The kind an untyped constant takes when nothing else constrains it.
    pub const fn default_kind(self) -> Kind {
        match self {
            UntypedKind::Bool => Kind::Bool,
            UntypedKind::Int => Kind::Int,
            UntypedKind::Rune => Kind::Int32,
            UntypedKind::Float => Kind::Float64,
            UntypedKind::Complex => Kind::Complex128,
            UntypedKind::String => Kind::String,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum UntypedError {
    #[error("malformed untyped constant {0:?}")]
    Malformed(String),
    #[error("unknown untyped constant kind {0:?}")]
    UnknownKind(String),
    #[error("constant {text} overflows {target}")]
    Overflow { text: String, target: Kind },
    #[error("constant {text} truncated to {target}")]
    Truncated { text: String, target: Kind },
    #[error("cannot use untyped {kind} constant as {target}")]
    NotRepresentable { kind: &'static str, target: Kind },
}

/// Exact literal of an untyped constant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UntypedLit {
    pub kind: UntypedKind,
    pub text: String,
}

/// Parsed numeric payload.
#[derive(Copy, Clone)]
enum Exact {
    Int(i128),
    Float(f64),
    Complex(f64, f64),
}

impl UntypedLit {
    pub fn new(kind: UntypedKind, text: impl Into<String>) -> Self {
        UntypedLit {
            kind,
            text: text.into(),
        }
    }

    pub fn marshal(&self) -> String {
        format!("{}:{}", self.kind.name(), self.text)
    }

    pub fn unmarshal(s: &str) -> Result<UntypedLit, UntypedError> {
        let (kind, text) = s
            .split_once(':')
            .ok_or_else(|| UntypedError::Malformed(s.to_string()))?;
        let kind =
            UntypedKind::from_name(kind).ok_or_else(|| UntypedError::UnknownKind(kind.to_string()))?;
        Ok(UntypedLit::new(kind, text))
    }

    /// The approximate typed value stored in `binds`.
    ///
    /// Integers use the representation [`detect_int_kind`] picks; every other
    /// kind uses its default.
    pub fn approximate(&self) -> Result<Value, UntypedError> {
        if self.kind != UntypedKind::Int {
            return self.to_value(self.kind.default_kind());
        }
        let kind = detect_int_kind(&self.text);
        let text = self.text.trim();
        let value = match kind {
            Kind::Int | Kind::Uint32 | Kind::Int64 => text
                .parse::<i64>()
                .ok()
                .and_then(|v| Value::from_int_bits(kind, v)),
            Kind::Uint64 => text.parse::<u64>().ok().map(Value::Uint64),
            _ => text
                .parse::<f64>()
                .ok()
                .and_then(|v| Value::from_float(kind, v)),
        };
        value.ok_or_else(|| UntypedError::Malformed(self.marshal()))
    }

    /// Exact conversion to `target`, as a constant conversion would do it:
    /// out-of-range values and fractional values for integer targets are
    /// errors, not truncations. `Other` yields the default kind.
    pub fn to_value(&self, target: Kind) -> Result<Value, UntypedError> {
        let target = if target == Kind::Other {
            self.kind.default_kind()
        } else {
            target
        };
        match self.kind {
            UntypedKind::Bool => match (target, self.text.trim()) {
                (Kind::Bool, "true") => Ok(Value::Bool(true)),
                (Kind::Bool, "false") => Ok(Value::Bool(false)),
                (Kind::Bool, _) => Err(UntypedError::Malformed(self.marshal())),
                _ => Err(self.not_representable(target)),
            },
            UntypedKind::String if target == Kind::String => Ok(Value::string(&self.text)),
            UntypedKind::String => Err(self.not_representable(target)),
            _ => self.numeric_to_value(self.parse_exact()?, target),
        }
    }

    fn parse_exact(&self) -> Result<Exact, UntypedError> {
        let text = self.text.trim();
        let malformed = || UntypedError::Malformed(self.marshal());
        match self.kind {
            UntypedKind::Int | UntypedKind::Rune => match text.parse::<i128>() {
                Ok(v) => Ok(Exact::Int(v)),
                Err(_) => text.parse::<f64>().map(Exact::Float).map_err(|_| malformed()),
            },
            UntypedKind::Float => text.parse::<f64>().map(Exact::Float).map_err(|_| malformed()),
            UntypedKind::Complex => {
                let (re, im) = text.split_once(',').ok_or_else(malformed)?;
                let re = re.trim().parse::<f64>().map_err(|_| malformed())?;
                let im = im.trim().parse::<f64>().map_err(|_| malformed())?;
                Ok(Exact::Complex(re, im))
            }
            UntypedKind::Bool | UntypedKind::String => Err(malformed()),
        }
    }

    fn numeric_to_value(&self, exact: Exact, target: Kind) -> Result<Value, UntypedError> {
        // A complex constant with zero imaginary part is a real constant.
        let exact = match exact {
            Exact::Complex(re, im) if im == 0.0 && !target.is_complex() => Exact::Float(re),
            other => other,
        };
        match (exact, target) {
            (_, t) if t.is_complex() => {
                let c = match exact {
                    Exact::Int(v) => Complex128::new(v as f64, 0.0),
                    Exact::Float(f) => Complex128::new(f, 0.0),
                    Exact::Complex(re, im) => Complex128::new(re, im),
                };
                Value::Complex128(c)
                    .convert(t)
                    .ok_or_else(|| self.not_representable(t))
            }
            (Exact::Int(v), t) if t.is_integer() => self.int_in_range(v, t),
            (Exact::Float(f), t) if t.is_integer() => {
                if !f.is_finite() || f.fract() != 0.0 {
                    return Err(UntypedError::Truncated {
                        text: self.text.clone(),
                        target: t,
                    });
                }
                self.int_in_range(f as i128, t)
            }
            (Exact::Int(v), t) if t.is_float() => self.float_in_range(v as f64, t),
            (Exact::Float(f), t) if t.is_float() => self.float_in_range(f, t),
            (_, t) => Err(self.not_representable(t)),
        }
    }

    fn int_in_range(&self, v: i128, target: Kind) -> Result<Value, UntypedError> {
        let (min, max) = int_bounds(target);
        if v < min || v > max {
            return Err(UntypedError::Overflow {
                text: self.text.clone(),
                target,
            });
        }
        Value::from_int_bits(target, v as i64).ok_or_else(|| self.not_representable(target))
    }

    fn float_in_range(&self, v: f64, target: Kind) -> Result<Value, UntypedError> {
        let overflows = match target {
            Kind::Float32 => v.is_finite() && !(v as f32).is_finite(),
            _ => false,
        };
        if overflows {
            return Err(UntypedError::Overflow {
                text: self.text.clone(),
                target,
            });
        }
        Value::from_float(target, v).ok_or_else(|| self.not_representable(target))
    }

    fn not_representable(&self, target: Kind) -> UntypedError {
        UntypedError::NotRepresentable {
            kind: self.kind.name(),
            target,
        }
    }
}

fn int_bounds(kind: Kind) -> (i128, i128) {
    match kind {
        Kind::Int => (isize::MIN as i128, isize::MAX as i128),
        Kind::Int8 => (i8::MIN.into(), i8::MAX.into()),
        Kind::Int16 => (i16::MIN.into(), i16::MAX.into()),
        Kind::Int32 => (i32::MIN.into(), i32::MAX.into()),
        Kind::Int64 => (i64::MIN.into(), i64::MAX.into()),
        Kind::Uint | Kind::Uintptr => (0, usize::MAX as i128),
        Kind::Uint8 => (0, u8::MAX.into()),
        Kind::Uint16 => (0, u16::MAX.into()),
        Kind::Uint32 => (0, u32::MAX.into()),
        Kind::Uint64 => (0, u64::MAX.into()),
        _ => (0, -1),
    }
}

/// Pick the representation of an untyped integer constant's approximate
/// value, trying in order:
///
/// 1. fits `int32`: the default `int`
/// 2. fits `uint32`: `uint32`
/// 3. fits `int64`: `int64`
/// 4. fits `uint64`: `uint64`
/// 5. representable as `float32` without loss: `float32`
/// 6. otherwise `float64`
///
/// Cases 5 and 6 lose the integer; callers should warn. Text that does not
/// parse at all keeps the default.
pub fn detect_int_kind(text: &str) -> Kind {
    let text = text.trim();
    if let Ok(i) = text.parse::<i64>() {
        return if i32::try_from(i).is_ok() {
            Kind::Int
        } else if u32::try_from(i).is_ok() {
            Kind::Uint32
        } else {
            Kind::Int64
        };
    }
    if text.parse::<u64>().is_ok() {
        return Kind::Uint64;
    }
    match text.parse::<f64>() {
        Ok(f) => {
            let f = f.abs();
            let smallest = f64::from(f32::from_bits(1));
            if f == f64::from(f as f32) && f <= f64::from(f32::MAX) && f >= smallest {
                Kind::Float32
            } else {
                Kind::Float64
            }
        }
        Err(_) => Kind::Int,
    }
}
