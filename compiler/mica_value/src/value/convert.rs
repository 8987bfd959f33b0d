//! Explicit conversions between primitive tags.
//!
//! Integer narrowing truncates to the target width (two's complement), the
//! same as an `as` cast. Float to integer truncates toward zero. Nothing here
//! saturates on purpose: `300` converted to `int8` is `44`.

use mica_ir::Kind;

use super::{Complex128, Uintptr, Value};

impl Value {
    /// Build a value of integer `kind` from the low bits of `bits`.
    ///
    /// Returns `None` if `kind` is not an integer kind.
    pub fn from_int_bits(kind: Kind, bits: i64) -> Option<Value> {
        Some(match kind {
            Kind::Int => Value::Int(bits as isize),
            Kind::Int8 => Value::Int8(bits as i8),
            Kind::Int16 => Value::Int16(bits as i16),
            Kind::Int32 => Value::Int32(bits as i32),
            Kind::Int64 => Value::Int64(bits),
            Kind::Uint => Value::Uint(bits as usize),
            Kind::Uint8 => Value::Uint8(bits as u8),
            Kind::Uint16 => Value::Uint16(bits as u16),
            Kind::Uint32 => Value::Uint32(bits as u32),
            Kind::Uint64 => Value::Uint64(bits as u64),
            Kind::Uintptr => Value::Uintptr(Uintptr(bits as usize)),
            _ => return None,
        })
    }

    /// Build a value of float `kind`.
    pub fn from_float(kind: Kind, v: f64) -> Option<Value> {
        match kind {
            Kind::Float32 => Some(Value::Float32(v as f32)),
            Kind::Float64 => Some(Value::Float64(v)),
            _ => None,
        }
    }

    /// The zero value of `kind`. `Other` zeroes to `Nil`.
    pub fn zero(kind: Kind) -> Value {
        match kind {
            Kind::Bool => Value::Bool(false),
            Kind::Float32 | Kind::Float64 => Value::from_float(kind, 0.0).unwrap_or(Value::Nil),
            Kind::Complex64 | Kind::Complex128 => {
                Value::Complex128(Complex128::default()).convert(kind).unwrap_or(Value::Nil)
            }
            Kind::String => Value::string(""),
            Kind::Other => Value::Nil,
            int => Value::from_int_bits(int, 0).unwrap_or(Value::Nil),
        }
    }

    /// Convert to `target`, following the language's conversion rules.
    ///
    /// Returns `None` when no conversion exists between the two kinds (for
    /// example string to int). Converting to `Other` boxes unchanged.
    pub fn convert(&self, target: Kind) -> Option<Value> {
        if let Value::Var(cell) = self {
            return cell.read().convert(target);
        }
        let source = self.kind();
        if source == target || target == Kind::Other {
            return Some(self.clone());
        }
        match target {
            t if t.is_integer() => {
                let bits = if let Some(v) = self.as_i64() {
                    v
                } else if let Some(v) = self.as_u64() {
                    v as i64
                } else if let Some(v) = self.as_f64() {
                    float_to_bits(v, t)
                } else {
                    return None;
                };
                Value::from_int_bits(t, bits)
            }
            t if t.is_float() => {
                let v = if let Some(v) = self.as_i64() {
                    v as f64
                } else if let Some(v) = self.as_u64() {
                    v as f64
                } else {
                    self.as_f64()?
                };
                Value::from_float(t, v)
            }
            Kind::Complex64 => Some(Value::Complex64(self.as_complex()?.narrow())),
            Kind::Complex128 => Some(Value::Complex128(self.as_complex()?)),
            // bool and string only convert from themselves, handled above.
            _ => None,
        }
    }
}

/// Float to integer bits, truncating toward zero. Unsigned targets go through
/// `u64` so values above `i64::MAX` keep their bit pattern.
fn float_to_bits(v: f64, target: Kind) -> i64 {
    if target.is_unsigned() && v >= 0.0 {
        (v as u64) as i64
    } else {
        v as i64
    }
}
