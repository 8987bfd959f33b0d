use super::*;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

#[test]
fn every_kind_has_one_rust_type() {
    assert_eq!(<bool as Scalar>::KIND, Kind::Bool);
    assert_eq!(<isize as Scalar>::KIND, Kind::Int);
    assert_eq!(<i8 as Scalar>::KIND, Kind::Int8);
    assert_eq!(<i16 as Scalar>::KIND, Kind::Int16);
    assert_eq!(<i32 as Scalar>::KIND, Kind::Int32);
    assert_eq!(<i64 as Scalar>::KIND, Kind::Int64);
    assert_eq!(<usize as Scalar>::KIND, Kind::Uint);
    assert_eq!(<u8 as Scalar>::KIND, Kind::Uint8);
    assert_eq!(<u16 as Scalar>::KIND, Kind::Uint16);
    assert_eq!(<u32 as Scalar>::KIND, Kind::Uint32);
    assert_eq!(<u64 as Scalar>::KIND, Kind::Uint64);
    assert_eq!(<Uintptr as Scalar>::KIND, Kind::Uintptr);
    assert_eq!(<f32 as Scalar>::KIND, Kind::Float32);
    assert_eq!(<f64 as Scalar>::KIND, Kind::Float64);
    assert_eq!(<Complex64 as Scalar>::KIND, Kind::Complex64);
    assert_eq!(<Complex128 as Scalar>::KIND, Kind::Complex128);
    assert_eq!(<Str as Scalar>::KIND, Kind::String);
    assert_eq!(<Value as Scalar>::KIND, Kind::Other);
}

#[test]
fn into_value_tags_with_kind() {
    assert_eq!((-5_i16).into_value(), Value::Int16(-5));
    assert_eq!(Uintptr(4).into_value().kind(), Kind::Uintptr);
    assert_eq!(2.5_f32.into_value(), Value::Float32(2.5));
}

#[test]
fn signed_narrowing_truncates() {
    assert_eq!(i8::from_value(&Value::Int64(300)).unwrap(), 44);
    assert_eq!(i16::from_value(&Value::Int(-5)).unwrap(), -5);
    assert_eq!(i8::from_value(&Value::Int32(-129)).unwrap(), 127);
}

#[test]
fn unsigned_narrowing_truncates() {
    assert_eq!(u8::from_value(&Value::Uint64(0x1_02)).unwrap(), 2);
    assert_eq!(
        Uintptr::from_value(&Value::Uint(17)).unwrap(),
        Uintptr(17)
    );
}

#[test]
fn float_and_complex_narrow_from_widest() {
    assert_eq!(f32::from_value(&Value::Float64(0.5)).unwrap(), 0.5);
    assert_eq!(
        Complex64::from_value(&Value::Complex128(Complex128::new(1.0, 2.0))).unwrap(),
        Complex64::new(1.0, 2.0)
    );
}

#[test]
fn wrong_family_is_type_mismatch() {
    let err = i32::from_value(&Value::Uint32(1)).unwrap_err();
    assert_eq!(err.message, "type mismatch: expected int32, got uint32");
    assert!(bool::from_value(&Value::Int(1)).is_err());
    assert!(Str::from_value(&Value::Nil).is_err());
}

#[test]
fn value_scalar_loads_vars() {
    let cell = Value::var(Value::Int8(3));
    assert_eq!(Value::from_value(&cell).unwrap(), Value::Int8(3));
}

#[test]
fn integer_arith_wraps() {
    assert_eq!(Arith::add(i8::MAX, 1), i8::MIN);
    assert_eq!(Arith::sub(0_u16, 1), u16::MAX);
    assert_eq!(Arith::mul(Uintptr(usize::MAX), Uintptr(2)), Uintptr(usize::MAX - 1));
}

#[test]
fn strings_order_lexically() {
    let a = Str::from_value(&Value::string("abc")).unwrap();
    let b = Str::from_value(&Value::string("abd")).unwrap();
    assert!(a.less(&b));
    assert!(!b.less(&a));
}

proptest! {
    #[test]
    fn signed_from_value_matches_as_cast(v in any::<i64>()) {
        let boxed = Value::Int64(v);
        prop_assert_eq!(i8::from_value(&boxed).unwrap(), v as i8);
        prop_assert_eq!(i16::from_value(&boxed).unwrap(), v as i16);
        prop_assert_eq!(i32::from_value(&boxed).unwrap(), v as i32);
        prop_assert_eq!(Value::Int64(v).convert(Kind::Int8), Some(Value::Int8(v as i8)));
    }

    #[test]
    fn unsigned_from_value_matches_as_cast(v in any::<u64>()) {
        let boxed = Value::Uint64(v);
        prop_assert_eq!(u8::from_value(&boxed).unwrap(), v as u8);
        prop_assert_eq!(u16::from_value(&boxed).unwrap(), v as u16);
        prop_assert_eq!(u32::from_value(&boxed).unwrap(), v as u32);
    }
}
