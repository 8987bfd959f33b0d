use super::*;
use crate::StringInterner;
use pretty_assertions::assert_eq;

fn named(interner: &StringInterner, name: &str, underlying: TypeDesc) -> NamedType {
    NamedType {
        package: interner.intern("os"),
        name: interner.intern(name),
        underlying,
        type_params: Vec::new(),
        type_args: Vec::new(),
        methods: Vec::new(),
    }
}

#[test]
fn named_types_take_underlying_kind() {
    let interner = StringInterner::new();
    let mode = TypeDesc::named(named(&interner, "FileMode", TypeDesc::Basic(Kind::Uint32)));
    assert_eq!(mode.kind(), Kind::Uint32);

    let file = TypeDesc::named(named(
        &interner,
        "File",
        TypeDesc::Struct(Arc::new(StructType::default())),
    ));
    assert_eq!(file.kind(), Kind::Other);
    assert_eq!(TypeDesc::pointer(TypeDesc::INT).kind(), Kind::Other);
}

#[test]
fn basic_other_is_the_empty_interface() {
    let any = TypeDesc::basic(Kind::Other);
    assert!(any.is_interface());
    assert_eq!(any.kind(), Kind::Other);
    assert_eq!(TypeDesc::basic(Kind::Int8), TypeDesc::Basic(Kind::Int8));
}

#[test]
fn return_shape_is_exhaustive() {
    let zero = FuncType::new(vec![TypeDesc::INT], vec![]);
    let one = FuncType::new(vec![], vec![TypeDesc::Basic(Kind::Int16)]);
    let other = FuncType::new(vec![], vec![TypeDesc::slice(TypeDesc::INT)]);
    let many = FuncType::new(vec![], vec![TypeDesc::INT, TypeDesc::STRING]);

    assert_eq!(ReturnShape::classify(&zero), ReturnShape::Zero);
    assert_eq!(ReturnShape::classify(&one), ReturnShape::One(Kind::Int16));
    assert_eq!(ReturnShape::classify(&other), ReturnShape::One(Kind::Other));
    assert_eq!(ReturnShape::classify(&many), ReturnShape::Many(2));
    assert_eq!(ReturnShape::classify(&many).arity(), 2);
}

#[test]
fn generic_detection() {
    let interner = StringInterner::new();
    let t = interner.intern("T");

    assert!(TypeDesc::TypeParam(t).is_generic());
    assert!(TypeDesc::from_func(FuncType::new(vec![], vec![]).with_type_params(vec![t])).is_generic());
    assert!(TypeDesc::func(vec![TypeDesc::TypeParam(t)], vec![]).is_generic());

    let mut list = named(&interner, "List", TypeDesc::slice(TypeDesc::TypeParam(t)));
    list.type_params = vec![t];
    assert!(TypeDesc::named(list.clone()).is_generic());

    let constraint = TypeDesc::Interface(Arc::new(InterfaceType {
        methods: Vec::new(),
        type_set: true,
    }));
    assert!(constraint.is_generic());

    assert!(!TypeDesc::func(vec![TypeDesc::INT], vec![TypeDesc::STRING]).is_generic());
    assert!(!TypeDesc::any().is_generic());
}

#[test]
fn assignability() {
    assert!(TypeDesc::INT.assignable_to(&TypeDesc::INT));
    assert!(TypeDesc::INT.assignable_to(&TypeDesc::any()));
    assert!(!TypeDesc::INT.assignable_to(&TypeDesc::INT64));
}

#[test]
fn display_signatures() {
    let interner = StringInterner::new();
    let sig = FuncType::new(
        vec![TypeDesc::STRING, TypeDesc::slice(TypeDesc::any())],
        vec![TypeDesc::INT, TypeDesc::pointer(TypeDesc::FLOAT64)],
    )
    .variadic();
    assert_eq!(
        TypeDesc::from_func(sig).display(&interner),
        "func(string, ...[]interface {}) (int, *float64)"
    );

    let mode = TypeDesc::named(named(&interner, "FileMode", TypeDesc::Basic(Kind::Uint32)));
    assert_eq!(mode.display(&interner), "os.FileMode");
}
