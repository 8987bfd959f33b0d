use super::*;
use std::sync::Arc;

use mica_ir::{FieldDesc, FuncType, InterfaceType, MethodDesc, NamedType, StringInterner, StructType};
use pretty_assertions::assert_eq;

fn method(interner: &StringInterner, name: &str) -> MethodDesc {
    MethodDesc {
        name: interner.intern(name),
        sig: FuncType::default(),
    }
}

fn named_struct(
    interner: &StringInterner,
    name: &str,
    fields: Vec<FieldDesc>,
    methods: Vec<MethodDesc>,
) -> TypeDesc {
    TypeDesc::named(NamedType {
        package: interner.intern("bufio"),
        name: interner.intern(name),
        underlying: TypeDesc::Struct(Arc::new(StructType { fields })),
        type_params: Vec::new(),
        type_args: Vec::new(),
        methods,
    })
}

fn embed(interner: &StringInterner, ty: TypeDesc) -> FieldDesc {
    FieldDesc {
        name: interner.intern("embedded"),
        ty,
        embedded: true,
    }
}

fn noop(name: &str, sig: FuncType) -> Function {
    Function::native(name, sig, |_| Ok(Vec::new()))
}

#[test]
fn unexported_names_are_ignored() {
    let interner = StringInterner::new();
    let (pkg, warnings) = PackageBuilder::from_decls(
        "example.com/p",
        "p",
        &interner,
        vec![ExportDecl::Const {
            name: "internal".to_string(),
            value: Value::Int(1),
            ty: TypeDesc::INT,
        }],
    );
    assert!(pkg.is_none());
    assert!(warnings.is_empty());
}

#[test]
fn generic_declarations_are_skipped_with_warning() {
    let interner = StringInterner::new();
    let t = interner.intern("T");
    let generic_sig = FuncType::new(vec![TypeDesc::TypeParam(t)], vec![TypeDesc::TypeParam(t)])
        .with_type_params(vec![t]);
    let generic_type = TypeDesc::named(NamedType {
        package: interner.intern("slices"),
        name: interner.intern("Seq"),
        underlying: TypeDesc::slice(TypeDesc::TypeParam(t)),
        type_params: vec![t],
        type_args: Vec::new(),
        methods: Vec::new(),
    });

    let (pkg, warnings) = PackageBuilder::from_decls(
        "slices",
        "slices",
        &interner,
        vec![
            ExportDecl::Func {
                name: "Max".to_string(),
                function: noop("slices.Max", generic_sig),
            },
            ExportDecl::Type {
                name: "Seq".to_string(),
                ty: generic_type,
                proxy: None,
            },
            ExportDecl::Func {
                name: "Len".to_string(),
                function: noop("slices.Len", FuncType::new(Vec::new(), vec![TypeDesc::INT])),
            },
        ],
    );

    let Some(pkg) = pkg else {
        panic!("package with exports must be built");
    };
    assert!(pkg.binds.contains_key("Len"));
    assert!(!pkg.binds.contains_key("Max"));
    assert!(!pkg.types.contains_key("Seq"));
    let skipped: Vec<&str> = warnings.iter().map(|w| w.name.as_str()).collect();
    assert_eq!(skipped, vec!["Max", "Seq"]);
    assert_eq!(
        warnings[0].to_string(),
        "package \"slices\": Max: importing generic functions is not supported yet"
    );
}

#[test]
fn untyped_constants_keep_exact_text() {
    let interner = StringInterner::new();
    let (pkg, warnings) = PackageBuilder::from_decls(
        "math",
        "math",
        &interner,
        vec![
            ExportDecl::Untyped {
                name: "MaxUint32".to_string(),
                lit: UntypedLit::new(UntypedKind::Int, "4294967295"),
            },
            ExportDecl::Untyped {
                name: "Huge".to_string(),
                lit: UntypedLit::new(UntypedKind::Int, "18446744073709551616"),
            },
        ],
    );
    let Some(pkg) = pkg else {
        panic!("math must be built");
    };

    let max = &pkg.binds["MaxUint32"];
    assert_eq!(max.value(), Value::Uint32(u32::MAX));
    assert_eq!(pkg.untypeds["MaxUint32"], "int:4294967295");
    assert_eq!(pkg.binds["Huge"].value(), Value::Float32(18_446_744_073_709_551_616.0));
    assert_eq!(pkg.untypeds["Huge"], "int:18446744073709551616");

    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].name, "Huge");
    assert!(warnings[0].message.contains("converting to float32"));
}

#[test]
fn interface_proxies_are_registered() {
    let interner = StringInterner::new();
    let reader = TypeDesc::Interface(Arc::new(InterfaceType {
        methods: vec![method(&interner, "Read")],
        type_set: false,
    }));
    let proxy = named_struct(&interner, "P_Reader", Vec::new(), Vec::new());

    let (pkg, _) = PackageBuilder::from_decls(
        "io",
        "io",
        &interner,
        vec![
            ExportDecl::Type {
                name: "Reader".to_string(),
                ty: reader.clone(),
                proxy: Some(proxy.clone()),
            },
            ExportDecl::Type {
                name: "Closer".to_string(),
                ty: reader,
                proxy: None,
            },
            ExportDecl::Type {
                name: "Any".to_string(),
                ty: TypeDesc::any(),
                proxy: Some(proxy.clone()),
            },
        ],
    );
    let Some(pkg) = pkg else {
        panic!("io must be built");
    };
    assert_eq!(pkg.proxies.get("Reader"), Some(&proxy));
    assert_eq!(pkg.proxies.get("Closer"), None);
    assert_eq!(pkg.proxies.get("Any"), None);
    assert_eq!(pkg.types.len(), 3);
}

#[test]
fn wrappers_list_promoted_methods() {
    let interner = StringInterner::new();
    let reader = named_struct(
        &interner,
        "Reader",
        Vec::new(),
        vec![method(&interner, "Read"), method(&interner, "Reset")],
    );
    let writer = named_struct(
        &interner,
        "Writer",
        Vec::new(),
        vec![method(&interner, "Write"), method(&interner, "Flush")],
    );
    let inner = named_struct(
        &interner,
        "inner",
        vec![embed(&interner, TypeDesc::pointer(writer))],
        vec![method(&interner, "Size")],
    );
    let read_writer = named_struct(
        &interner,
        "ReadWriter",
        vec![embed(&interner, TypeDesc::pointer(reader)), embed(&interner, inner)],
        vec![method(&interner, "Reset")],
    );

    let (pkg, _) = PackageBuilder::from_decls(
        "bufio",
        "bufio",
        &interner,
        vec![ExportDecl::Type {
            name: "ReadWriter".to_string(),
            ty: read_writer,
            proxy: None,
        }],
    );
    let Some(pkg) = pkg else {
        panic!("bufio must be built");
    };
    assert_eq!(
        pkg.wrappers["ReadWriter"],
        vec!["Flush", "Read", "Size", "Write"]
    );
}

#[test]
fn plain_structs_have_no_wrappers() {
    let interner = StringInterner::new();
    let plain = named_struct(&interner, "Point", Vec::new(), vec![method(&interner, "Add")]);
    let mut builder = PackageBuilder::new("image", "image", &interner);
    builder.add(ExportDecl::Type {
        name: "Point".to_string(),
        ty: plain,
        proxy: None,
    });
    let (pkg, _) = builder.finish();
    assert!(pkg.is_some_and(|p| p.wrappers.is_empty() && p.types.contains_key("Point")));
}

#[test]
fn exported_means_leading_uppercase() {
    assert!(is_exported("Println"));
    assert!(is_exported("Ärger"));
    assert!(!is_exported("println"));
    assert!(!is_exported("_Hidden"));
    assert!(!is_exported(""));
}
