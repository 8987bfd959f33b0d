//! Static type descriptors.
//!
//! `TypeDesc` is what the front end attaches to literals, parameters and
//! conversions, and what the registry exports for foreign types. It is cheap
//! to clone: every composite descriptor sits behind an `Arc`.

use std::fmt::Write as _;
use std::sync::Arc;

use crate::{Kind, Name, StringLookup};

/// A static type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeDesc {
    /// A primitive type. Never holds `Kind::Other`.
    Basic(Kind),
    Func(Arc<FuncType>),
    Named(Arc<NamedType>),
    Interface(Arc<InterfaceType>),
    Struct(Arc<StructType>),
    Pointer(Arc<TypeDesc>),
    Slice(Arc<TypeDesc>),
    /// An unsubstituted type parameter.
    TypeParam(Name),
}

/// Function signature.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct FuncType {
    pub params: Vec<TypeDesc>,
    pub results: Vec<TypeDesc>,
    /// The last parameter is a slice collecting trailing arguments.
    pub variadic: bool,
    pub type_params: Vec<Name>,
}

/// A declared (named) type with its underlying type and method set.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NamedType {
    pub package: Name,
    pub name: Name,
    pub underlying: TypeDesc,
    pub type_params: Vec<Name>,
    pub type_args: Vec<TypeDesc>,
    pub methods: Vec<MethodDesc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MethodDesc {
    pub name: Name,
    pub sig: FuncType,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct InterfaceType {
    pub methods: Vec<MethodDesc>,
    /// The interface lists type terms (`~int | string`) and is only usable
    /// as a generic constraint.
    pub type_set: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct StructType {
    pub fields: Vec<FieldDesc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldDesc {
    pub name: Name,
    pub ty: TypeDesc,
    pub embedded: bool,
}

impl FuncType {
    pub fn new(params: Vec<TypeDesc>, results: Vec<TypeDesc>) -> Self {
        FuncType {
            params,
            results,
            variadic: false,
            type_params: Vec::new(),
        }
    }

    #[must_use]
    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }

    #[must_use]
    pub fn with_type_params(mut self, type_params: Vec<Name>) -> Self {
        self.type_params = type_params;
        self
    }

    /// Whether the signature mentions a type parameter anywhere.
    pub fn is_generic(&self) -> bool {
        !self.type_params.is_empty()
            || self
                .params
                .iter()
                .chain(&self.results)
                .any(TypeDesc::is_generic)
    }
}

impl TypeDesc {
    pub const BOOL: TypeDesc = TypeDesc::Basic(Kind::Bool);
    pub const INT: TypeDesc = TypeDesc::Basic(Kind::Int);
    pub const INT64: TypeDesc = TypeDesc::Basic(Kind::Int64);
    pub const UINT64: TypeDesc = TypeDesc::Basic(Kind::Uint64);
    pub const FLOAT64: TypeDesc = TypeDesc::Basic(Kind::Float64);
    pub const STRING: TypeDesc = TypeDesc::Basic(Kind::String);

    /// Descriptor for a primitive kind. `Kind::Other` maps to the empty
    /// interface, the only unconstrained composite.
    pub fn basic(kind: Kind) -> TypeDesc {
        if kind == Kind::Other {
            TypeDesc::any()
        } else {
            TypeDesc::Basic(kind)
        }
    }

    /// The empty interface, which every value satisfies.
    pub fn any() -> TypeDesc {
        TypeDesc::Interface(Arc::new(InterfaceType::default()))
    }

    pub fn func(params: Vec<TypeDesc>, results: Vec<TypeDesc>) -> TypeDesc {
        TypeDesc::Func(Arc::new(FuncType::new(params, results)))
    }

    pub fn from_func(sig: FuncType) -> TypeDesc {
        TypeDesc::Func(Arc::new(sig))
    }

    pub fn pointer(elem: TypeDesc) -> TypeDesc {
        TypeDesc::Pointer(Arc::new(elem))
    }

    pub fn slice(elem: TypeDesc) -> TypeDesc {
        TypeDesc::Slice(Arc::new(elem))
    }

    pub fn named(named: NamedType) -> TypeDesc {
        TypeDesc::Named(Arc::new(named))
    }

    /// The specialization kind. Named types take the kind of their
    /// underlying type; every composite is `Kind::Other`.
    pub fn kind(&self) -> Kind {
        match self {
            TypeDesc::Basic(kind) => *kind,
            TypeDesc::Named(named) => named.underlying.kind(),
            _ => Kind::Other,
        }
    }

    /// The signature, looking through named function types.
    pub fn func_type(&self) -> Option<&FuncType> {
        match self {
            TypeDesc::Func(sig) => Some(sig),
            TypeDesc::Named(named) => named.underlying.func_type(),
            _ => None,
        }
    }

    pub fn is_interface(&self) -> bool {
        match self {
            TypeDesc::Interface(_) => true,
            TypeDesc::Named(named) => named.underlying.is_interface(),
            _ => false,
        }
    }

    /// The interface descriptor, looking through named types.
    pub fn interface(&self) -> Option<&InterfaceType> {
        match self {
            TypeDesc::Interface(iface) => Some(iface),
            TypeDesc::Named(named) => named.underlying.interface(),
            _ => None,
        }
    }

    /// Whether this type cannot be instantiated without type arguments.
    ///
    /// Uninstantiated generic named types, generic signatures, bare type
    /// parameters and constraint-only interfaces all qualify.
    pub fn is_generic(&self) -> bool {
        match self {
            TypeDesc::Named(named) => {
                if !named.type_params.is_empty() && named.type_args.is_empty() {
                    return true;
                }
                named.underlying.is_generic()
            }
            TypeDesc::Func(sig) => sig.is_generic(),
            TypeDesc::Interface(iface) => iface.type_set,
            TypeDesc::TypeParam(_) => true,
            TypeDesc::Basic(_)
            | TypeDesc::Struct(_)
            | TypeDesc::Pointer(_)
            | TypeDesc::Slice(_) => false,
        }
    }

    /// Whether a value of this type may be passed where `target` is expected.
    ///
    /// Identical types are assignable, and every type is assignable to an
    /// interface. Method sets are checked by the callee, not here.
    pub fn assignable_to(&self, target: &TypeDesc) -> bool {
        self == target || target.is_interface()
    }

    /// Render the type for diagnostics.
    pub fn display(&self, names: &dyn StringLookup) -> String {
        let mut out = String::new();
        self.write_to(&mut out, names);
        out
    }

    fn write_to(&self, out: &mut String, names: &dyn StringLookup) {
        match self {
            TypeDesc::Basic(kind) => out.push_str(kind.name()),
            TypeDesc::Func(sig) => write_sig(out, sig, names),
            TypeDesc::Named(named) => {
                let package = names.lookup(named.package);
                if !package.is_empty() {
                    out.push_str(package);
                    out.push('.');
                }
                out.push_str(names.lookup(named.name));
                if !named.type_args.is_empty() {
                    out.push('[');
                    for (idx, arg) in named.type_args.iter().enumerate() {
                        if idx > 0 {
                            out.push_str(", ");
                        }
                        arg.write_to(out, names);
                    }
                    out.push(']');
                }
            }
            TypeDesc::Interface(iface) if iface.methods.is_empty() && !iface.type_set => {
                out.push_str("interface {}");
            }
            TypeDesc::Interface(iface) => {
                let _ = write!(out, "interface {{ {} methods }}", iface.methods.len());
            }
            TypeDesc::Struct(st) => {
                let _ = write!(out, "struct {{ {} fields }}", st.fields.len());
            }
            TypeDesc::Pointer(elem) => {
                out.push('*');
                elem.write_to(out, names);
            }
            TypeDesc::Slice(elem) => {
                out.push_str("[]");
                elem.write_to(out, names);
            }
            TypeDesc::TypeParam(name) => out.push_str(names.lookup(*name)),
        }
    }
}

fn write_sig(out: &mut String, sig: &FuncType, names: &dyn StringLookup) {
    out.push_str("func(");
    for (idx, param) in sig.params.iter().enumerate() {
        if idx > 0 {
            out.push_str(", ");
        }
        if sig.variadic && idx + 1 == sig.params.len() {
            out.push_str("...");
        }
        param.write_to(out, names);
    }
    out.push(')');
    match sig.results.as_slice() {
        [] => {}
        [single] => {
            out.push(' ');
            single.write_to(out, names);
        }
        many => {
            out.push_str(" (");
            for (idx, result) in many.iter().enumerate() {
                if idx > 0 {
                    out.push_str(", ");
                }
                result.write_to(out, names);
            }
            out.push(')');
        }
    }
}

/// How many values a callee returns, and for one value, its kind.
///
/// Every signature maps to exactly one shape.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ReturnShape {
    Zero,
    One(Kind),
    Many(usize),
}

impl ReturnShape {
    pub fn classify(sig: &FuncType) -> ReturnShape {
        match sig.results.as_slice() {
            [] => ReturnShape::Zero,
            [single] => ReturnShape::One(single.kind()),
            many => ReturnShape::Many(many.len()),
        }
    }

    pub fn arity(self) -> usize {
        match self {
            ReturnShape::Zero => 0,
            ReturnShape::One(_) => 1,
            ReturnShape::Many(n) => n,
        }
    }
}

#[cfg(test)]
mod tests;
