use mica_ir::TypeDesc;
use mica_value::{Function, Value};

/// A named value exported by a package.
#[derive(Clone, Debug)]
pub enum Binding {
    /// A constant. Untyped constants carry their approximate typed value
    /// here and their exact text in `Package::untypeds`.
    Const { value: Value, ty: TypeDesc },
    /// An addressable variable. `cell` is a `Value::Var`, shared by every
    /// program that imports the package.
    Var { cell: Value, ty: TypeDesc },
    Func(Function),
}

impl Binding {
    pub fn constant(value: Value, ty: TypeDesc) -> Self {
        Binding::Const { value, ty }
    }

    pub fn var(init: Value, ty: TypeDesc) -> Self {
        Binding::Var {
            cell: Value::var(init),
            ty,
        }
    }

    pub fn func(function: Function) -> Self {
        Binding::Func(function)
    }

    /// Static type of the binding.
    pub fn ty(&self) -> TypeDesc {
        match self {
            Binding::Const { ty, .. } | Binding::Var { ty, .. } => ty.clone(),
            Binding::Func(function) => TypeDesc::from_func(function.signature().clone()),
        }
    }

    /// The runtime value. For variables this is the cell itself, so reads
    /// observe later writes.
    pub fn value(&self) -> Value {
        match self {
            Binding::Const { value, .. } => value.clone(),
            Binding::Var { cell, .. } => cell.clone(),
            Binding::Func(function) => Value::func(function.clone()),
        }
    }

    /// Constants and functions never change after registration.
    pub fn is_constant(&self) -> bool {
        !matches!(self, Binding::Var { .. })
    }
}
