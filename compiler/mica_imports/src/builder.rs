//! Filling a `Package` from exported declarations.
//!
//! This is the consuming end of the registry generator: it receives every
//! top-level declaration of a foreign package and decides what the
//! interpreter can import. Generic functions and types cannot be imported;
//! they are skipped with a warning and the rest of the package still loads.

mod wrappers;

use std::fmt;

use mica_ir::{StringLookup, TypeDesc};
use mica_value::{Function, Value};

use crate::{detect_int_kind, Binding, Package, UntypedKind, UntypedLit};

/// One exported declaration of a foreign package.
#[derive(Clone, Debug)]
pub enum ExportDecl {
    /// Typed constant.
    Const {
        name: String,
        value: Value,
        ty: TypeDesc,
    },
    /// Untyped constant, kept exactly.
    Untyped { name: String, lit: UntypedLit },
    Var {
        name: String,
        init: Value,
        ty: TypeDesc,
    },
    Func { name: String, function: Function },
    /// Type declaration. `proxy` is the generated implementer of an
    /// interface type, if the generator produced one.
    Type {
        name: String,
        ty: TypeDesc,
        proxy: Option<TypeDesc>,
    },
}

impl ExportDecl {
    pub fn name(&self) -> &str {
        match self {
            ExportDecl::Const { name, .. }
            | ExportDecl::Untyped { name, .. }
            | ExportDecl::Var { name, .. }
            | ExportDecl::Func { name, .. }
            | ExportDecl::Type { name, .. } => name,
        }
    }
}

/// Something the builder dropped or approximated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportWarning {
    pub path: String,
    pub name: String,
    pub message: String,
}

impl fmt::Display for ImportWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "package {:?}: {}: {}", self.path, self.name, self.message)
    }
}

/// Whether `name` is visible outside its package.
pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

/// Accumulates one package.
pub struct PackageBuilder<'a> {
    path: String,
    package: Package,
    names: &'a dyn StringLookup,
    warnings: Vec<ImportWarning>,
    exported: usize,
}

impl<'a> PackageBuilder<'a> {
    /// `names` resolves the `Name`s inside type descriptors, for wrapper
    /// method lists.
    pub fn new(path: impl Into<String>, name: impl Into<String>, names: &'a dyn StringLookup) -> Self {
        PackageBuilder {
            path: path.into(),
            package: Package::new(name),
            names,
            warnings: Vec::new(),
            exported: 0,
        }
    }

    /// Build a package in one go. Returns `None` for a package that exports
    /// nothing, together with the warnings raised on the way.
    pub fn from_decls(
        path: impl Into<String>,
        name: impl Into<String>,
        names: &'a dyn StringLookup,
        decls: impl IntoIterator<Item = ExportDecl>,
    ) -> (Option<Package>, Vec<ImportWarning>) {
        let mut builder = PackageBuilder::new(path, name, names);
        for decl in decls {
            builder.add(decl);
        }
        builder.finish()
    }

    /// Add one declaration. Unexported names are ignored.
    pub fn add(&mut self, decl: ExportDecl) -> &mut Self {
        if !is_exported(decl.name()) {
            return self;
        }
        self.exported += 1;
        match decl {
            ExportDecl::Const { name, value, ty } => {
                self.package.binds.insert(name, Binding::constant(value, ty));
            }
            ExportDecl::Untyped { name, lit } => self.add_untyped(name, &lit),
            ExportDecl::Var { name, init, ty } => {
                self.package.binds.insert(name, Binding::var(init, ty));
            }
            ExportDecl::Func { name, function } => {
                if function.signature().is_generic() {
                    self.warn(&name, "importing generic functions is not supported yet");
                } else {
                    self.package.binds.insert(name, Binding::func(function));
                }
            }
            ExportDecl::Type { name, ty, proxy } => self.add_type(name, ty, proxy),
        }
        self
    }

    fn add_untyped(&mut self, name: String, lit: &UntypedLit) {
        if lit.kind == UntypedKind::Int {
            let kind = detect_int_kind(&lit.text);
            if kind.is_float() {
                let message = format!(
                    "integer constant {} overflows both int64 and uint64, converting to {kind}",
                    lit.text
                );
                self.warn(&name, &message);
            }
        }
        match lit.approximate() {
            Ok(value) => {
                let ty = TypeDesc::basic(value.kind());
                self.package
                    .binds
                    .insert(name.clone(), Binding::constant(value, ty));
            }
            Err(err) => self.warn(&name, &err.to_string()),
        }
        self.package.untypeds.insert(name, lit.marshal());
    }

    fn add_type(&mut self, name: String, ty: TypeDesc, proxy: Option<TypeDesc>) {
        if ty.is_generic() {
            self.warn(&name, "importing generic types is not supported yet");
            return;
        }
        let wrappers = wrappers::promoted_methods(&ty, self.names);
        if !wrappers.is_empty() {
            self.package.wrappers.insert(name.clone(), wrappers);
        }
        // The empty interface needs no implementer.
        let needs_proxy = ty.interface().is_some_and(|iface| !iface.methods.is_empty());
        if let (true, Some(proxy)) = (needs_proxy, proxy) {
            self.package.proxies.insert(name.clone(), proxy);
        }
        self.package.types.insert(name, ty);
    }

    fn warn(&mut self, name: &str, message: &str) {
        tracing::warn!(path = %self.path, name, "{message}");
        self.warnings.push(ImportWarning {
            path: self.path.clone(),
            name: name.to_string(),
            message: message.to_string(),
        });
    }

    pub fn finish(self) -> (Option<Package>, Vec<ImportWarning>) {
        let package = (self.exported > 0).then_some(self.package);
        (package, self.warnings)
    }
}

#[cfg(test)]
mod tests;
