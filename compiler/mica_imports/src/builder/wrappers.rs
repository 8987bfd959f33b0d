//! Promoted method discovery.
//!
//! A struct type with embedded fields gets, as wrapper methods, every method
//! of its embedded types that it does not declare itself. Embedded structs
//! are searched depth-first, so methods promoted through several levels are
//! found too.

use mica_ir::{NamedType, StringLookup, TypeDesc};
use rustc_hash::FxHashSet;

/// Sorted, deduplicated names of methods promoted into `ty`.
pub(super) fn promoted_methods(ty: &TypeDesc, names: &dyn StringLookup) -> Vec<String> {
    let TypeDesc::Named(outer) = ty else {
        return Vec::new();
    };
    if !matches!(outer.underlying, TypeDesc::Struct(_)) {
        return Vec::new();
    }
    let own: FxHashSet<&str> = outer.methods.iter().map(|m| names.lookup(m.name)).collect();

    let mut found = FxHashSet::default();
    collect(&outer.underlying, names, &mut found);

    let mut out: Vec<String> = found
        .into_iter()
        .filter(|name| !own.contains(name.as_str()))
        .collect();
    out.sort_unstable();
    out
}

fn collect(underlying: &TypeDesc, names: &dyn StringLookup, found: &mut FxHashSet<String>) {
    let TypeDesc::Struct(st) = underlying else {
        return;
    };
    for field in st.fields.iter().filter(|f| f.embedded) {
        let Some(named) = embedded_named(&field.ty) else {
            continue;
        };
        found.extend(named.methods.iter().map(|m| names.lookup(m.name).to_string()));
        collect(&named.underlying, names, found);
    }
}

/// `T` or `*T` for a named `T`.
fn embedded_named(ty: &TypeDesc) -> Option<&NamedType> {
    match ty {
        TypeDesc::Named(named) => Some(named),
        TypeDesc::Pointer(elem) => match &**elem {
            TypeDesc::Named(named) => Some(named),
            _ => None,
        },
        _ => None,
    }
}
