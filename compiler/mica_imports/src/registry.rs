//! The registry proper.

use std::sync::Arc;

use mica_ir::TypeDesc;
use rustc_hash::FxHashMap;

use crate::Binding;

/// Everything one foreign package exports.
#[derive(Clone, Debug, Default)]
pub struct Package {
    /// Declared package name, the default local name on import.
    pub name: String,
    pub binds: FxHashMap<String, Binding>,
    pub types: FxHashMap<String, TypeDesc>,
    pub proxies: FxHashMap<String, TypeDesc>,
    /// Marshaled `UntypedLit`s.
    pub untypeds: FxHashMap<String, String>,
    pub wrappers: FxHashMap<String, Vec<String>>,
}

impl Package {
    pub fn new(name: impl Into<String>) -> Self {
        Package {
            name: name.into(),
            ..Package::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.binds.is_empty()
            && self.types.is_empty()
            && self.proxies.is_empty()
            && self.untypeds.is_empty()
            && self.wrappers.is_empty()
    }
}

/// Packages keyed by full import path.
///
/// Cloning is cheap; packages are shared.
#[derive(Clone, Debug, Default)]
pub struct ImportRegistry {
    packages: FxHashMap<String, Arc<Package>>,
}

impl ImportRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `package` under `path`, replacing any previous entry.
    pub fn register(&mut self, path: impl Into<String>, package: Package) {
        let path = path.into();
        tracing::debug!(path = %path, binds = package.binds.len(), "registering package");
        self.packages.insert(path, Arc::new(package));
    }

    pub fn package(&self, path: &str) -> Option<&Package> {
        self.packages.get(path).map(|p| &**p)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.packages.contains_key(path)
    }

    /// Registered paths in sorted order.
    pub fn paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.packages.keys().map(String::as_str).collect();
        paths.sort_unstable();
        paths
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn lookup_bind(&self, path: &str, name: &str) -> Option<&Binding> {
        self.package(path)?.binds.get(name)
    }

    pub fn lookup_type(&self, path: &str, name: &str) -> Option<&TypeDesc> {
        self.package(path)?.types.get(name)
    }

    /// The proxy implementing interface `name`. `None` means no proxy is
    /// available, which is not an error.
    pub fn lookup_proxy(&self, path: &str, name: &str) -> Option<&TypeDesc> {
        self.package(path)?.proxies.get(name)
    }

    /// Exact marshaled text of an untyped constant.
    pub fn lookup_untyped(&self, path: &str, name: &str) -> Option<&str> {
        self.package(path)?.untypeds.get(name).map(String::as_str)
    }

    /// Promoted methods of type `name`; empty if it has none.
    pub fn wrappers(&self, path: &str, name: &str) -> &[String] {
        self.package(path)
            .and_then(|p| p.wrappers.get(name))
            .map_or(&[], Vec::as_slice)
    }
}
