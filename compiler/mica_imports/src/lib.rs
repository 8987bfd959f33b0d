//! Mica Imports - foreign packages visible to interpreted code.
//!
//! The registry is built before compilation and handed to the compiler as an
//! explicit, read-only object. Each [`Package`] lists, by exported name:
//!
//! - `binds`: constants, variables and functions
//! - `types`: type descriptors
//! - `proxies`: descriptors of types that implement an exported interface
//! - `untypeds`: exact text of untyped constants
//! - `wrappers`: methods promoted from embedded fields
//!
//! A missing entry means "none of that kind", never an error.

mod binding;
mod builder;
mod registry;
mod untyped;

pub use binding::Binding;
pub use builder::{is_exported, ExportDecl, ImportWarning, PackageBuilder};
pub use registry::{ImportRegistry, Package};
pub use untyped::{detect_int_kind, UntypedError, UntypedKind, UntypedLit};
