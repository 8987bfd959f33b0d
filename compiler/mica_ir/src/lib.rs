//! Mica IR - the shared vocabulary of the evaluator.
//!
//! - [`Name`] / [`StringInterner`]: interned identifiers
//! - [`Kind`]: the fixed set of specialization kinds
//! - [`TypeDesc`], [`FuncType`], [`ReturnShape`]: static type descriptors
//! - [`ast`]: the typed expression tree handed over by the front end

pub mod ast;
mod interner;
mod kind;
mod name;
mod types;

pub use interner::{InternError, SharedInterner, StringInterner, StringLookup};
pub use kind::Kind;
pub use name::Name;
pub use types::{
    FieldDesc, FuncType, InterfaceType, MethodDesc, NamedType, ReturnShape, StructType, TypeDesc,
};
