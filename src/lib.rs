//! Generate JSON-Schema documents from a type graph.
//!
//! A [`describe::TypeProvider`] reports the shape of each type; the
//! [`registry::Registry`] walks from a root type, registers every distinct
//! composite once under its qualified name, and hands back a
//! [`registry::SchemaDocument`].
pub mod catalog;
pub mod cli;
pub mod describe;
pub mod emit;
pub mod error;
pub mod ir;
pub mod jq_exec;
pub mod path_de;
pub mod registry;
pub mod typeexpr;

pub use catalog::{Catalog, MemberOrder};
pub use describe::{MemberDescriptor, TypeProvider, TypeRef, TypeShape};
pub use error::SchemaError;
pub use ir::{NodeKind, PrimitiveKind, SchemaNode};
pub use registry::{generate, Registry, SchemaDocument};
