//! Schema registry: turns type descriptions into schema nodes.
//!
//! One registry serves one generation run. Composite types (objects and
//! enums) are registered under their qualified name exactly once and are
//! referenced everywhere else through `Ref` nodes; everything else is
//! inlined at the use site.
//!
//! Recursion is bounded by the number of distinct composites: an empty
//! placeholder is reserved under a definition name *before* its members are
//! visited, so a member that leads back to the type being built resolves to
//! a reference instead of recursing again.
pub mod composite;
pub mod container;

use indexmap::IndexMap;

pub use container::ContainerKind;

use crate::describe::{TypeProvider, TypeRef, TypeShape};
use crate::error::SchemaError;
use crate::ir::SchemaNode;

// ------------------------------- Registry --------------------------------- //

pub struct Registry<P> {
    provider: P,
    definitions: IndexMap<String, SchemaNode>,
    /// First error seen. Placeholders may be left half-built after a
    /// failure, so every later call reports it again.
    poisoned: Option<SchemaError>,
}

/// Entry-point node plus every definition discovered while building it.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDocument {
    pub root: SchemaNode,
    pub definitions: IndexMap<String, SchemaNode>,
}

impl<P: TypeProvider> Registry<P> {
    pub fn new(provider: P) -> Self {
        Self { provider, definitions: IndexMap::new(), poisoned: None }
    }

    /// Definitions discovered so far, in discovery order.
    pub fn definitions(&self) -> &IndexMap<String, SchemaNode> {
        &self.definitions
    }

    /// Schema node to embed where `ty` is used.
    ///
    /// After any failure the registry is poisoned: this and
    /// [`Registry::into_document`] keep returning the first error.
    pub fn register(&mut self, ty: &TypeRef) -> Result<SchemaNode, SchemaError> {
        if let Some(error) = &self.poisoned {
            return Err(error.clone());
        }
        self.register_inner(ty).inspect_err(|error| {
            if self.poisoned.is_none() {
                self.poisoned = Some(error.clone());
            }
        })
    }

    /// Finish the run.
    pub fn into_document(self, root: SchemaNode) -> Result<SchemaDocument, SchemaError> {
        match self.poisoned {
            Some(error) => Err(error),
            None => Ok(SchemaDocument { root, definitions: self.definitions }),
        }
    }

    fn register_inner(&mut self, ty: &TypeRef) -> Result<SchemaNode, SchemaError> {
        let mut choices = self.create_schemas(ty)?;
        if choices.len() == 1 && !choices[0].is_ref() {
            // single choice - return the node itself
            return Ok(choices.remove(0));
        }
        Ok(SchemaNode::one_of(choices))
    }

    fn create_schemas(&mut self, ty: &TypeRef) -> Result<Vec<SchemaNode>, SchemaError> {
        let mut choices = Vec::with_capacity(2);
        if ty.nullable {
            choices.push(SchemaNode::null());
        }

        let inner = ty.non_nullable();
        let shape = self.provider.classify(&inner)?;
        let node = match shape {
            TypeShape::Primitive(kind) => SchemaNode::primitive(kind),
            TypeShape::Array { rank, element } => {
                if rank != 1 {
                    return Err(SchemaError::UnsupportedShape { ty: inner.to_string(), rank });
                }
                SchemaNode::array(self.register(&element)?)
            }
            TypeShape::Generic { definition, args } => match ContainerKind::recognize(&definition) {
                Some(container) => self.container_schema(&inner, container, &args)?,
                None => self.create_ref(&inner, TypeShape::Generic { definition, args })?,
            },
            shape => self.create_ref(&inner, shape)?,
        };
        choices.push(node);
        Ok(choices)
    }

    fn container_schema(
        &mut self,
        ty: &TypeRef,
        container: ContainerKind,
        args: &[TypeRef],
    ) -> Result<SchemaNode, SchemaError> {
        if args.len() != container.arity() {
            return Err(SchemaError::UnsupportedType { ty: ty.to_string() });
        }
        match container {
            ContainerKind::List => Ok(SchemaNode::array(self.register(&args[0])?)),
            ContainerKind::Map => {
                if !self.stringish(&args[0])? {
                    return Err(SchemaError::UnsupportedKeyType {
                        ty: ty.to_string(),
                        key: args[0].to_string(),
                    });
                }
                Ok(SchemaNode::map(self.register(&args[1])?))
            }
        }
    }
}

// ------------------------------- Front API -------------------------------- //

/// Run a whole generation for one root type with a fresh registry.
pub fn generate<P: TypeProvider>(provider: P, root: &TypeRef) -> Result<SchemaDocument, SchemaError> {
    let mut registry = Registry::new(provider);
    let node = registry.register(root)?;
    tracing::debug!(root = %root, definitions = registry.definitions().len(), "schema generated");
    registry.into_document(node)
}

impl SchemaDocument {
    /// Names referenced somewhere in the document but never defined.
    pub fn dangling_refs(&self) -> Vec<&str> {
        let mut refs = Vec::new();
        self.root.collect_refs(&mut refs);
        for node in self.definitions.values() {
            node.collect_refs(&mut refs);
        }
        let mut out: Vec<&str> = refs
            .into_iter()
            .filter(|name| !self.definitions.contains_key(*name))
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }
}

// ------------------------------- Tests ------------------------------------ //
