use std::collections::HashSet;

use once_cell::sync::Lazy;

use super::Registry;
use crate::describe::{TypeProvider, TypeRef, TypeShape};
use crate::error::SchemaError;
use crate::ir::PrimitiveKind;

/// Generic definitions rendered as JSON arrays (one type argument).
static LIST_LIKE: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        "Sequence",
        "ReadOnlyList",
        "List",
        "ImmutableList",
        "ImmutableArray",
        "Vec",
        "VecDeque",
    ])
});

/// Generic definitions rendered as JSON objects with free-form keys
/// (two type arguments, key first).
static MAP_LIKE: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        "ReadOnlyDictionary",
        "Dictionary",
        "ImmutableDictionary",
        "HashMap",
        "BTreeMap",
        "IndexMap",
    ])
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    List,
    Map,
}

impl ContainerKind {
    pub fn recognize(definition: &str) -> Option<Self> {
        if LIST_LIKE.contains(definition) {
            Some(Self::List)
        } else if MAP_LIKE.contains(definition) {
            Some(Self::Map)
        } else {
            None
        }
    }

    pub fn arity(self) -> usize {
        match self {
            Self::List => 1,
            Self::Map => 2,
        }
    }
}

impl<P: TypeProvider> Registry<P> {
    /// A string, or something with a registered two-way string conversion.
    /// Fails when the provider cannot describe the key.
    pub(super) fn stringish(&self, key: &TypeRef) -> Result<bool, SchemaError> {
        let inner = key.non_nullable();
        if let TypeShape::Primitive(PrimitiveKind::String) = self.provider.classify(&inner)? {
            return Ok(true);
        }
        Ok(self.provider.has_string_conversion(&inner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_known_definitions_only() {
        assert_eq!(ContainerKind::recognize("List"), Some(ContainerKind::List));
        assert_eq!(ContainerKind::recognize("ImmutableArray"), Some(ContainerKind::List));
        assert_eq!(ContainerKind::recognize("Dictionary"), Some(ContainerKind::Map));
        assert_eq!(ContainerKind::recognize("BTreeMap"), Some(ContainerKind::Map));
        assert_eq!(ContainerKind::recognize("HashSet"), None);
        assert_eq!(ContainerKind::recognize("list"), None);
    }
}
