use super::Registry;
use crate::describe::{EnumShape, ObjectShape, TypeProvider, TypeRef, TypeShape};
use crate::error::SchemaError;
use crate::ir::{NodeKind, ObjectNode, SchemaNode};

enum Composite {
    Enum(EnumShape),
    Object(ObjectShape),
}

impl<P: TypeProvider> Registry<P> {
    /// Resolve a composite to `Ref{name}`, building its definition on first sight.
    pub(super) fn create_ref(&mut self, ty: &TypeRef, shape: TypeShape) -> Result<SchemaNode, SchemaError> {
        let name = self
            .provider
            .qualified_name(ty)
            .ok_or_else(|| SchemaError::MissingTypeIdentity { ty: ty.to_string() })?;

        if self.definitions.contains_key(&name) {
            tracing::trace!(definition = %name, "definition already registered");
            return Ok(SchemaNode::reference(name));
        }

        let composite = match shape {
            TypeShape::Enum(shape) => Composite::Enum(shape),
            TypeShape::Object(shape) => Composite::Object(shape),
            _ => return Err(SchemaError::UnsupportedType { ty: ty.to_string() }),
        };

        // Reserve the slot so members referring back to this type resolve to a ref.
        self.definitions.insert(name.clone(), SchemaNode::placeholder());
        tracing::debug!(definition = %name, "registering definition");

        let node = match composite {
            Composite::Enum(shape) => Self::enum_schema(shape),
            Composite::Object(shape) => self.object_schema(shape)?,
        };
        if let Some(slot) = self.definitions.get_mut(&name) {
            *slot = node;
        }
        Ok(SchemaNode::reference(name))
    }

    fn enum_schema(shape: EnumShape) -> SchemaNode {
        SchemaNode::new(NodeKind::Enum { variants: shape.variants }).with_description(shape.description)
    }

    fn object_schema(&mut self, shape: ObjectShape) -> Result<SchemaNode, SchemaError> {
        let mut obj = ObjectNode::default();
        for member in shape.members.into_iter().filter(|m| m.is_candidate()) {
            let name = member.exposed_name().to_string();
            // a later member with the same exposed name replaces the earlier one
            if member.required {
                obj.required.insert(name.clone());
            } else {
                obj.required.shift_remove(&name);
            }
            let schema = self.register(&member.ty)?.with_description(member.description);
            obj.properties.insert(name, schema);
        }
        Ok(SchemaNode::new(NodeKind::Object(obj)).with_description(shape.description))
    }
}
