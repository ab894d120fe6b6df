//! JSON rendering of the schema IR.
//!
//! Key names and the `#/definitions/<name>` reference syntax are what
//! downstream validators read; keep them stable.
use serde_json::{json, Map, Value};

use crate::ir::{Bounds, NodeKind, ObjectNode, PrimitiveKind, SchemaNode};
use crate::registry::SchemaDocument;

pub const DEFINITIONS_POINTER: &str = "#/definitions/";

impl SchemaNode {
    pub fn to_json(&self) -> Value {
        let mut o = match &self.kind {
            NodeKind::Null => json!({ "type": "null" }),
            NodeKind::Primitive(kind) => emit_primitive(*kind),
            NodeKind::Array { items } => json!({
                "type": "array",
                "items": items.to_json(),
            }),
            NodeKind::Map { values } => json!({
                "type": "object",
                "additionalProperties": values.to_json(),
            }),
            NodeKind::Enum { variants } => json!({
                "type": "string",
                "enum": variants,
            }),
            NodeKind::Object(obj) => emit_object(obj, self.description.as_deref()),
            NodeKind::Ref { definition } => json!({ "$ref": format!("{DEFINITIONS_POINTER}{definition}") }),
            NodeKind::OneOf(arms) => json!({
                "oneOf": arms.iter().map(SchemaNode::to_json).collect::<Vec<_>>(),
            }),
        };
        // objects place their description before the property list
        if let (Some(text), false) = (&self.description, matches!(self.kind, NodeKind::Object(_))) {
            o["description"] = Value::from(text.as_str());
        }
        o
    }
}

fn emit_primitive(kind: PrimitiveKind) -> Value {
    let mut o = json!({ "type": kind.json_type() });
    match kind.bounds() {
        Some(Bounds::Signed { min, max }) => {
            o["minimum"] = Value::from(min);
            o["maximum"] = Value::from(max);
        }
        Some(Bounds::Unsigned { min, max }) => {
            o["minimum"] = Value::from(min);
            o["maximum"] = Value::from(max);
        }
        None => {}
    }
    if let Some(format) = kind.format() {
        o["format"] = Value::from(format);
    }
    o
}

fn emit_object(obj: &ObjectNode, description: Option<&str>) -> Value {
    let mut map = Map::new();
    map.insert("type".into(), Value::from("object"));
    map.insert("additionalProperties".into(), Value::from(obj.additional_properties));
    if let Some(text) = description {
        map.insert("description".into(), Value::from(text));
    }
    let props: Map<String, Value> = obj
        .properties
        .iter()
        .map(|(name, node)| (name.clone(), node.to_json()))
        .collect();
    map.insert("properties".into(), Value::Object(props));
    if !obj.required.is_empty() {
        map.insert(
            "required".into(),
            Value::Array(obj.required.iter().cloned().map(Value::from).collect()),
        );
    }
    Value::Object(map)
}

impl SchemaDocument {
    /// `{ <root keys...>, "definitions": { name: node, ... } }`
    pub fn to_json(&self) -> Value {
        let mut doc = match self.root.to_json() {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        let definitions: Map<String, Value> = self
            .definitions
            .iter()
            .map(|(name, node)| (name.clone(), node.to_json()))
            .collect();
        doc.insert("definitions".into(), Value::Object(definitions));
        Value::Object(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_formats() {
        assert_eq!(
            SchemaNode::primitive(PrimitiveKind::Uuid).to_json(),
            json!({"type": "string", "format": "uuid"})
        );
        assert_eq!(
            SchemaNode::primitive(PrimitiveKind::TimestampOffset).to_json(),
            json!({"type": "string", "format": "date-time"})
        );
        assert_eq!(SchemaNode::primitive(PrimitiveKind::Bytes).to_json(), json!({"type": "string"}));
        assert_eq!(SchemaNode::primitive(PrimitiveKind::Decimal).to_json(), json!({"type": "number"}));
        assert_eq!(SchemaNode::primitive(PrimitiveKind::Bool).to_json(), json!({"type": "boolean"}));
    }

    #[test]
    fn u64_upper_bound_is_exact() {
        let v = SchemaNode::primitive(PrimitiveKind::U64).to_json();
        assert_eq!(v["maximum"].as_u64(), Some(u64::MAX));
        let v = SchemaNode::primitive(PrimitiveKind::I64).to_json();
        assert_eq!(v["minimum"].as_i64(), Some(i64::MIN));
    }

    #[test]
    fn object_key_order_and_required() {
        let mut obj = ObjectNode::default();
        obj.properties.insert("b".into(), SchemaNode::primitive(PrimitiveKind::String));
        obj.properties.insert("a".into(), SchemaNode::null());
        obj.required.insert("b".into());
        let node = SchemaNode::new(NodeKind::Object(obj)).with_description(Some("doc".into()));
        let text = serde_json::to_string(&node.to_json()).unwrap();
        assert_eq!(
            text,
            r#"{"type":"object","additionalProperties":false,"description":"doc","properties":{"b":{"type":"string"},"a":{"type":"null"}},"required":["b"]}"#
        );
    }

    #[test]
    fn placeholder_renders_empty_properties() {
        assert_eq!(
            SchemaNode::placeholder().to_json(),
            json!({"type": "object", "additionalProperties": false, "properties": {}})
        );
    }

    #[test]
    fn document_merges_root_with_definitions() {
        let mut definitions = indexmap::IndexMap::new();
        definitions.insert(
            "Game.Water".to_string(),
            SchemaNode::new(NodeKind::Enum { variants: vec!["Lake".into()] }),
        );
        let doc = SchemaDocument {
            root: SchemaNode::one_of(vec![SchemaNode::reference("Game.Water")]),
            definitions,
        };
        assert_eq!(
            doc.to_json(),
            json!({
                "oneOf": [{"$ref": "#/definitions/Game.Water"}],
                "definitions": {"Game.Water": {"type": "string", "enum": ["Lake"]}}
            })
        );
    }
}
