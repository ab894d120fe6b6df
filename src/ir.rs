// Strongly-typed schema IR. No serde_json::Value here; see `emit` for rendering.

use indexmap::{IndexMap, IndexSet};

/// One JSON-Schema fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    pub kind: NodeKind,
    /// Rendered as `"description"` on whatever object the kind produces.
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Null,
    Primitive(PrimitiveKind),
    Array { items: Box<SchemaNode> },
    /// Keys are always strings.
    Map { values: Box<SchemaNode> },
    Enum { variants: Vec<String> },
    Object(ObjectNode),
    Ref { definition: String },
    OneOf(Vec<SchemaNode>),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectNode {
    pub properties: IndexMap<String, SchemaNode>, // enumeration order
    pub required: IndexSet<String>,
    pub additional_properties: bool,
}

/// The fixed table of scalar kinds a provider may report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    String,
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Decimal,
    Timestamp,
    TimestampOffset,
    Bytes,
    TypeName,
    Uuid,
}

/// Inclusive numeric range of an integer kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bounds {
    Signed { min: i64, max: i64 },
    Unsigned { min: u64, max: u64 },
}

impl PrimitiveKind {
    pub fn bounds(self) -> Option<Bounds> {
        use PrimitiveKind::*;
        let signed = |min: i64, max: i64| Some(Bounds::Signed { min, max });
        let unsigned = |max: u64| Some(Bounds::Unsigned { min: 0, max });
        match self {
            I8 => signed(i8::MIN.into(), i8::MAX.into()),
            I16 => signed(i16::MIN.into(), i16::MAX.into()),
            I32 => signed(i32::MIN.into(), i32::MAX.into()),
            I64 => signed(i64::MIN, i64::MAX),
            U8 => unsigned(u8::MAX.into()),
            U16 => unsigned(u16::MAX.into()),
            U32 => unsigned(u32::MAX.into()),
            U64 => unsigned(u64::MAX),
            _ => None,
        }
    }

    /// JSON-Schema `format` for string-shaped kinds, when there is one.
    pub fn format(self) -> Option<&'static str> {
        match self {
            Self::Timestamp | Self::TimestampOffset => Some("date-time"),
            Self::Uuid => Some("uuid"),
            _ => None,
        }
    }

    /// JSON-Schema `type` keyword.
    pub fn json_type(self) -> &'static str {
        use PrimitiveKind::*;
        match self {
            Bool => "boolean",
            I8 | I16 | I32 | I64 | U8 | U16 | U32 | U64 => "integer",
            F32 | F64 | Decimal => "number",
            String | Timestamp | TimestampOffset | Bytes | TypeName | Uuid => "string",
        }
    }
}

impl SchemaNode {
    pub fn new(kind: NodeKind) -> Self {
        Self { kind, description: None }
    }

    pub fn null() -> Self {
        Self::new(NodeKind::Null)
    }

    pub fn primitive(kind: PrimitiveKind) -> Self {
        Self::new(NodeKind::Primitive(kind))
    }

    pub fn array(items: SchemaNode) -> Self {
        Self::new(NodeKind::Array { items: Box::new(items) })
    }

    pub fn map(values: SchemaNode) -> Self {
        Self::new(NodeKind::Map { values: Box::new(values) })
    }

    pub fn reference(definition: impl Into<String>) -> Self {
        Self::new(NodeKind::Ref { definition: definition.into() })
    }

    pub fn one_of(alternatives: Vec<SchemaNode>) -> Self {
        Self::new(NodeKind::OneOf(alternatives))
    }

    /// The empty object reserved under a definition name before recursing.
    pub fn placeholder() -> Self {
        Self::new(NodeKind::Object(ObjectNode::default()))
    }

    /// Replace any existing description.
    pub fn with_description(mut self, description: Option<String>) -> Self {
        if description.is_some() {
            self.description = description;
        }
        self
    }

    pub fn is_ref(&self) -> bool {
        matches!(self.kind, NodeKind::Ref { .. })
    }

    /// Definition name if this is a reference.
    pub fn ref_name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Ref { definition } => Some(definition),
            _ => None,
        }
    }

    /// Every definition name referenced anywhere below this node.
    pub fn collect_refs<'a>(&'a self, out: &mut Vec<&'a str>) {
        match &self.kind {
            NodeKind::Ref { definition } => out.push(definition),
            NodeKind::Array { items } => items.collect_refs(out),
            NodeKind::Map { values } => values.collect_refs(out),
            NodeKind::Object(obj) => {
                for prop in obj.properties.values() {
                    prop.collect_refs(out);
                }
            }
            NodeKind::OneOf(arms) => {
                for arm in arms {
                    arm.collect_refs(out);
                }
            }
            NodeKind::Null | NodeKind::Primitive(_) | NodeKind::Enum { .. } => {}
        }
    }
}
