//! Data-driven type catalog: a [`TypeProvider`] loaded from JSON.
//!
//! A catalog declares object, enum and opaque types by qualified name;
//! member types are written as type expressions (see [`crate::typeexpr`]).
//! Scalars come from a fixed table of built-in names.
use std::collections::HashSet;

use indexmap::IndexMap;
use serde::Deserialize;
use thiserror::Error;

use crate::describe::{
    EnumShape, MemberDescriptor, ObjectShape, TypeProvider, TypeRef, TypeRefKind, TypeShape,
};
use crate::error::SchemaError;
use crate::ir::PrimitiveKind;
use crate::path_de::{self, PathError};

// ------------------------------- Errors ----------------------------------- //

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("malformed catalog {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: PathError,
    },

    #[error("type `{0}` is declared more than once")]
    DuplicateType(String),

    #[error("`{0}` is a built-in type name and cannot be declared")]
    ReservedName(String),

    #[error("type `{ty}` derives from unknown type `{base}`")]
    UnknownBase { ty: String, base: String },

    #[error("type `{ty}` derives from `{base}`, which is not an object type")]
    BaseNotObject { ty: String, base: String },

    #[error("`{field}` is not allowed on {kind:?} type `{ty}`")]
    FieldNotAllowed { ty: String, kind: DeclKind, field: &'static str },

    #[error("inheritance cycle through `{0}`")]
    InheritanceCycle(String),

    #[error("member `{member}` of `{ty}` uses unknown type `{used}`")]
    UnknownMemberType { ty: String, member: String, used: String },
}

// ------------------------------ File format ------------------------------- //

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogFile {
    /// Types to generate when the caller names none.
    #[serde(default)]
    pub roots: Vec<TypeRef>,
    #[serde(default)]
    pub types: Vec<TypeDecl>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeDecl {
    pub name: String,
    pub kind: DeclKind,
    #[serde(default)]
    pub description: Option<String>,
    /// No stable qualified name; cannot become a definition.
    #[serde(default)]
    pub anonymous: bool,
    /// Registered two-way string conversion (usable as a map key).
    #[serde(default)]
    pub string_conversion: bool,
    /// Objects only.
    #[serde(default)]
    pub base: Option<String>,
    /// Objects only, in declaration order.
    #[serde(default)]
    pub members: Vec<MemberDecl>,
    /// Enums only, in declaration order.
    #[serde(default)]
    pub variants: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclKind {
    Object,
    Enum,
    /// Known, but with no schema representation.
    Opaque,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MemberDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    #[serde(default)]
    pub rename: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub ignore: bool,
    #[serde(default = "default_true")]
    pub public: bool,
    #[serde(default)]
    pub include: bool,
    #[serde(default)]
    pub description: Option<String>,
}

fn default_true() -> bool {
    true
}

impl From<&MemberDecl> for MemberDescriptor {
    fn from(decl: &MemberDecl) -> Self {
        Self {
            name: decl.name.clone(),
            rename: decl.rename.clone(),
            ty: decl.ty.clone(),
            required: decl.required,
            ignored: decl.ignore,
            public: decl.public,
            included: decl.include,
            description: decl.description.clone(),
        }
    }
}

// ------------------------------- Builtins --------------------------------- //

/// Built-in scalar names.
pub fn builtin(name: &str) -> Option<PrimitiveKind> {
    use PrimitiveKind::*;
    let kind = match name {
        "string" => String,
        "bool" => Bool,
        "i8" | "sbyte" => I8,
        "i16" | "short" => I16,
        "i32" | "int" => I32,
        "i64" | "long" => I64,
        "u8" | "byte" => U8,
        "u16" | "ushort" => U16,
        "u32" | "uint" => U32,
        "u64" | "ulong" => U64,
        "f32" | "float" => F32,
        "f64" | "double" => F64,
        "decimal" => Decimal,
        "datetime" => Timestamp,
        "datetimeoffset" => TimestampOffset,
        "bytes" => Bytes,
        "type" => TypeName,
        "uuid" | "guid" => Uuid,
        _ => return None,
    };
    Some(kind)
}

/// `byte`/`u8` element: `byte[]` is a byte sequence, not a list of numbers.
fn is_byte(element: &TypeRef) -> bool {
    match &element.kind {
        TypeRefKind::Named { name, args } if args.is_empty() && !element.nullable => {
            builtin(name) == Some(PrimitiveKind::U8)
        }
        _ => false,
    }
}

// ------------------------------- Catalog ---------------------------------- //

/// Where inherited members go relative to a type's own members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum MemberOrder {
    /// Root-most base first, the type's own members last.
    #[default]
    BaseFirst,
    /// The type's own members first, then each base outward.
    DeclaredFirst,
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    types: IndexMap<String, TypeDecl>,
    roots: Vec<TypeRef>,
    member_order: MemberOrder,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_member_order(mut self, order: MemberOrder) -> Self {
        self.member_order = order;
        self
    }

    /// Parse one catalog document. `origin` only labels errors.
    pub fn parse_file(origin: &str, src: &str) -> Result<CatalogFile, CatalogError> {
        path_de::from_str_with_path(src).map_err(|source| CatalogError::Parse {
            origin: origin.to_string(),
            source,
        })
    }

    /// Like [`Catalog::parse_file`], for a document that is already JSON.
    pub fn parse_value(origin: &str, value: serde_json::Value) -> Result<CatalogFile, CatalogError> {
        path_de::from_value_with_path(value).map_err(|source| CatalogError::Parse {
            origin: origin.to_string(),
            source,
        })
    }

    /// Single-document convenience: parse, merge and validate.
    pub fn from_json_str(src: &str) -> Result<Self, CatalogError> {
        let mut catalog = Self::new();
        catalog.merge(Self::parse_file("<inline>", src)?)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn merge(&mut self, file: CatalogFile) -> Result<(), CatalogError> {
        for decl in file.types {
            self.insert(decl)?;
        }
        for root in file.roots {
            if !self.roots.contains(&root) {
                self.roots.push(root);
            }
        }
        Ok(())
    }

    pub fn insert(&mut self, decl: TypeDecl) -> Result<(), CatalogError> {
        if builtin(&decl.name).is_some() {
            return Err(CatalogError::ReservedName(decl.name));
        }
        if self.types.contains_key(&decl.name) {
            return Err(CatalogError::DuplicateType(decl.name));
        }
        self.types.insert(decl.name.clone(), decl);
        Ok(())
    }

    pub fn roots(&self) -> &[TypeRef] {
        &self.roots
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    pub fn get(&self, name: &str) -> Option<&TypeDecl> {
        self.types.get(name)
    }

    /// Check inheritance and member types up front so generation only fails
    /// for shape reasons.
    pub fn validate(&self) -> Result<(), CatalogError> {
        for decl in self.types.values() {
            let misplaced = |field| CatalogError::FieldNotAllowed {
                ty: decl.name.clone(),
                kind: decl.kind,
                field,
            };
            if decl.kind != DeclKind::Enum && !decl.variants.is_empty() {
                return Err(misplaced("variants"));
            }
            if decl.kind == DeclKind::Object {
                self.check_object(decl)?;
            } else if decl.base.is_some() {
                return Err(misplaced("base"));
            } else if !decl.members.is_empty() {
                return Err(misplaced("members"));
            }
        }
        Ok(())
    }

    fn check_object(&self, decl: &TypeDecl) -> Result<(), CatalogError> {
        self.base_chain(decl)?;
        for member in &decl.members {
            if let Some(used) = self.first_unknown(&member.ty) {
                return Err(CatalogError::UnknownMemberType {
                    ty: decl.name.clone(),
                    member: member.name.clone(),
                    used: used.to_string(),
                });
            }
        }
        Ok(())
    }

    /// `decl` followed by each base outward.
    fn base_chain<'a>(&'a self, decl: &'a TypeDecl) -> Result<Vec<&'a TypeDecl>, CatalogError> {
        let mut chain = vec![decl];
        let mut seen = HashSet::from([decl.name.as_str()]);
        let mut current = decl;
        while let Some(base) = &current.base {
            let next = self.types.get(base).ok_or_else(|| CatalogError::UnknownBase {
                ty: current.name.clone(),
                base: base.clone(),
            })?;
            if next.kind != DeclKind::Object {
                return Err(CatalogError::BaseNotObject {
                    ty: current.name.clone(),
                    base: base.clone(),
                });
            }
            if !seen.insert(next.name.as_str()) {
                return Err(CatalogError::InheritanceCycle(next.name.clone()));
            }
            chain.push(next);
            current = next;
        }
        Ok(chain)
    }

    /// First non-generic name in `ty` that is neither built in nor declared.
    fn first_unknown<'a>(&self, ty: &'a TypeRef) -> Option<&'a str> {
        match &ty.kind {
            TypeRefKind::Array { element, .. } => self.first_unknown(element),
            TypeRefKind::Named { name, args } if args.is_empty() => {
                (builtin(name).is_none() && !self.types.contains_key(name)).then_some(name.as_str())
            }
            TypeRefKind::Named { args, .. } => args.iter().find_map(|arg| self.first_unknown(arg)),
        }
    }

    fn object_shape(&self, decl: &TypeDecl) -> Result<ObjectShape, SchemaError> {
        let mut chain = self
            .base_chain(decl)
            .map_err(|_| SchemaError::UnsupportedType { ty: decl.name.clone() })?;
        if self.member_order == MemberOrder::BaseFirst {
            chain.reverse();
        }
        let members = chain
            .into_iter()
            .flat_map(|decl| decl.members.iter())
            .map(MemberDescriptor::from)
            .collect();
        Ok(ObjectShape { members, description: decl.description.clone() })
    }
}

impl TypeProvider for Catalog {
    fn classify(&self, ty: &TypeRef) -> Result<TypeShape, SchemaError> {
        let name = match &ty.kind {
            TypeRefKind::Array { element, rank } if *rank == 1 && is_byte(element) => {
                return Ok(TypeShape::Primitive(PrimitiveKind::Bytes));
            }
            TypeRefKind::Array { element, rank } => {
                return Ok(TypeShape::Array { rank: *rank, element: (**element).clone() });
            }
            TypeRefKind::Named { name, args } if !args.is_empty() => {
                return Ok(TypeShape::Generic { definition: name.clone(), args: args.clone() });
            }
            TypeRefKind::Named { name, .. } => name,
        };
        if let Some(kind) = builtin(name) {
            return Ok(TypeShape::Primitive(kind));
        }
        let decl = self
            .types
            .get(name)
            .ok_or_else(|| SchemaError::UnknownType { ty: ty.to_string() })?;
        match decl.kind {
            DeclKind::Object => Ok(TypeShape::Object(self.object_shape(decl)?)),
            DeclKind::Enum => Ok(TypeShape::Enum(EnumShape {
                variants: decl.variants.clone(),
                description: decl.description.clone(),
            })),
            DeclKind::Opaque => Ok(TypeShape::Unsupported),
        }
    }

    fn qualified_name(&self, ty: &TypeRef) -> Option<String> {
        match &ty.kind {
            TypeRefKind::Array { .. } => None,
            TypeRefKind::Named { args, .. } if !args.is_empty() => Some(ty.non_nullable().to_string()),
            TypeRefKind::Named { name, .. } => match self.types.get(name) {
                Some(decl) if decl.anonymous => None,
                Some(_) => Some(name.clone()),
                None => builtin(name).map(|_| name.clone()),
            },
        }
    }

    fn has_string_conversion(&self, ty: &TypeRef) -> bool {
        let Some(name) = ty.name() else {
            return false;
        };
        if let TypeRefKind::Named { args, .. } = &ty.kind {
            if !args.is_empty() {
                return false;
            }
        }
        if let Some(kind) = builtin(name) {
            return !matches!(kind, PrimitiveKind::Bytes | PrimitiveKind::TypeName);
        }
        self.types
            .get(name)
            .is_some_and(|decl| decl.string_conversion || decl.kind == DeclKind::Enum)
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::registry::generate;

    const FISHING: &str = r#"{
        "roots": ["Fishing.FishConfig"],
        "types": [
            { "name": "Fishing.ConfigBase", "kind": "object",
              "members": [ { "name": "Version", "type": "string", "required": true } ] },
            { "name": "Fishing.FishConfig", "kind": "object", "base": "Fishing.ConfigBase",
              "description": "Configuration for fish.",
              "members": [
                { "name": "ShowFishInMinigame", "type": "bool" },
                { "name": "MaxNormalFishQuality", "type": "int?",
                  "description": "Max quality of a non-perfect catch, or null." },
                { "name": "Waters", "type": "Dictionary<Fishing.WaterType, double>" }
              ] },
            { "name": "Fishing.WaterType", "kind": "enum", "variants": ["Lake", "River", "Both"] }
        ]
    }"#;

    fn t(src: &str) -> TypeRef {
        src.parse().unwrap()
    }

    #[test]
    fn loads_and_generates_fishing_config() {
        let catalog = Catalog::from_json_str(FISHING).unwrap();
        assert_eq!(catalog.roots(), &[t("Fishing.FishConfig")]);

        let doc = generate(&catalog, &catalog.roots()[0]).unwrap();
        let config = doc.definitions["Fishing.FishConfig"].to_json();
        let props: Vec<&String> = config["properties"].as_object().unwrap().keys().collect();
        assert_eq!(props, ["Version", "ShowFishInMinigame", "MaxNormalFishQuality", "Waters"]);
        assert_eq!(config["required"], json!(["Version"]));
        assert_eq!(config["description"], json!("Configuration for fish."));
        // enum keys are stringish
        assert_eq!(config["properties"]["Waters"]["additionalProperties"], json!({"type": "number"}));
        // map keys never become definitions
        assert!(!doc.definitions.contains_key("Fishing.WaterType"));
    }

    #[test]
    fn declared_first_puts_own_members_before_inherited() {
        let catalog = Catalog::from_json_str(FISHING)
            .unwrap()
            .with_member_order(MemberOrder::DeclaredFirst);
        let doc = generate(&catalog, &t("Fishing.FishConfig")).unwrap();
        let config = doc.definitions["Fishing.FishConfig"].to_json();
        let props: Vec<&String> = config["properties"].as_object().unwrap().keys().collect();
        assert_eq!(props, ["ShowFishInMinigame", "MaxNormalFishQuality", "Waters", "Version"]);
    }

    #[test]
    fn parse_errors_carry_the_json_path() {
        let err = Catalog::from_json_str(
            r#"{"types": [{"name": "A", "kind": "object", "members": [{"name": "x", "type": "List<"}]}]}"#,
        )
        .unwrap_err();
        let CatalogError::Parse { source, .. } = &err else {
            panic!("expected parse error, got {err}");
        };
        assert_eq!(source.path, "types[0].members[0].type");
    }

    #[test]
    fn duplicate_and_builtin_names_are_rejected() {
        let src = r#"{"types": [{"name": "A", "kind": "opaque"}, {"name": "A", "kind": "opaque"}]}"#;
        assert!(matches!(Catalog::from_json_str(src), Err(CatalogError::DuplicateType(n)) if n == "A"));
        let src = r#"{"types": [{"name": "int", "kind": "opaque"}]}"#;
        let err = Catalog::from_json_str(src).unwrap_err();
        assert!(matches!(err, CatalogError::ReservedName(ref n) if n == "int"));
        assert_eq!(err.to_string(), "`int` is a built-in type name and cannot be declared");
    }

    #[test]
    fn inheritance_problems_are_caught_at_load() {
        let unknown = r#"{"types": [{"name": "A", "kind": "object", "base": "Missing"}]}"#;
        assert!(matches!(Catalog::from_json_str(unknown), Err(CatalogError::UnknownBase { .. })));

        let not_object = r#"{"types": [
            {"name": "A", "kind": "object", "base": "E"},
            {"name": "E", "kind": "enum", "variants": []}]}"#;
        assert!(matches!(Catalog::from_json_str(not_object), Err(CatalogError::BaseNotObject { .. })));

        let cycle = r#"{"types": [
            {"name": "A", "kind": "object", "base": "B"},
            {"name": "B", "kind": "object", "base": "A"}]}"#;
        assert!(matches!(Catalog::from_json_str(cycle), Err(CatalogError::InheritanceCycle(_))));
    }

    #[test]
    fn unknown_member_types_are_caught_at_load() {
        let src = r#"{"types": [{"name": "A", "kind": "object",
            "members": [{"name": "x", "type": "List<Nope?>[]"}]}]}"#;
        let err = Catalog::from_json_str(src).unwrap_err();
        assert!(matches!(err, CatalogError::UnknownMemberType { ref used, .. } if used == "Nope"));
    }

    #[test]
    fn string_conversions() {
        let src = r#"{"types": [
            {"name": "Id", "kind": "object", "string_conversion": true},
            {"name": "Plain", "kind": "object"},
            {"name": "Mode", "kind": "enum", "variants": ["A"]}]}"#;
        let catalog = Catalog::from_json_str(src).unwrap();
        for yes in ["int", "guid", "datetime", "Id", "Mode", "Mode?"] {
            assert!(catalog.has_string_conversion(&t(yes)), "{yes}");
        }
        for no in ["bytes", "type", "Plain", "List<int>", "int[]", "Unknown"] {
            assert!(!catalog.has_string_conversion(&t(no)), "{no}");
        }
    }

    #[test]
    fn opaque_and_anonymous_types_fail_generation() {
        let src = r#"{"types": [
            {"name": "Handle", "kind": "opaque"},
            {"name": "Anon", "kind": "object", "anonymous": true}]}"#;
        let catalog = Catalog::from_json_str(src).unwrap();
        assert!(matches!(generate(&catalog, &t("Handle")), Err(SchemaError::UnsupportedType { .. })));
        assert!(matches!(generate(&catalog, &t("Anon")), Err(SchemaError::MissingTypeIdentity { .. })));
        assert!(matches!(generate(&catalog, &t("Ghost")), Err(SchemaError::UnknownType { .. })));
    }

    #[test]
    fn byte_arrays_are_byte_sequences() {
        let src = r#"{"types": [{"name": "Blob", "kind": "object", "members": [
            {"name": "Data", "type": "byte[]"},
            {"name": "MaybeData", "type": "u8[]?"},
            {"name": "Levels", "type": "byte?[]"},
            {"name": "Planes", "type": "byte[][]"}]}]}"#;
        let catalog = Catalog::from_json_str(src).unwrap();
        let doc = generate(&catalog, &t("Blob")).unwrap();
        let blob = doc.definitions["Blob"].to_json();
        let props = &blob["properties"];
        assert_eq!(props["Data"], json!({"type": "string"}));
        assert_eq!(props["MaybeData"], json!({"oneOf": [{"type": "null"}, {"type": "string"}]}));
        assert_eq!(props["Levels"]["type"], json!("array"));
        assert_eq!(props["Levels"]["items"]["oneOf"][1]["maximum"], json!(255));
        assert_eq!(props["Planes"], json!({"type": "array", "items": {"type": "string"}}));
    }
}
