//! Type Description Provider interface.
//!
//! The registry never inspects types itself. Everything it needs to know
//! about a type (its shape, whether it has a stable name, whether it can be
//! used as a map key) is answered by a [`TypeProvider`]. Implementations can
//! be backed by static type information, derived trait impls, or a manual
//! catalog such as [`crate::catalog::Catalog`].

use crate::error::SchemaError;
use crate::ir::PrimitiveKind;

// ------------------------------- Type refs -------------------------------- //

/// A type as used at some site: a field, a generic argument, an array element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeRef {
    pub kind: TypeRefKind,
    pub nullable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRefKind {
    /// A named type, possibly constructed from a generic definition.
    Named { name: String, args: Vec<TypeRef> },
    /// `element[]` (rank 1), `element[,]` (rank 2), ...
    Array { element: Box<TypeRef>, rank: usize },
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self::generic(name, Vec::new())
    }

    pub fn generic(name: impl Into<String>, args: Vec<TypeRef>) -> Self {
        Self {
            kind: TypeRefKind::Named { name: name.into(), args },
            nullable: false,
        }
    }

    pub fn array(element: TypeRef) -> Self {
        Self::array_of_rank(element, 1)
    }

    pub fn array_of_rank(element: TypeRef, rank: usize) -> Self {
        Self {
            kind: TypeRefKind::Array { element: Box::new(element), rank },
            nullable: false,
        }
    }

    /// Mark this usage as accepting `null`.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// The same type with the nullable marker stripped.
    pub fn non_nullable(&self) -> Self {
        Self { kind: self.kind.clone(), nullable: false }
    }

    /// Name of a named type, `None` for arrays.
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            TypeRefKind::Named { name, .. } => Some(name),
            TypeRefKind::Array { .. } => None,
        }
    }
}

// -------------------------------- Shapes ---------------------------------- //

/// Closed set of shape classifications a provider can report.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeShape {
    Primitive(PrimitiveKind),
    Array { rank: usize, element: TypeRef },
    /// A constructed generic: `definition<args...>`.
    Generic { definition: String, args: Vec<TypeRef> },
    Enum(EnumShape),
    Object(ObjectShape),
    /// Known to the provider but with no schema representation.
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct EnumShape {
    pub variants: Vec<String>, // declaration order
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectShape {
    /// Every member the type exposes, in the provider's enumeration order.
    /// Filtering (visibility, ignore markers) happens in the registry.
    pub members: Vec<MemberDescriptor>,
    pub description: Option<String>,
}

/// One field/property of a composite.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberDescriptor {
    pub name: String,
    /// Override for the exposed name.
    pub rename: Option<String>,
    pub ty: TypeRef,
    pub required: bool,
    pub ignored: bool,
    pub public: bool,
    /// Explicit opt-in marker; lets a non-public member through.
    pub included: bool,
    pub description: Option<String>,
}

impl MemberDescriptor {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            rename: None,
            ty,
            required: false,
            ignored: false,
            public: true,
            included: false,
            description: None,
        }
    }

    pub fn exposed_name(&self) -> &str {
        self.rename.as_deref().unwrap_or(&self.name)
    }

    /// Public or opted in, and not ignored.
    pub fn is_candidate(&self) -> bool {
        (self.public || self.included) && !self.ignored
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn ignored(mut self) -> Self {
        self.ignored = true;
        self
    }

    pub fn private(mut self) -> Self {
        self.public = false;
        self
    }

    pub fn included(mut self) -> Self {
        self.included = true;
        self
    }

    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.rename = Some(name.into());
        self
    }

    pub fn described(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }
}

// ------------------------------- Provider --------------------------------- //

pub trait TypeProvider {
    /// Shape of a type. Nullability is carried by `ty` itself and is already
    /// stripped when the registry asks.
    fn classify(&self, ty: &TypeRef) -> Result<TypeShape, SchemaError>;

    /// Stable, globally unique name used as the definition key.
    fn qualified_name(&self, ty: &TypeRef) -> Option<String>;

    /// Whether `ty` has a registered two-way conversion to and from string.
    fn has_string_conversion(&self, ty: &TypeRef) -> bool;
}

impl<P: TypeProvider + ?Sized> TypeProvider for &P {
    fn classify(&self, ty: &TypeRef) -> Result<TypeShape, SchemaError> {
        (**self).classify(ty)
    }

    fn qualified_name(&self, ty: &TypeRef) -> Option<String> {
        (**self).qualified_name(ty)
    }

    fn has_string_conversion(&self, ty: &TypeRef) -> bool {
        (**self).has_string_conversion(ty)
    }
}
