use thiserror::Error;

/// Generation-time failures. Every variant aborts the run; nothing is retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("schema generation doesn't work with multidimensional arrays: `{ty}` has rank {rank}")]
    UnsupportedShape { ty: String, rank: usize },

    #[error("schema generation doesn't work with maps keyed by `{key}` (no string conversion) in `{ty}`")]
    UnsupportedKeyType { ty: String, key: String },

    #[error("type not supported for schema generation: `{ty}`")]
    UnsupportedType { ty: String },

    #[error("type `{ty}` has no qualified name, so no definition can be created for it")]
    MissingTypeIdentity { ty: String },

    #[error("unknown type `{ty}`")]
    UnknownType { ty: String },
}
