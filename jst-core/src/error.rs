use thiserror::Error;

pub type Result<T> = std::result::Result<T, TranspileError>;

/// Errors surfaced while turning a JSON Schema into a target schema.
///
/// Structural incompatibility is never an error: the merge lattice resolves
/// it by degrading the conflicting node to an opaque string column. Only
/// malformed input and illegal output identifiers end up here. Every variant
/// carries the dot-joined path of field names from the schema root.
#[derive(Error, Debug)]
pub enum TranspileError {
    #[error("invalid JSON Schema at `{path}`: {reason}")]
    Parse { path: String, reason: String },

    #[error("unsupported type `{name}` at `{path}`")]
    UnsupportedType { path: String, name: String },

    #[error("cannot derive a legal Avro name at `{path}`")]
    InvalidName { path: String },
}
