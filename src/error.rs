use thiserror::Error;

pub use crate::client::transport::TransportError;
use crate::coerce::Path;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Coercion(#[from] CoercionError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Missing required field `{field}` when building {model}")]
    MissingRequiredField { model: &'static str, field: &'static str },
    #[error("{model} has no field named `{field}`")]
    UnknownField { model: &'static str, field: String },

    #[error("Expected a response body but the response was empty")]
    EmptyResponse,
    #[error("Response body is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// A raw value didn't match the shape its descriptor expects.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind} (at {path})")]
pub struct CoercionError {
    pub path: Path,
    pub kind: CoercionErrorKind,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoercionErrorKind {
    #[error("missing required field `{field}`")]
    MissingField { field: &'static str },
    #[error("expected {expected}, found {actual}")]
    TypeMismatch { expected: String, actual: String },
    #[error("expected an integer, found fractional number {0}")]
    FractionalInteger(f64),
    #[error("invalid datetime {value:?}: {reason}")]
    InvalidDateTime { value: String, reason: String },
    #[error("invalid next page link {link:?}: {reason}")]
    InvalidLink { link: String, reason: String },
    #[error(transparent)]
    Union(UnionResolutionError),
}

/// None of a union's variants accepted the raw value.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("no variant of union {union} matched ({} attempted)", .attempts.len())]
pub struct UnionResolutionError {
    pub union: &'static str,
    /// Every attempted variant's tag and the error it failed with, in the order they were tried.
    pub attempts: Vec<(&'static str, CoercionError)>,
}

impl CoercionError {
    pub fn new(path: Path, kind: CoercionErrorKind) -> Self {
        Self { path, kind }
    }

    pub(crate) fn missing_field(path: Path, field: &'static str) -> Self {
        Self::new(path, CoercionErrorKind::MissingField { field })
    }

    pub(crate) fn mismatch<E, A>(path: Path, expected: E, actual: A) -> Self
    where
        E: ToString,
        A: Into<String>,
    {
        Self::new(
            path,
            CoercionErrorKind::TypeMismatch {
                expected: expected.to_string(),
                actual: actual.into(),
            },
        )
    }

    /// Returns the union resolution error, if this error is one.
    pub fn as_union_error(&self) -> Option<&UnionResolutionError> {
        match &self.kind {
            CoercionErrorKind::Union(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coercion_error_display_includes_path() {
        let err = CoercionError::mismatch(Path::root().key("album").key("name"), "string", "number 5");
        assert_eq!(err.to_string(), "expected string, found number 5 (at $.album.name)");
    }

    #[test]
    fn union_error_display() {
        let err = UnionResolutionError {
            union: "PlayableItem",
            attempts: vec![
                ("track", CoercionError::missing_field(Path::root(), "id")),
                ("episode", CoercionError::missing_field(Path::root(), "id")),
            ],
        };

        assert_eq!(err.to_string(), "no variant of union PlayableItem matched (2 attempted)");
    }

    #[test]
    fn coercion_converts_into_error() {
        let err: Error = CoercionError::missing_field(Path::root(), "id").into();
        assert!(matches!(err, Error::Coercion(_)));
    }
}
