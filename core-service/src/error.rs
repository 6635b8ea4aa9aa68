use thiserror::Error;

use crate::quality::QualityLevel;

#[derive(Error, Debug)]
pub enum ServiceError {
    /// No registered kind claims the identifier.
    #[error("Invalid URL: no object kind recognizes {0}")]
    InvalidUrl(String),

    #[error("Insufficient audio quality: required {required}, best available {best_available:?}")]
    InsufficientAudioQuality {
        required: QualityLevel,
        best_available: Option<QualityLevel>,
    },

    #[error("Invalid search type: {kind} is not searchable in {backend}")]
    InvalidSearchType { backend: String, kind: String },

    #[error("Quality scale mismatch: expected a level of {expected}, got {found}")]
    QualityScaleMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("Unknown quality level {name} in scale {scale}")]
    UnknownQualityLevel { scale: &'static str, name: String },

    #[error("Quality scale {0} declares no levels")]
    EmptyQualityScale(&'static str),

    #[error("Invalid quality range: required {required} is above preferred {preferred}")]
    InvalidQualityRange {
        required: QualityLevel,
        preferred: QualityLevel,
    },

    #[error("{kind} is not an object kind of {base}")]
    NotAnObjectKind { base: String, kind: String },

    #[error("Object kind {kind} is not registered with {backend}")]
    UnknownKind { backend: String, kind: String },

    #[error("Object kind {kind} is already registered with {backend}")]
    DuplicateKind { backend: String, kind: String },

    #[error("{collection} does not collect {item}")]
    NotCollected {
        collection: &'static str,
        item: &'static str,
    },

    #[error("{collection} declares {item} but provides no `{accessor}` producer")]
    MissingProducer {
        collection: &'static str,
        item: &'static str,
        accessor: String,
    },

    #[error("{collection} declares both {first} and {second} under the `{accessor}` accessor")]
    AccessorConflict {
        collection: &'static str,
        accessor: String,
        first: &'static str,
        second: &'static str,
    },

    #[error("Operation not supported: {operation}")]
    NotSupported { operation: String },

    #[error("Session was closed before the object could reach it")]
    SessionClosed,

    #[error("Bridge error: {0}")]
    Bridge(#[from] bridge_traits::error::BridgeError),

    #[error("Runtime error: {0}")]
    Runtime(#[from] core_runtime::Error),
}

impl ServiceError {
    pub fn not_supported(operation: impl Into<String>) -> Self {
        ServiceError::NotSupported {
            operation: operation.into(),
        }
    }

    /// Errors that signal a broken contract between backend and caller
    /// rather than a condition worth retrying.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            ServiceError::QualityScaleMismatch { .. }
                | ServiceError::NotAnObjectKind { .. }
                | ServiceError::NotCollected { .. }
                | ServiceError::MissingProducer { .. }
                | ServiceError::AccessorConflict { .. }
                | ServiceError::DuplicateKind { .. }
                | ServiceError::InvalidSearchType { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;
