use thiserror::Error;

/// Failures while turning a JSON document into a diagram.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("invalid document JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{entity} {key} is missing required field `{field}`")]
    MissingField {
        entity: &'static str,
        key: String,
        field: &'static str,
    },

    #[error("message {message} refers to unknown part {endpoint}")]
    UnknownEndpoint { message: String, endpoint: String },

    #[error("duplicate key {0}")]
    DuplicateKey(String),
}
