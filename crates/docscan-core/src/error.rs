use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Payload errors
    #[error("Invalid completion payload: {0}")]
    InvalidPayload(String),

    #[error("Malformed JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    // Credential errors
    #[error("Access credential is empty after sanitization")]
    EmptyCredential,
}

pub type Result<T> = std::result::Result<T, Error>;
