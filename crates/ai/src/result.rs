use thiserror::Error;

/// Failures talking to the language model.
///
/// These never reach HTTP clients: the analyzer logs them and answers with
/// an empty item list.
#[derive(Debug, Error)]
pub enum AiError {
    #[error("invalid model input: {0}")]
    InvalidInput(String),

    #[error("model request failed: {0}")]
    Request(String),

    #[error("model returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("model response could not be decoded: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for AiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AiError::Decode(err.to_string())
        } else {
            AiError::Request(err.to_string())
        }
    }
}
