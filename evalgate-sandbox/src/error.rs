use thiserror::Error;

/// Failures that end a submission
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("no code to evaluate")]
    InputRejected,

    #[error("sandbox unreachable: {0}")]
    SandboxUnreachable(String),

    #[error("sandbox returned an invalid response: {0}")]
    SandboxResponse(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Connect errors and timeouts mean the sandbox was never reached; everything
/// else means it answered with something we cannot use.
impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_status() || e.is_decode() {
            GatewayError::SandboxResponse(e.to_string())
        } else {
            GatewayError::SandboxUnreachable(e.to_string())
        }
    }
}

impl From<url::ParseError> for GatewayError {
    fn from(e: url::ParseError) -> Self {
        GatewayError::Config(format!("invalid url: {}", e))
    }
}

/// Paste upload failures. These never end a submission, they are only logged.
#[derive(Error, Debug)]
pub enum PasteError {
    #[error("paste request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("paste store answered without a usable key: {0}")]
    MissingKey(String),

    #[error("paste url could not be built: {0}")]
    InvalidUrl(#[from] url::ParseError),
}
