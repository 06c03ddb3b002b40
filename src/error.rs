use thiserror::Error;

/// Boxed transport error carried by [`Error::Network`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur when using the cerebras-client library.
#[derive(Error, Debug)]
pub enum Error {
    #[error("CEREBRAS_API_KEY not set. Export it or add it to ~/.config/cerebras/config")]
    MissingCredential,

    #[error("Unknown preset '{0}'. Valid presets are: refactor, test, docs, types, translate, explain")]
    UnknownPreset(String),

    #[error("Network error: {0}")]
    Network(#[source] BoxError),

    #[error("Cerebras API error {status_code}: {body}")]
    Api { status_code: u16, body: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Streaming error: {0}")]
    Streaming(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    pub fn api(status_code: u16, body: impl Into<String>) -> Self {
        Error::Api {
            status_code,
            body: body.into(),
        }
    }

    pub fn network(source: impl Into<BoxError>) -> Self {
        Error::Network(source.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }

    pub fn streaming(message: impl Into<String>) -> Self {
        Error::Streaming(message.into())
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Error::InvalidRequest(message.into())
    }

    /// HTTP status of an [`Error::Api`], if this is one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Api { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }

    /// The server rejected the API key (HTTP 401).
    pub fn is_auth_error(&self) -> bool {
        self.status_code() == Some(401)
    }

    /// The server is rate limiting this key (HTTP 429).
    pub fn is_rate_limited(&self) -> bool {
        self.status_code() == Some(429)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Network(Box::new(err))
    }
}
