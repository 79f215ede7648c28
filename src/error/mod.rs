use thiserror::Error;

/// Error types for the CineBot pipeline.
///
/// Every failure a pipeline run can end with is one of these variants. The
/// UI layer gets a stable machine-readable kind from [`CineBotError::kind`]
/// and, for parse failures, the offending model output from
/// [`CineBotError::raw_text`].
///
/// # Examples
///
/// ```
/// use cinebot::{CineBotError, GenerationError};
///
/// let err: CineBotError = GenerationError::MalformedJson {
///     raw_text: "Sorry, I cannot help.".to_string(),
///     message: "expected value at line 1 column 1".to_string(),
/// }
/// .into();
///
/// assert_eq!(err.kind(), "malformed_json");
/// assert_eq!(err.raw_text(), Some("Sorry, I cannot help."));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CineBotError {
    /// A required configuration value (usually an API credential) is absent or invalid
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The request failed validation before reaching the pipeline
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The recommendation generator failed
    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),
}

impl CineBotError {
    /// Stable identifier for the failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            CineBotError::Configuration(_) => "configuration",
            CineBotError::InvalidRequest(_) => "invalid_request",
            CineBotError::Generation(e) => e.kind(),
        }
    }

    /// Raw model output that failed to parse, if this error carries one.
    pub fn raw_text(&self) -> Option<&str> {
        match self {
            CineBotError::Generation(e) => e.raw_text(),
            _ => None,
        }
    }
}

/// Terminal failures of the recommendation generator.
///
/// Only transport failures are retried (inside the generator); every variant
/// here ends the current run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationError {
    /// The provider envelope held no generated text at all
    #[error("provider returned no completion choices")]
    NoChoices,

    /// The generated text is not valid JSON
    #[error("model output is not valid JSON: {message}")]
    MalformedJson { raw_text: String, message: String },

    /// The JSON parsed but does not have the expected shape
    #[error("model output does not match the recommendation schema: {message}")]
    SchemaMismatch { raw_text: String, message: String },

    /// Every attempt in the retry budget failed with a transient transport error
    #[error("provider unreachable after {attempts} attempts: {last_error}")]
    TransportExhausted {
        attempts: u32,
        last_error: TransportError,
    },

    /// The provider failed in a way retrying cannot fix (e.g. HTTP 401)
    #[error("provider rejected the request: {source}")]
    ProviderRejected { source: TransportError },
}

impl GenerationError {
    pub fn kind(&self) -> &'static str {
        match self {
            GenerationError::NoChoices => "no_choices",
            GenerationError::MalformedJson { .. } => "malformed_json",
            GenerationError::SchemaMismatch { .. } => "schema_mismatch",
            GenerationError::TransportExhausted { .. } => "transport_exhausted",
            GenerationError::ProviderRejected { .. } => "provider_rejected",
        }
    }

    pub fn raw_text(&self) -> Option<&str> {
        match self {
            GenerationError::MalformedJson { raw_text, .. }
            | GenerationError::SchemaMismatch { raw_text, .. } => Some(raw_text),
            _ => None,
        }
    }
}

/// Outbound HTTP failure, shared by the LLM adapters and the metadata enricher.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("{provider} API returned HTTP {status}: {body}")]
    Status {
        provider: String,
        status: u16,
        body: String,
    },

    /// The connection broke while the response body was being read
    #[error("failed to read response body: {0}")]
    Body(String),

    /// The response body is not the provider's JSON envelope (e.g. a proxy
    /// error page served with 200)
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// The request was sent but no response came back, e.g. the peer closed
    /// the connection
    #[error("HTTP request failed: {0}")]
    Request(String),
}

impl TransportError {
    /// Whether a retry could plausibly succeed.
    ///
    /// Only an HTTP 4xx other than 429 is permanent: the provider saw the
    /// request and refused it. Every other transport failure is retried.
    pub fn is_transient(&self) -> bool {
        match self {
            TransportError::Status { status, .. } => !(400..500).contains(status) || *status == 429,
            TransportError::Timeout
            | TransportError::Connect(_)
            | TransportError::Body(_)
            | TransportError::Decode(_)
            | TransportError::Request(_) => true,
        }
    }
}

/// Failure of a single provider call, before retry handling.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("no completion choices returned")]
    NoChoices,
}

impl ProviderError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProviderError::Transport(e) if e.is_transient())
    }
}

/// A specialized Result type for CineBot operations.
pub type Result<T> = std::result::Result<T, CineBotError>;
