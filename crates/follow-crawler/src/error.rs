use std::fmt;
use thiserror::Error;

/// Classification of a single failed remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// HTTP 401. The target is protected or suspended.
    Unauthorized,
    /// HTTP 404.
    NotFound,
    /// HTTP 429. Expected throttling, always retried after the cooldown.
    RateLimited,
    /// 5xx family.
    TransientServer,
    /// Connection reset, timeout or a body that could not be decoded.
    TransientTransport,
    /// Anything else, including unclassified HTTP statuses.
    Fatal,
}

impl FailureKind {
    /// Maps an HTTP status code onto the failure taxonomy.
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => FailureKind::Unauthorized,
            404 => FailureKind::NotFound,
            429 => FailureKind::RateLimited,
            500..=599 => FailureKind::TransientServer,
            _ => FailureKind::Fatal,
        }
    }

    /// Unauthorized and NotFound resolve to "no data" instead of an error.
    pub fn is_unreachable(self) -> bool {
        matches!(self, FailureKind::Unauthorized | FailureKind::NotFound)
    }

    pub fn is_transient(self) -> bool {
        matches!(
            self,
            FailureKind::TransientServer | FailureKind::TransientTransport
        )
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureKind::Unauthorized => "unauthorized",
            FailureKind::NotFound => "not found",
            FailureKind::RateLimited => "rate limited",
            FailureKind::TransientServer => "transient server error",
            FailureKind::TransientTransport => "transient transport error",
            FailureKind::Fatal => "fatal",
        };
        f.write_str(label)
    }
}

/// Tagged outcome of a failed remote call, as returned by a [`crate::api::SocialApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl ApiFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        Self::new(FailureKind::from_status(status), message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(FailureKind::TransientTransport, message)
    }
}

impl fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ApiFailure {}

#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("Fatal error calling {endpoint}: {message}")]
    Fatal { endpoint: String, message: String },

    #[error("Too many retries calling {endpoint} ({attempts} attempts, last failure: {kind})")]
    RetriesExhausted {
        endpoint: String,
        attempts: u32,
        kind: FailureKind,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Seed account could not be resolved: {0}")]
    SeedUnresolved(String),

    #[error("Crawl cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CrawlError {
    /// Errors that abort a crawl: anything that reaches the top is fatal except
    /// a requested cancellation.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, CrawlError::Cancelled)
    }
}

pub type Result<T> = std::result::Result<T, CrawlError>;
