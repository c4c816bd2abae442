use thiserror::Error;

/// Failure of the underlying HTTP primitive (connection, TLS, timeout, body read).
#[derive(Debug, Error)]
pub enum TransportError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Error)]
pub enum JiraError {
    #[error("Request error")]
    Request(#[source] TransportError),

    /// Non-200 response carrying `errorMessages`, joined with newlines.
    #[error("{0}")]
    Api(String),

    #[error("HTTP status {0}")]
    HttpStatus(u16),

    #[error("credential command failed: {0}")]
    CredentialCommand(String),

    #[error("invalid Jira URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("failed to decode Jira response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Jira response is missing {0}")]
    MissingField(&'static str),
}

pub type Result<T, E = JiraError> = std::result::Result<T, E>;
