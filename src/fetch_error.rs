#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Upstream API returned {status}: {details}")]
    Status { status: u16, details: String },
    #[error("Invalid upstream response: {0}")]
    InvalidResponse(String),
}

impl FetchError {
    /// HTTP status carried by the error, if the upstream answered at all
    pub fn status_code(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            FetchError::Request(e) => e.status().map(|s| s.as_u16()),
            FetchError::InvalidResponse(_) => None,
        }
    }
}
