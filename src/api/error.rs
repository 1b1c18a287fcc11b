/// Failure of a backend request.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("not found")]
    NotFound,
    #[error("rate limit exceeded (429)")]
    RateLimited,
    #[error("invalid response: {0}")]
    Parse(String),
}

impl ApiError {
    /// Maps a non-success status to an error, pulling FastAPI's `detail` out of the body
    /// when there is one.
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            404 => Self::NotFound,
            429 => Self::RateLimited,
            _ => Self::Status {
                status,
                message: error_message(body),
            },
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited)
    }
}

fn error_message(body: &str) -> String {
    let detail = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| match value.get("detail") {
            Some(serde_json::Value::String(detail)) => Some(detail.clone()),
            Some(other) => Some(other.to_string()),
            None => None,
        });
    let message = detail.unwrap_or_else(|| body.trim().to_string());
    if message.chars().count() > 200 {
        message.chars().take(200).chain(std::iter::once('…')).collect()
    } else {
        message
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Parse(err.to_string())
        } else {
            Self::Request(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}
