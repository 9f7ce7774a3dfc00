use thiserror::Error;

/// Longest response body kept in an [`ApiError::Status`] for logging.
const MAX_BODY_EXCERPT: usize = 256;

/// Errors returned by the comics REST API client.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server responded with {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid API url: {0}")]
    InvalidUrl(String),

    #[error("invalid {0} header value")]
    InvalidHeader(&'static str),
}

impl ApiError {
    pub fn status(status: u16, body: &str) -> Self {
        let body = if body.len() > MAX_BODY_EXCERPT {
            let mut end = MAX_BODY_EXCERPT;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}...", &body[..end])
        } else {
            body.to_string()
        };
        Self::Status { status, body }
    }

    /// True for 404 responses, which the progress endpoint uses for "never opened".
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_bodies_are_truncated() {
        let body = "x".repeat(1000);
        match ApiError::status(500, &body) {
            ApiError::Status { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body.len(), MAX_BODY_EXCERPT + 3);
                assert!(body.ends_with("..."));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let body = "é".repeat(200);
        let err = ApiError::status(422, &body);
        assert!(err.to_string().starts_with("server responded with 422"));
    }

    #[test]
    fn not_found_detection() {
        assert!(ApiError::status(404, "").is_not_found());
        assert!(!ApiError::status(500, "").is_not_found());
    }
}
