use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Sheet, tab or row not found: {0}")]
    NotFound(String),

    #[error("Store request quota exceeded - please wait before retrying")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            401 | 403 => ApiError::AccessDenied(truncated),
            404 => ApiError::NotFound(truncated),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(truncated),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, truncated)),
        }
    }

    /// True when the store answered with a non-success status. A transport
    /// failure may still have applied the write.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, ApiError::NetworkError(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_status_mapping() {
        assert!(matches!(
            ApiError::from_status(StatusCode::FORBIDDEN, "no key"),
            ApiError::AccessDenied(ref b) if b == "no key"
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::TOO_MANY_REQUESTS, ""),
            ApiError::RateLimited
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::BAD_GATEWAY, "upstream"),
            ApiError::ServerError(_)
        ));
        assert_eq!(
            ApiError::from_status(StatusCode::NOT_FOUND, "rowIndex=9").to_string(),
            "Sheet, tab or row not found: rowIndex=9"
        );
        match ApiError::from_status(StatusCode::METHOD_NOT_ALLOWED, "PATCH") {
            ApiError::InvalidResponse(msg) => assert!(msg.starts_with("Status 405")),
            other => panic!("unexpected mapping: {other:?}"),
        }
    }

    #[test]
    fn test_rejection_excludes_transport_errors() {
        assert!(ApiError::from_status(StatusCode::METHOD_NOT_ALLOWED, "").is_rejection());
        assert!(ApiError::RateLimited.is_rejection());

        let transport = reqwest::Client::new()
            .get("not a url")
            .build()
            .expect_err("invalid url should fail");
        assert!(!ApiError::NetworkError(transport).is_rejection());
    }

    #[test]
    fn test_long_body_is_truncated() {
        let body = "x".repeat(MAX_ERROR_BODY_LENGTH + 20);
        let truncated = ApiError::truncate_body(&body);
        assert!(truncated.starts_with(&"x".repeat(MAX_ERROR_BODY_LENGTH)));
        assert!(truncated.ends_with("(truncated, 520 total bytes)"));
    }
}
