use thiserror::Error;

#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Unauthorized - token may be expired")]
    Unauthorized,

    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Remote store unavailable: {0}")]
    Unavailable(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl RemoteError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            // Back off to a char boundary; bodies are arbitrary bytes from
            // the server and may hold multibyte UTF-8 at the cut point.
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!(
                "{}... (truncated, {} total bytes)",
                &body[..end],
                body.len()
            )
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            401 => RemoteError::Unauthorized,
            403 => RemoteError::PermissionDenied(truncated),
            404 => RemoteError::NotFound(truncated),
            503 => RemoteError::Unavailable(truncated),
            500..=599 => RemoteError::ServerError(truncated),
            _ => RemoteError::InvalidResponse(format!("Status {}: {}", status, truncated)),
        }
    }

    /// True for authorization-style failures, which the read path maps to
    /// an empty collection instead of an error.
    pub fn is_permission_denied(&self) -> bool {
        matches!(
            self,
            RemoteError::PermissionDenied(_) | RemoteError::Unauthorized
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_maps_codes() {
        assert!(matches!(
            RemoteError::from_status(reqwest::StatusCode::UNAUTHORIZED, ""),
            RemoteError::Unauthorized
        ));
        assert!(matches!(
            RemoteError::from_status(reqwest::StatusCode::FORBIDDEN, "no access"),
            RemoteError::PermissionDenied(_)
        ));
        assert!(matches!(
            RemoteError::from_status(reqwest::StatusCode::SERVICE_UNAVAILABLE, ""),
            RemoteError::Unavailable(_)
        ));
        assert!(matches!(
            RemoteError::from_status(reqwest::StatusCode::INTERNAL_SERVER_ERROR, ""),
            RemoteError::ServerError(_)
        ));
    }

    #[test]
    fn test_truncate_short_body_is_untouched() {
        let err = RemoteError::from_status(reqwest::StatusCode::BAD_GATEWAY, "upstream timeout");
        assert!(err.to_string().contains("upstream timeout"));
        assert!(!err.to_string().contains("truncated"));
    }

    #[test]
    fn test_truncate_long_multibyte_body() {
        // A euro sign is 3 bytes; 200 of them put a char boundary astride
        // the 500-byte cut point.
        let body = "\u{20ac}".repeat(200);
        let err = RemoteError::from_status(reqwest::StatusCode::INTERNAL_SERVER_ERROR, &body);

        let message = err.to_string();
        assert!(message.contains("truncated, 600 total bytes"));
        // Kept prefix ends at the nearest char boundary below the limit.
        assert!(message.contains(&"\u{20ac}".repeat(166)));
        assert!(!message.contains(&"\u{20ac}".repeat(167)));
    }
}
