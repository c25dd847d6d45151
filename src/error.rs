//! Error taxonomy for calls against the CRM API.
//!
//! Decode failures never appear here: an undecodable body is replaced by a
//! synthesized JSON object (see [`crate::client::decode_body`]) so callers
//! always get a structured value. Divide-by-zero in insight ratios is not an
//! error either; the affected insight line is simply omitted.

/// Failure of a single API interaction. Every variant is terminal for the
/// call that produced it; nothing is retried.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    /// Transport-level failure (DNS, refused connection, broken body stream).
    #[error("network failure: {0}")]
    Network(String),

    /// The server answered with a status outside 200-299.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The server explicitly rejected the credentials. The message is the
    /// server's own text.
    #[error("{0}")]
    Authentication(String),

    /// Login answered 2xx but carried no access token.
    #[error("login response did not contain an access token")]
    MissingToken,

    /// Neither a known alias nor a path.
    #[error("unknown endpoint: {0}")]
    UnknownEndpoint(String),

    /// The endpoint template contains `{id}` and no id was supplied.
    #[error("endpoint {0} requires an id")]
    MissingId(String),
}

impl ApiError {
    /// Status code to show on the error visualization. Transport failures
    /// have no status and report 0.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Http { status, .. } => *status,
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authentication_error_displays_server_message_verbatim() {
        let err = ApiError::Authentication("Invalid username or password".to_string());
        assert_eq!(err.to_string(), "Invalid username or password");
    }

    #[test]
    fn status_code_only_for_http_errors() {
        let http = ApiError::Http {
            status: 403,
            message: "Forbidden".to_string(),
        };
        assert_eq!(http.status_code(), 403);
        assert_eq!(ApiError::Network("refused".to_string()).status_code(), 0);
    }
}
