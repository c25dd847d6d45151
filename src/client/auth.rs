//! Credential exchange and bearer-token inspection.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Value, json};

use super::permissions::PermissionMatrix;
use super::{ApiClient, ApiResponse, read_response};
use crate::error::ApiError;

/// A successful login: the access token plus, when the server describes
/// the user, their role and permissions.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginGrant {
    pub token: String,
    pub permissions: Option<PermissionMatrix>,
}

impl ApiClient {
    /// Exchange username and password for an access token.
    ///
    /// The server's own `authentication_error` text is returned verbatim
    /// when present.
    pub fn login(&self, username: &str, password: &str) -> Result<LoginGrant, ApiError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(ApiError::Authentication(
                "username and password are required".to_string(),
            ));
        }

        let url = self.url_for(&self.login_path);
        let request = self.with_headers(self.agent.post(&url), None);
        let response = read_response(request.send_json(json!({
            "username": username,
            "password": password,
        })))?;

        let token = interpret_login(&response)?;
        Ok(LoginGrant {
            token,
            permissions: PermissionMatrix::from_login_body(&response.body),
        })
    }
}

/// Pull the access token out of a login response, or explain why not.
pub fn interpret_login(response: &ApiResponse) -> Result<String, ApiError> {
    let body = &response.body;

    if response.ok
        && let Some(token) = body.pointer("/data/tokens/access").and_then(Value::as_str)
        && !token.trim().is_empty()
    {
        return Ok(token.trim().to_string());
    }

    if let Some(reason) = body.pointer("/meta/errors/authentication_error") {
        let message = match reason {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        return Err(ApiError::Authentication(message));
    }

    if !response.ok {
        return Err(ApiError::Http {
            status: response.status,
            message: response.status_text.clone(),
        });
    }

    Err(ApiError::MissingToken)
}

// ---------------------------------------------------------------------------
// Token inspection
// ---------------------------------------------------------------------------

/// What can be read from a bearer token without verifying it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenStatus {
    /// A JWT that has not expired (or carries no `exp`).
    Active {
        username: Option<String>,
        expires_at: Option<DateTime<Utc>>,
    },
    /// A JWT whose `exp` is in the past.
    Expired { expired_at: DateTime<Utc> },
    /// Not a JWT. Still usable; the server decides.
    Opaque,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Claims {
    exp: Option<i64>,
    username: Option<String>,
}

/// Decode the JWT payload segment and compare `exp` with `now`.
pub fn inspect_token(token: &str, now: DateTime<Utc>) -> TokenStatus {
    let Some(claims) = decode_claims(token) else {
        return TokenStatus::Opaque;
    };

    let expires_at = claims.exp.and_then(|exp| DateTime::from_timestamp(exp, 0));
    match expires_at {
        Some(at) if at < now => TokenStatus::Expired { expired_at: at },
        _ => TokenStatus::Active {
            username: claims.username,
            expires_at,
        },
    }
}

fn decode_claims(token: &str) -> Option<Claims> {
    let mut parts = token.trim().split('.');
    let (_header, payload, _sig) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    serde_json::from_slice(&bytes).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(ok: bool, status: u16, body: Value) -> ApiResponse {
        ApiResponse {
            ok,
            status,
            status_text: if ok { "OK" } else { "Unauthorized" }.to_string(),
            body,
        }
    }

    fn jwt(claims: Value) -> String {
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
        format!("eyJhbGciOiJIUzI1NiJ9.{payload}.sig")
    }

    #[test]
    fn login_success_returns_access_token() {
        let resp = response(true, 200, json!({"data": {"tokens": {"access": "abc", "refresh": "r"}}}));
        assert_eq!(interpret_login(&resp), Ok("abc".to_string()));
    }

    #[test]
    fn login_failure_surfaces_server_message() {
        let resp = response(
            false,
            401,
            json!({"meta": {"errors": {"authentication_error": "Invalid credentials"}}}),
        );
        assert_eq!(
            interpret_login(&resp),
            Err(ApiError::Authentication("Invalid credentials".to_string()))
        );
    }

    #[test]
    fn login_failure_without_message_is_http_error() {
        let resp = response(false, 500, json!({"error": "DECODE_ERROR", "raw_data": ""}));
        assert_eq!(
            interpret_login(&resp),
            Err(ApiError::Http {
                status: 500,
                message: "Unauthorized".to_string()
            })
        );
    }

    #[test]
    fn login_ok_without_token_is_missing_token() {
        let resp = response(true, 200, json!({"data": {}}));
        assert_eq!(interpret_login(&resp), Err(ApiError::MissingToken));
    }

    #[test]
    fn inspect_active_token() {
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let token = jwt(json!({"exp": 1_800_000_000i64, "username": "manager"}));
        match inspect_token(&token, now) {
            TokenStatus::Active { username, expires_at } => {
                assert_eq!(username.as_deref(), Some("manager"));
                assert_eq!(expires_at.map(|t| t.timestamp()), Some(1_800_000_000));
            }
            other => panic!("expected active, got {other:?}"),
        }
    }

    #[test]
    fn inspect_expired_token() {
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let token = jwt(json!({"exp": 1_600_000_000i64}));
        assert!(matches!(inspect_token(&token, now), TokenStatus::Expired { .. }));
    }

    #[test]
    fn inspect_opaque_token() {
        let now = Utc::now();
        assert_eq!(inspect_token("not-a-jwt", now), TokenStatus::Opaque);
        assert_eq!(inspect_token("a.!!!.c", now), TokenStatus::Opaque);
        assert_eq!(inspect_token("a.b.c.d", now), TokenStatus::Opaque);
    }
}
