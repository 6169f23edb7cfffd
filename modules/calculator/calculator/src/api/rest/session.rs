//! Session identity carried in a signed cookie.
//!
//! The cookie value is an HS256 JWT whose `sid` claim is the session key.
//! A request without a cookie, or with one that fails verification, gets a
//! freshly generated session and a `Set-Cookie` on the response.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, HeaderValue, header, request::Parts},
    middleware::Next,
    response::Response,
};
use calc_errors::Problem;
use calculator_sdk::SessionKey;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::SessionConfig;

#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    sid: Uuid,
}

/// Issues and verifies session cookies.
#[derive(Clone)]
pub struct SessionState {
    inner: Arc<SessionKeys>,
}

struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    cookie_name: String,
    secure: bool,
}

impl SessionState {
    #[must_use]
    pub fn new(cfg: &SessionConfig) -> Self {
        let secret = cfg.secret_key.expose_secret().as_bytes();

        let mut validation = Validation::new(Algorithm::HS256);
        // Session tokens carry no expiry or audience.
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        let empty_claims: &[&str] = &[];
        validation.set_required_spec_claims(empty_claims);

        Self {
            inner: Arc::new(SessionKeys {
                encoding: EncodingKey::from_secret(secret),
                decoding: DecodingKey::from_secret(secret),
                validation,
                cookie_name: cfg.cookie_name.clone(),
                secure: cfg.secure_cookie,
            }),
        }
    }

    #[must_use]
    pub fn cookie_name(&self) -> &str {
        &self.inner.cookie_name
    }

    /// Sign a token for `session`.
    ///
    /// # Errors
    /// Returns an error if the token cannot be encoded.
    pub fn issue(&self, session: &SessionKey) -> Result<String, jsonwebtoken::errors::Error> {
        let claims = SessionClaims {
            sid: session.as_uuid(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.inner.encoding)
    }

    /// Session key of a valid token, `None` for anything else.
    #[must_use]
    pub fn verify(&self, token: &str) -> Option<SessionKey> {
        match decode::<SessionClaims>(token, &self.inner.decoding, &self.inner.validation) {
            Ok(data) => Some(SessionKey::from_uuid(data.claims.sid)),
            Err(e) => {
                tracing::debug!(error = %e, "Rejected session cookie");
                None
            }
        }
    }

    /// `Set-Cookie` value carrying `token`.
    #[must_use]
    pub fn set_cookie_value(&self, token: &str) -> String {
        let mut cookie = format!(
            "{}={token}; Path=/; HttpOnly; SameSite=Lax",
            self.inner.cookie_name
        );
        if self.inner.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }

    fn cookie_token<'a>(&self, headers: &'a HeaderMap) -> Option<&'a str> {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == self.inner.cookie_name)
            .map(|(_, value)| value.trim())
    }

    /// Resolve the session of a request; the flag is `true` for a new session.
    #[must_use]
    pub fn resolve(&self, headers: &HeaderMap) -> (SessionKey, bool) {
        match self.cookie_token(headers).and_then(|t| self.verify(t)) {
            Some(session) => (session, false),
            None => (SessionKey::generate(), true),
        }
    }
}

/// Attach the caller's `SessionKey` to the request, issuing a cookie when new.
pub async fn session_middleware(
    State(sessions): State<SessionState>,
    mut request: Request,
    next: Next,
) -> Response {
    let (session, fresh) = sessions.resolve(request.headers());
    request.extensions_mut().insert(session);

    let mut response = next.run(request).await;

    if fresh {
        tracing::debug!(sid = %session, "Started new session");
        match sessions.issue(&session) {
            Ok(token) => match HeaderValue::from_str(&sessions.set_cookie_value(&token)) {
                Ok(value) => {
                    response.headers_mut().append(header::SET_COOKIE, value);
                }
                Err(e) => tracing::error!(error = %e, "Session cookie is not a valid header"),
            },
            Err(e) => tracing::error!(error = %e, "Failed to sign session cookie"),
        }
    }

    response
}

/// Extractor for the session key placed by [`session_middleware`].
#[derive(Debug, Clone, Copy)]
pub struct Session(pub SessionKey);

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = Problem;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<SessionKey>().copied().map(Session).ok_or_else(|| {
            tracing::error!("SessionKey not found - session middleware not configured");
            calc_errors::internal_error("Internal server error").with_code("INTERNAL_ERROR")
        })
    }
}
