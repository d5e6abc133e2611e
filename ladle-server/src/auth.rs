//! Service auth for the write endpoints. The caller presents a bearer token
//! and we compare its sha256 digest against `AUTH_SECRET`, which holds the
//! hex digest of the expected token. The plaintext token never lives in the
//! server environment.

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use sha2::Digest;

use crate::errors::WebError;

pub struct ServicePrincipal;

#[async_trait]
impl<S> FromRequestParts<S> for ServicePrincipal
where
    S: Send + Sync,
{
    type Rejection = WebError;

    async fn from_request_parts(parts: &mut Parts, _: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| WebError::Auth("missing Authorization header".into()))?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| WebError::Auth("expected a bearer token".into()))?;
        let expected_hex = dotenvy::var("AUTH_SECRET")
            .map_err(|_| WebError::Auth("no service secret configured".into()))?;
        let expected = hex::decode(expected_hex.trim())
            .map_err(|_| WebError::Auth("service secret is not valid hex".into()))?;

        let presented = sha2::Sha256::digest(token.as_bytes());
        if presented.as_slice() == expected.as_slice() {
            Ok(ServicePrincipal)
        } else {
            Err(WebError::Auth("invalid service token".into()))
        }
    }
}
