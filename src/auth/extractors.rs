use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, HeaderMap},
};
use tracing::warn;

use crate::error::ApiError;

use super::{claims::Claims, jwt::JwtKeys};

/// Extracts and verifies the bearer token, yielding the caller's claims.
/// Handlers taking this argument are unreachable without a valid token.
pub struct CurrentUser(pub Claims);

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let auth = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    auth.strip_prefix("Bearer ")
        .or_else(|| auth.strip_prefix("bearer "))
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(ApiError::InvalidToken)?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(token).map_err(|e| {
            warn!(error = %e, "rejected bearer token");
            ApiError::InvalidToken
        })?;

        Ok(CurrentUser(claims))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers_with(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn accepts_both_bearer_spellings() {
        assert_eq!(bearer_token(&headers_with("Bearer abc.def.ghi")), Some("abc.def.ghi"));
        assert_eq!(bearer_token(&headers_with("bearer abc.def.ghi")), Some("abc.def.ghi"));
    }

    #[test]
    fn rejects_missing_or_foreign_schemes() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);
        assert_eq!(bearer_token(&headers_with("Basic dXNlcjpwdw==")), None);
        assert_eq!(bearer_token(&headers_with("Bearer")), None);
        assert_eq!(bearer_token(&headers_with("abc.def.ghi")), None);
    }
}
