use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration, OffsetDateTime};
use tracing::debug;

use crate::state::AppState;

use super::claims::{Claims, Role};

/// HS256 signing material plus the lifetime stamped into issued tokens.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_minutes: i64,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        let jwt = &state.config.jwt;
        JwtKeys::new(&jwt.secret, jwt.ttl_minutes)
    }
}

impl JwtKeys {
    pub fn new(secret: &str, ttl_minutes: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_minutes,
        }
    }

    /// Signs `{sub, role, iat, exp}` for the given user.
    pub fn issue(&self, email: &str, role: Role) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let expires_at = now + Duration::minutes(self.ttl_minutes);

        let claims = Claims {
            sub: email.to_string(),
            role,
            iat: now.unix_timestamp() as usize,
            exp: expires_at.unix_timestamp() as usize,
        };

        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(email, role = role.as_str(), "jwt signed");
        Ok(token)
    }

    /// Checks signature, algorithm and expiry, then deserializes the payload.
    /// A payload missing `sub` or `role` fails here; nothing is looked up in
    /// the database.
    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> JwtKeys {
        JwtKeys::new("test-secret", 60)
    }

    #[test]
    fn issue_then_verify_round_trip() {
        let token = keys().issue("ana@example.com", Role::Admin).unwrap();
        assert_eq!(token.split('.').count(), 3);

        let claims = keys().verify(&token).unwrap();
        assert_eq!(claims.sub, "ana@example.com");
        assert_eq!(claims.role, Role::Admin);
        assert!(claims.exp > claims.iat);
        assert_eq!(claims.exp - claims.iat, 60 * 60);
    }

    #[test]
    fn tampered_signature_is_rejected() {
        let token = keys().issue("ana@example.com", Role::User).unwrap();

        let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
        let sig = parts.remove(2);
        let head = if sig.starts_with('A') { "B" } else { "A" };
        parts.push(format!("{head}{}", &sig[1..]));

        assert!(keys().verify(&parts.join(".")).is_err());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = keys().issue("ana@example.com", Role::User).unwrap();
        let other = JwtKeys::new("other-secret", 60);
        assert!(other.verify(&token).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let expired = JwtKeys::new("test-secret", -120);
        let token = expired.issue("ana@example.com", Role::User).unwrap();
        assert!(keys().verify(&token).is_err());
    }

    #[test]
    fn payload_without_role_is_rejected() {
        let exp = OffsetDateTime::now_utc().unix_timestamp() + 3600;
        let payload = serde_json::json!({ "sub": "ana@example.com", "iat": 0, "exp": exp });
        let token = encode(
            &Header::default(),
            &payload,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        assert!(keys().verify(&token).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(keys().verify("").is_err());
        assert!(keys().verify("a.b.c").is_err());
        assert!(keys().verify("definitely not a jwt").is_err());
    }
}
