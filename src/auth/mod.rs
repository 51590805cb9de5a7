use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SecurityConfig;
use crate::database::models::UserId;

/// Session token claims. The subject is the owning user's id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: UserId,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(user_id: UserId, expiry: Duration) -> Result<Self, JwtError> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(expiry)
            .ok_or(JwtError::ExpiryOutOfRange)?;
        Ok(Self {
            sub: user_id,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        })
    }
}

/// Token lifetime for a number of hours, rejecting values chrono cannot represent
pub fn expiry_from_hours(hours: u64) -> Result<Duration, JwtError> {
    i64::try_from(hours)
        .ok()
        .and_then(Duration::try_hours)
        .ok_or(JwtError::ExpiryOutOfRange)
}

/// Reasons a request's credential was rejected. All map to 401.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("No token, authorization denied")]
    MissingCredential,

    #[error("Token format is invalid")]
    MalformedCredential,

    #[error("Token is not valid")]
    InvalidCredential,
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid JWT secret")]
    InvalidSecret,

    #[error("Token lifetime is out of range")]
    ExpiryOutOfRange,
}

/// Stateless bearer token verification.
pub trait TokenVerifier: Send + Sync {
    /// Checks signature and expiry and returns the embedded user id.
    fn verify_token(&self, token: &str) -> Result<UserId, AuthError>;
}

/// HS256 token service bound to a shared secret.
#[derive(Clone)]
pub struct JwtTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expiry: Duration,
}

impl JwtTokenService {
    pub fn new(secret: &str, expiry_hours: u64) -> Result<Self, JwtError> {
        if secret.is_empty() {
            return Err(JwtError::InvalidSecret);
        }
        let mut validation = Validation::default();
        validation.leeway = 0;
        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            expiry: expiry_from_hours(expiry_hours)?,
        })
    }

    pub fn from_config(security: &SecurityConfig) -> Result<Self, JwtError> {
        Self::new(&security.jwt_secret, security.jwt_expiry_hours)
    }

    /// Mint a token for `user_id` using the configured lifetime
    pub fn issue(&self, user_id: UserId) -> Result<String, JwtError> {
        self.issue_claims(&Claims::new(user_id, self.expiry)?)
    }

    pub fn issue_claims(&self, claims: &Claims) -> Result<String, JwtError> {
        encode(&Header::default(), claims, &self.encoding_key)
            .map_err(|e| JwtError::TokenGeneration(e.to_string()))
    }

    /// Decode and validate, returning the full claim set
    pub fn decode_claims(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("Rejected bearer token: {}", e);
                AuthError::InvalidCredential
            })
    }
}

impl TokenVerifier for JwtTokenService {
    fn verify_token(&self, token: &str) -> Result<UserId, AuthError> {
        self.decode_claims(token).map(|claims| claims.sub)
    }
}

/// Split an `Authorization` header value into its bearer token.
///
/// The value must be exactly two whitespace-separated parts with a `Bearer`
/// scheme (case-insensitive).
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let value = header.ok_or(AuthError::MissingCredential)?;
    let mut parts = value.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("bearer") => Ok(token),
        _ => Err(AuthError::MalformedCredential),
    }
}

/// Resolve the caller identity from a raw header value.
pub fn verify(verifier: &dyn TokenVerifier, header: Option<&str>) -> Result<UserId, AuthError> {
    let token = bearer_token(header)?;
    verifier.verify_token(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    fn service() -> JwtTokenService {
        JwtTokenService::new(SECRET, 1).unwrap()
    }

    #[test]
    fn issued_token_verifies_to_same_user() {
        let service = service();
        let user = UserId::new();
        let token = service.issue(user).unwrap();

        let header = format!("Bearer {}", token);
        assert_eq!(verify(&service, Some(header.as_str())), Ok(user));
    }

    #[test]
    fn missing_header_is_missing_credential() {
        assert_eq!(verify(&service(), None), Err(AuthError::MissingCredential));
    }

    #[test]
    fn header_shapes_that_are_malformed() {
        for header in ["", "Bearer", "Bearer ", "abc.def.ghi", "Bearer a b", "Basic dXNlcjpwdw=="] {
            assert_eq!(
                bearer_token(Some(header)),
                Err(AuthError::MalformedCredential),
                "header {:?}",
                header
            );
        }
    }

    #[test]
    fn scheme_is_case_insensitive() {
        assert_eq!(bearer_token(Some("bearer tok")), Ok("tok"));
        assert_eq!(bearer_token(Some("BEARER  tok")), Ok("tok"));
    }

    #[test]
    fn wrong_secret_is_invalid() {
        let other = JwtTokenService::new("another-secret", 1).unwrap();
        let token = other.issue(UserId::new()).unwrap();
        assert_eq!(service().verify_token(&token), Err(AuthError::InvalidCredential));
    }

    #[test]
    fn expired_token_is_invalid() {
        let service = service();
        let claims = Claims::new(UserId::new(), Duration::hours(-2)).unwrap();
        let token = service.issue_claims(&claims).unwrap();
        assert_eq!(service.verify_token(&token), Err(AuthError::InvalidCredential));
    }

    #[test]
    fn garbage_token_is_invalid() {
        assert_eq!(
            verify(&service(), Some("Bearer not-a-jwt")),
            Err(AuthError::InvalidCredential)
        );
    }

    #[test]
    fn non_uuid_subject_is_invalid() {
        #[derive(Serialize)]
        struct Foreign {
            sub: &'static str,
            iat: i64,
            exp: i64,
        }
        let now = Utc::now().timestamp();
        let token = encode(
            &Header::default(),
            &Foreign { sub: "507f1f77bcf86cd799439011", iat: now, exp: now + 60 },
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert_eq!(service().verify_token(&token), Err(AuthError::InvalidCredential));
    }

    #[test]
    fn empty_secret_is_rejected() {
        assert!(matches!(JwtTokenService::new("", 1), Err(JwtError::InvalidSecret)));
    }

    #[test]
    fn huge_lifetimes_are_errors() {
        assert!(matches!(
            JwtTokenService::new(SECRET, u64::MAX / 2),
            Err(JwtError::ExpiryOutOfRange)
        ));
        assert!(matches!(expiry_from_hours(u64::MAX), Err(JwtError::ExpiryOutOfRange)));

        // Representable as a duration, but not once added to the current time
        let lifetime = expiry_from_hours(2_500_000_000_000).unwrap();
        assert!(matches!(
            Claims::new(UserId::new(), lifetime),
            Err(JwtError::ExpiryOutOfRange)
        ));
    }
}
