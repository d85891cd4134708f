//! JWT token issuance and validation
//!
//! Tokens are HS256-signed JWTs carrying exactly `sub`, `username`, `iss`,
//! `iat` and `exp`. They are stateless: nothing is stored server-side, and
//! rotating the secret invalidates every token issued before.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{auth::identity::VerifiedIdentity, config::SecurityConfig, error::AppError};

/// Issuer written into and required from every token
pub const ISSUER: &str = "asset-registry";

/// Lifetime of an issued token
pub const TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

/// The only signing algorithm this service accepts
const ALGORITHM: Algorithm = Algorithm::HS256;

/// Minimum secret length for HS256
const MIN_SECRET_LEN: usize = 32;

/// Why a token was rejected.
///
/// Clients only ever see one generic message; the kind is for logs and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,

    #[error("unsupported signing algorithm")]
    UnsupportedAlgorithm,

    #[error("invalid signature")]
    InvalidSignature,

    #[error("token expired")]
    Expired,
}

impl TokenError {
    /// Stable label for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            TokenError::Malformed => "malformed",
            TokenError::UnsupportedAlgorithm => "unsupported_algorithm",
            TokenError::InvalidSignature => "invalid_signature",
            TokenError::Expired => "expired",
        }
    }
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            ErrorKind::InvalidAlgorithm => TokenError::UnsupportedAlgorithm,
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Malformed,
        }
    }
}

/// JWT claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: Uuid,

    /// Username
    pub username: String,

    /// Issuer
    pub iss: String,

    /// Issued at
    pub iat: i64,

    /// Expiration
    pub exp: i64,
}

/// Only the field we need from the raw header
#[derive(Deserialize)]
struct RawHeader {
    alg: String,
}

/// JWT service
///
/// Holds the signing secret for the whole process lifetime. The secret is
/// never logged and never appears in `Debug` output.
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("algorithm", &ALGORITHM)
            .field("issuer", &ISSUER)
            .finish_non_exhaustive()
    }
}

impl JwtService {
    /// Create JWT service from a secret
    pub fn new(secret: &SecretString) -> Result<Self, AppError> {
        let secret = secret.expose_secret();

        if secret.len() < MIN_SECRET_LEN {
            return Err(AppError::Config(format!(
                "JWT secret too short (min {} chars)",
                MIN_SECRET_LEN
            )));
        }

        let mut validation = Validation::new(ALGORITHM);
        // Expiry is checked in verify_at against the caller's clock, without leeway.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_issuer(&[ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    /// Create JWT service from config
    pub fn from_config(config: &SecurityConfig) -> Result<Self, AppError> {
        Self::new(&config.jwt_secret)
    }

    /// Issue a token for a verified identity
    pub fn issue(&self, user_id: Uuid, username: &str) -> Result<String, AppError> {
        self.issue_at(user_id, username, Utc::now())
    }

    /// Issue a token as of `now`
    pub fn issue_at(
        &self,
        user_id: Uuid,
        username: &str,
        now: DateTime<Utc>,
    ) -> Result<String, AppError> {
        let expiration = now + Duration::seconds(TOKEN_TTL_SECS);

        let claims = Claims {
            sub: user_id,
            username: username.to_string(),
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
        };

        encode(&Header::new(ALGORITHM), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!(kind = ?e.kind(), "Failed to encode token");
            AppError::Signing("failed to encode token".to_string())
        })
    }

    /// Validate a token against the current time
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Validate a token as of `now`.
    ///
    /// Checks, in order: structure, declared algorithm, signature, claim set,
    /// expiry. The algorithm check reads the raw header and runs before and
    /// independently of signature verification, so `none` or any other
    /// algorithm is rejected even if the rest of the token is well formed.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let alg = declared_algorithm(token)?;
        if alg != "HS256" {
            return Err(TokenError::UnsupportedAlgorithm);
        }

        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)?.claims;

        if now.timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    /// Validate a token and produce the typed identity downstream code consumes
    pub fn authenticate(&self, token: &str) -> Result<VerifiedIdentity, TokenError> {
        self.verify(token).map(VerifiedIdentity::from_claims)
    }
}

/// Split the compact form and read `alg` from the header segment
fn declared_algorithm(token: &str) -> Result<String, TokenError> {
    let mut segments = token.split('.');
    let (Some(header), Some(_payload), Some(_signature), None) =
        (segments.next(), segments.next(), segments.next(), segments.next())
    else {
        return Err(TokenError::Malformed);
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(header)
        .map_err(|_| TokenError::Malformed)?;
    let header: RawHeader = serde_json::from_slice(&bytes).map_err(|_| TokenError::Malformed)?;

    Ok(header.alg)
}
