//! JWT token generation and validation
//! Implements access token + refresh token pattern

use crate::{config::AppConfig, error::AppError};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::ExposeSecret;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

const ACCESS: &str = "access";
const REFRESH: &str = "refresh";

/// Minimum signing secret length for HS256
pub const MIN_SECRET_LEN: usize = 32;

/// Why a token was rejected
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token has expired")]
    Expired,
    #[error("token is malformed")]
    Malformed,
}

impl From<TokenError> for AppError {
    fn from(_: TokenError) -> Self {
        AppError::InvalidToken
    }
}

/// JWT claims for access tokens
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AccessClaims {
    /// Subject (user ID)
    pub sub: String,
    pub username: String,
    /// Role names at issuance time
    pub roles: Vec<String>,
    pub token_type: String,
    pub iat: i64,
    pub exp: i64,
    /// JWT ID (unique token identifier)
    pub jti: String,
}

/// JWT claims for refresh tokens
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RefreshClaims {
    pub sub: String,
    pub token_type: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

impl AccessClaims {
    pub fn user_id(&self) -> Result<Uuid, TokenError> {
        Uuid::parse_str(&self.sub).map_err(|_| TokenError::Malformed)
    }
}

impl RefreshClaims {
    pub fn user_id(&self) -> Result<Uuid, TokenError> {
        Uuid::parse_str(&self.sub).map_err(|_| TokenError::Malformed)
    }
}

/// Claims shared by both token kinds, used for type and expiry checks
trait TimedClaims {
    fn token_type(&self) -> &str;
    fn exp(&self) -> i64;
}

impl TimedClaims for AccessClaims {
    fn token_type(&self) -> &str {
        &self.token_type
    }
    fn exp(&self) -> i64 {
        self.exp
    }
}

impl TimedClaims for RefreshClaims {
    fn token_type(&self) -> &str {
        &self.token_type
    }
    fn exp(&self) -> i64 {
        self.exp
    }
}

/// Token pair response
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// seconds until access token expires
    pub expires_in: u64,
}

/// JWT service
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_token_ttl: Duration,
    refresh_token_ttl: Duration,
}

impl JwtService {
    pub fn new(
        secret: &str,
        access_token_ttl: Duration,
        refresh_token_ttl: Duration,
    ) -> Result<Self, AppError> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(AppError::Config("JWT secret too short (min 32 chars)".to_string()));
        }

        // Expiry is checked by hand so that `now == exp` is already expired
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iat", "sub"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            access_token_ttl,
            refresh_token_ttl,
        })
    }

    /// Create JWT service from config
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        Self::new(
            config.security.jwt_secret.expose_secret(),
            Duration::hours(config.security.access_token_exp_hours as i64),
            Duration::days(config.security.refresh_token_exp_days as i64),
        )
    }

    pub fn access_token_ttl(&self) -> Duration {
        self.access_token_ttl
    }

    /// Generate access token
    pub fn issue_access(
        &self,
        user_id: &Uuid,
        username: &str,
        roles: Vec<String>,
    ) -> Result<String, AppError> {
        let now = Utc::now();

        let claims = AccessClaims {
            sub: user_id.to_string(),
            username: username.to_string(),
            roles,
            token_type: ACCESS.to_string(),
            iat: now.timestamp(),
            exp: (now + self.access_token_ttl).timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        self.sign(&claims, ACCESS)
    }

    /// Generate refresh token
    pub fn issue_refresh(&self, user_id: &Uuid) -> Result<String, AppError> {
        let now = Utc::now();

        let claims = RefreshClaims {
            sub: user_id.to_string(),
            token_type: REFRESH.to_string(),
            iat: now.timestamp(),
            exp: (now + self.refresh_token_ttl).timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        self.sign(&claims, REFRESH)
    }

    /// Generate token pair
    pub fn issue_pair(
        &self,
        user_id: &Uuid,
        username: &str,
        roles: Vec<String>,
    ) -> Result<TokenPair, AppError> {
        let access_token = self.issue_access(user_id, username, roles)?;
        let refresh_token = self.issue_refresh(user_id)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            expires_in: self.access_token_ttl.num_seconds().max(0) as u64,
        })
    }

    pub fn validate_access(&self, token: &str) -> Result<AccessClaims, TokenError> {
        self.validate_access_at(token, Utc::now())
    }

    /// Validate an access token as of `now`
    pub fn validate_access_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<AccessClaims, TokenError> {
        self.validate_kind(token, ACCESS, now)
    }

    pub fn validate_refresh(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        self.validate_refresh_at(token, Utc::now())
    }

    /// Validate a refresh token as of `now`
    pub fn validate_refresh_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<RefreshClaims, TokenError> {
        self.validate_kind(token, REFRESH, now)
    }

    fn sign<C: Serialize>(&self, claims: &C, kind: &str) -> Result<String, AppError> {
        encode(&Header::default(), claims, &self.encoding_key).map_err(|e| {
            tracing::error!(kind, "Failed to encode token: {:?}", e);
            AppError::Internal(format!("Failed to encode {} token: {}", kind, e))
        })
    }

    fn validate_kind<C>(&self, token: &str, kind: &str, now: DateTime<Utc>) -> Result<C, TokenError>
    where
        C: DeserializeOwned + TimedClaims,
    {
        let claims = decode::<C>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                tracing::debug!("Token validation failed: {:?}", e);
                match e.kind() {
                    ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                    ErrorKind::ExpiredSignature => TokenError::Expired,
                    _ => TokenError::Malformed,
                }
            })?
            .claims;

        if claims.token_type() != kind {
            tracing::debug!(
                "Token type mismatch: expected '{}', got '{}'",
                kind,
                claims.token_type()
            );
            return Err(TokenError::Malformed);
        }

        if now.timestamp() >= claims.exp() {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}
