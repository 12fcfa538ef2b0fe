use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{auth::Principal, config::JwtConfig, models::Role};

pub const ISSUER: &str = "chitchat";
pub const SUBJECT: &str = "user_auth";

const FALLBACK_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Longest accepted duration: `i64::MAX` nanoseconds, about 292 years.
const MAX_DURATION_SECS: f64 = i64::MAX as f64 / 1e9;

#[derive(Debug, Error)]
pub enum TokenError {
    /// Bad signature, malformed structure, wrong issuer, expired or not yet valid.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("token signing failed: {0}")]
    Signing(String),
}

/// Claims
///
/// The JWT payload. `exp`, `iat` and `nbf` are Unix seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
    pub nbf: i64,
    pub iss: String,
    pub sub: String,
}

/// TokenService
///
/// Issues and verifies HS256 credentials. Stateless: there is no revocation
/// list, so a token stays valid until it expires.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    pub fn new(config: &JwtConfig) -> Self {
        let ttl = parse_duration(&config.expire).unwrap_or_else(|| {
            tracing::warn!(expire = %config.expire, "unparsable jwt.expire, falling back to 24h");
            FALLBACK_TTL
        });

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.set_issuer(&[ISSUER]);
        validation.sub = Some(SUBJECT.to_string());
        validation.set_required_spec_claims(&["exp", "nbf", "iss", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// issue
    ///
    /// Signs a token for `user_id` valid from now until now + the configured
    /// lifetime.
    pub fn issue(&self, user_id: i64, role: Role) -> Result<String, TokenError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            user_id,
            role,
            exp: i64::try_from(self.ttl.as_secs())
                .ok()
                .and_then(|ttl| now.checked_add(ttl))
                .ok_or_else(|| TokenError::Signing("token expiry out of range".to_string()))?,
            iat: now,
            nbf: now,
            iss: ISSUER.to_string(),
            sub: SUBJECT.to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// verify
    ///
    /// Checks signature, structure, issuer, subject and the validity window
    /// with zero clock leeway.
    pub fn verify(&self, token: &str) -> Result<Principal, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|e| TokenError::InvalidToken(e.to_string()))?;

        Ok(Principal {
            user_id: data.claims.user_id,
            role: data.claims.role,
        })
    }
}

/// parse_duration
///
/// Parses duration strings made of number/unit pairs: `24h`, `90m`, `1h30m`,
/// `1.5h`, `500ms`. Units are `h`, `m`, `s`, `ms`, `us` and `ns`. Returns
/// `None` for anything else, including the empty string and totals longer
/// than about 292 years.
pub fn parse_duration(input: &str) -> Option<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if input == "0" {
        return Some(Duration::ZERO);
    }

    let mut total = 0f64;
    let mut rest = input;
    while !rest.is_empty() {
        let num_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if num_end == 0 {
            return None;
        }
        let value: f64 = rest[..num_end].parse().ok()?;
        rest = &rest[num_end..];

        let unit_end = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let seconds_per_unit = match &rest[..unit_end] {
            "h" => 3600.0,
            "m" => 60.0,
            "s" => 1.0,
            "ms" => 1e-3,
            "us" | "µs" => 1e-6,
            "ns" => 1e-9,
            _ => return None,
        };
        total += value * seconds_per_unit;
        rest = &rest[unit_end..];
    }

    if total > MAX_DURATION_SECS {
        return None;
    }
    Duration::try_from_secs_f64(total).ok()
}
