use crate::config::Config;
use crate::error::AppResult;
use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "session_token";

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (session ID)
    pub sub: String,
    /// Expiration time (as UTC timestamp)
    pub exp: usize,
    /// Issued at (as UTC timestamp)
    pub iat: usize,
}

/// Signs and checks session cookies
pub struct SessionService {
    secret: String,
    expiration_minutes: i64,
}

impl SessionService {
    pub fn new(config: &Config) -> Self {
        Self {
            secret: config.session_secret.clone(),
            expiration_minutes: config.session_expiration_minutes,
        }
    }

    /// Generate a new JWT token for a session
    pub fn generate_token(&self, session_id: Uuid) -> AppResult<String> {
        let now = Utc::now();
        let exp = now + Duration::minutes(self.expiration_minutes);

        let claims = Claims {
            sub: session_id.to_string(),
            exp: exp.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )?)
    }

    /// Session id carried by a token, if the token is valid
    pub fn validate_token(&self, token: &str) -> Option<Uuid> {
        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map(|token_data| token_data.claims)
        .map_err(|e| debug!("Rejected session token: {:?}", e))
        .ok()?;

        Uuid::parse_str(&claims.sub).ok()
    }

    /// Cookie holding a freshly signed token for `session_id`
    pub fn cookie(&self, session_id: Uuid) -> AppResult<Cookie<'static>> {
        let token = self.generate_token(session_id)?;
        Ok(Cookie::build((SESSION_COOKIE, token))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .max_age(time::Duration::minutes(self.expiration_minutes))
            .build())
    }
}
