//! Bearer-token authentication: registration, login and the token itself.
//!
//! Tokens are HS256 JWTs with `sub` (user id), `iat` and `exp` claims. The
//! secret and TTL come from configuration; nothing here is global.

use api_types::{auth::{Login, Register, Token}, user::UserView};
use axum::{Extension, Json, extract::State, http::StatusCode};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{ServerError, server::ServerState, views::user_view};

const TOKEN_TYPE: &str = "bearer";

/// Pieces of information asserted on a token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id, stringified.
    pub sub: String,
    /// Issued-at, unix seconds.
    pub iat: usize,
    /// Expiry, unix seconds. Tokens past this are rejected on decode.
    pub exp: usize,
}

/// Signing/verification keys plus the configured token lifetime.
#[derive(Clone)]
pub struct TokenConfig {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenConfig {
    pub fn new(secret: &str, ttl_minutes: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::minutes(ttl_minutes),
        }
    }

    pub fn ttl_seconds(&self) -> u64 {
        self.ttl.num_seconds().max(0) as u64
    }

    pub(crate) fn encode(&self, user_id: i32) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp() as usize,
            exp: (now + self.ttl).timestamp() as usize,
        };
        encode(&Header::default(), &claims, &self.encoding)
    }

    /// Decodes and checks a token (signature and expiry).
    pub(crate) fn decode(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        decode::<Claims>(token, &self.decoding, &Validation::default()).map(|data| data.claims)
    }
}

pub async fn register(
    State(state): State<ServerState>,
    Json(payload): Json<Register>,
) -> Result<(StatusCode, Json<UserView>), ServerError> {
    payload.validate()?;

    let user = state
        .engine
        .register_user(engine::NewUser {
            username: payload.username,
            email: payload.email,
            password: payload.password,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(user_view(user))))
}

pub async fn login(
    State(state): State<ServerState>,
    Json(payload): Json<Login>,
) -> Result<Json<Token>, ServerError> {
    payload.validate()?;

    let user = state
        .engine
        .authenticate(&payload.username, &payload.password)
        .await?;

    let access_token = state
        .tokens
        .encode(user.id)
        .map_err(|err| ServerError::Internal(format!("token creation failed: {err}")))?;

    Ok(Json(Token {
        access_token,
        token_type: TOKEN_TYPE.to_string(),
        expires_in: state.tokens.ttl_seconds(),
    }))
}

/// Returns the resolved caller.
pub async fn me(Extension(user): Extension<engine::User>) -> Json<UserView> {
    Json(user_view(user))
}
