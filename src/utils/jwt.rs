// src/utils/jwt.rs

use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{config::Config, error::AppError};

/// Audience claim that distinguishes host capabilities from login tokens.
const HOST_AUDIENCE: &str = "live-host";

/// JWT Claims issued by the identity service.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Claims {
    /// Subject - Stores the User ID (as string).
    pub sub: String,
    /// Expiration time as Unix timestamp.
    pub exp: usize,
}

impl Claims {
    pub fn user_id(&self) -> Result<i64, AppError> {
        self.sub
            .parse::<i64>()
            .map_err(|_| AppError::AuthError("Invalid token subject".to_string()))
    }
}

/// Capability handed to the host when a session is opened.
/// Presented again on `host_join` to claim the host role for a socket.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HostClaims {
    /// Host user ID.
    pub sub: String,
    /// Join code the capability is bound to.
    pub pin: String,
    pub aud: String,
    pub exp: usize,
}

fn expires_in(seconds: u64) -> Result<usize, AppError> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .as_secs() as usize
        + seconds as usize)
}

/// Signs a new JWT for the user.
///
/// Arguments:
/// * `id`: User ID.
pub fn sign_jwt(id: i64, secret: &str, expiration_seconds: u64) -> Result<String, AppError> {
    let claims = Claims {
        sub: id.to_string(),
        exp: expires_in(expiration_seconds)?,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(e.to_string()))
}

/// Verifies and decodes a JWT string.
///
/// Returns the `Claims` if valid, otherwise returns an `AppError`.
pub fn verify_jwt(token: &str, secret: &str) -> Result<Claims, AppError> {
    let token_data = decode(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::AuthError("Invalid token".to_string()))?;

    Ok(token_data.claims)
}

/// Issues the host capability for session `pin`.
pub fn sign_host_token(host_id: i64, pin: &str, secret: &str, expiration_seconds: u64) -> Result<String, AppError> {
    let claims = HostClaims {
        sub: host_id.to_string(),
        pin: pin.to_owned(),
        aud: HOST_AUDIENCE.to_owned(),
        exp: expires_in(expiration_seconds)?,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(e.to_string()))
}

/// Checks a host capability and that it was issued for `pin`.
pub fn verify_host_token(token: &str, pin: &str, secret: &str) -> Result<HostClaims, AppError> {
    let mut validation = Validation::default();
    validation.set_audience(&[HOST_AUDIENCE]);

    let claims = decode::<HostClaims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map_err(|_| AppError::AuthError("Invalid host token".to_string()))?
        .claims;

    if claims.pin != pin {
        return Err(AppError::Forbidden("Host token belongs to another session".to_string()));
    }
    Ok(claims)
}

/// Axum Middleware: Authentication.
///
/// Intercepts requests, validates the 'Authorization: Bearer <token>' header.
/// If valid, injects `Claims` into the request extensions for handlers to use.
/// If invalid, returns 401 Unauthorized.
pub async fn auth_middleware(
    State(config): State<Config>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let token = match auth_header {
        Some(header) if header.starts_with("Bearer ") => &header[7..],
        _ => return Err(StatusCode::UNAUTHORIZED),
    };

    match verify_jwt(token, &config.jwt_secret) {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            Ok(next.run(req).await)
        }
        Err(_) => Err(StatusCode::UNAUTHORIZED),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit_test_secret";

    #[test]
    fn test_host_token_round_trip() {
        let token = sign_host_token(42, "123456", SECRET, 60).unwrap();
        let claims = verify_host_token(&token, "123456", SECRET).unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.pin, "123456");
    }

    #[test]
    fn test_host_token_bound_to_pin() {
        let token = sign_host_token(42, "123456", SECRET, 60).unwrap();
        assert!(matches!(
            verify_host_token(&token, "654321", SECRET),
            Err(AppError::Forbidden(_))
        ));
        assert!(verify_host_token(&token, "123456", "other_secret").is_err());
    }

    #[test]
    fn test_login_token_is_not_a_host_token() {
        let login = sign_jwt(42, SECRET, 60).unwrap();
        assert!(verify_host_token(&login, "123456", SECRET).is_err());
        assert_eq!(verify_jwt(&login, SECRET).unwrap().user_id().unwrap(), 42);
    }
}
