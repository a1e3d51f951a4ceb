use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::user::UserRole;
use crate::error::{AppError, AppResult};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: Uuid,       // user id
    pub email: String,
    pub role: UserRole,
    pub exp: i64,        // expiration timestamp
    pub iat: i64,        // issued at timestamp
}

pub fn create_token(
    user_id: Uuid,
    email: &str,
    role: UserRole,
    secret: &str,
    expiration_hours: i64,
) -> AppResult<String> {
    let now = Utc::now();
    let exp = now + Duration::hours(expiration_hours);

    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        role,
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
}

pub fn verify_token(token: &str, secret: &str) -> AppResult<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AppError::Unauthorized(
            "Your token has expired. Please log in again.".to_string(),
        ),
        _ => AppError::Unauthorized("Invalid token. Please log in again.".to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn round_trip_preserves_claims() {
        let user_id = Uuid::new_v4();
        let token = create_token(user_id, "rider@example.com", UserRole::Passenger, SECRET, 1)
            .unwrap();

        let claims = verify_token(&token, SECRET).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.email, "rider@example.com");
        assert_eq!(claims.role, UserRole::Passenger);
    }

    #[test]
    fn expired_token_reports_fixed_message() {
        let token = create_token(Uuid::new_v4(), "x@example.com", UserRole::Driver, SECRET, -2)
            .unwrap();

        let err = verify_token(&token, SECRET).unwrap_err();
        match err {
            AppError::Unauthorized(msg) => {
                assert_eq!(msg, "Your token has expired. Please log in again.")
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token =
            create_token(Uuid::new_v4(), "x@example.com", UserRole::Driver, SECRET, 1).unwrap();
        assert!(verify_token(&token, "other-secret").is_err());
    }
}
