use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Request body for the three registration endpoints.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    /// Unique username (1-32 chars, alphanumeric and underscores).
    #[schema(example = "alice_wonder")]
    pub username: String,
    /// Contact email address.
    #[schema(example = "alice@example.com")]
    pub email: String,
    /// Password (8-128 characters).
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
}

pub fn validate_register_request(payload: &RegisterRequest) -> Result<(), AppError> {
    let username = payload.username.trim();
    if username.is_empty() || username.chars().count() > 32 {
        return Err(AppError::Validation(
            "Username must be 1-32 characters".into(),
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(AppError::Validation(
            "Username must contain only letters, digits, and underscores".into(),
        ));
    }

    let email = payload.email.trim();
    let valid_email = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !valid_email {
        return Err(AppError::Validation(
            "Email must be a valid address".into(),
        ));
    }

    if payload.password.len() < 8 || payload.password.len() > 128 {
        return Err(AppError::Validation(
            "Password must be 8-128 characters".into(),
        ));
    }
    Ok(())
}

/// Request body for login.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    #[schema(example = "alice_wonder")]
    pub username: String,
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
}

pub fn validate_login_request(payload: &LoginRequest) -> Result<(), AppError> {
    if payload.username.trim().is_empty() {
        return Err(AppError::Validation("Username must not be empty".into()));
    }
    if payload.password.is_empty() {
        return Err(AppError::Validation("Password must not be empty".into()));
    }
    Ok(())
}

/// Outcome envelope for registration.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct StatusResponse {
    #[schema(example = "Success")]
    pub status: &'static str,
    #[schema(example = "User created successfully!")]
    pub message: &'static str,
}

/// Successful login response.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    /// JWT bearer token valid for 3 hours.
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub token: String,
    /// Instant at which the token stops being accepted.
    pub expiration: DateTime<Utc>,
}

/// Current authenticated user's profile.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct MeResponse {
    #[schema(example = 42)]
    pub id: i32,
    #[schema(example = "alice_wonder")]
    pub username: String,
    #[schema(example = json!(["user"]))]
    pub roles: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(username: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    #[test]
    fn accepts_a_sensible_registration() {
        assert!(validate_register_request(&request("alice_1", "a@example.com", "longenough")).is_ok());
    }

    #[test]
    fn rejects_bad_usernames() {
        assert!(validate_register_request(&request("", "a@example.com", "longenough")).is_err());
        assert!(validate_register_request(&request("has space", "a@example.com", "longenough")).is_err());
        let long = "x".repeat(33);
        assert!(validate_register_request(&request(&long, "a@example.com", "longenough")).is_err());
    }

    #[test]
    fn rejects_bad_emails() {
        assert!(validate_register_request(&request("alice", "not-an-email", "longenough")).is_err());
        assert!(validate_register_request(&request("alice", "@example.com", "longenough")).is_err());
        assert!(validate_register_request(&request("alice", "a@nodot", "longenough")).is_err());
    }

    #[test]
    fn rejects_weak_passwords() {
        assert!(validate_register_request(&request("alice", "a@example.com", "short")).is_err());
        let long = "p".repeat(129);
        assert!(validate_register_request(&request("alice", "a@example.com", &long)).is_err());
    }

    #[test]
    fn login_requires_both_fields() {
        let ok = LoginRequest {
            username: "alice".into(),
            password: "pw".into(),
        };
        assert!(validate_login_request(&ok).is_ok());

        let blank_user = LoginRequest {
            username: "  ".into(),
            password: "pw".into(),
        };
        assert!(validate_login_request(&blank_user).is_err());

        let blank_pw = LoginRequest {
            username: "alice".into(),
            password: "".into(),
        };
        assert!(validate_login_request(&blank_pw).is_err());
    }
}
