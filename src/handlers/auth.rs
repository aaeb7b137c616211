use axum::Json;
use axum::extract::State;
use sea_orm::*;
use tracing::{info, instrument};

use crate::entity::role::Role;
use crate::entity::{user, user_role};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::auth::{
    LoginRequest, LoginResponse, MeResponse, RegisterRequest, StatusResponse,
    validate_login_request, validate_register_request,
};
use crate::seed;
use crate::state::AppState;
use crate::utils::{hash, jwt};

#[utoipa::path(
    post,
    path = "/api/authenticate/register-user",
    tag = "Authentication",
    operation_id = "registerUser",
    summary = "Register an account with the user role",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account created", body = StatusResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 409, description = "Username taken (USER_EXISTS)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(username = %payload.username))]
pub async fn register_user(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<Json<StatusResponse>, AppError> {
    register_with_role(&state, payload, Role::User).await
}

#[utoipa::path(
    post,
    path = "/api/authenticate/register-manager",
    tag = "Authentication",
    operation_id = "registerManager",
    summary = "Register an account with the manager role",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account created", body = StatusResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 409, description = "Username taken (USER_EXISTS)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(username = %payload.username))]
pub async fn register_manager(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<Json<StatusResponse>, AppError> {
    register_with_role(&state, payload, Role::Manager).await
}

#[utoipa::path(
    post,
    path = "/api/authenticate/register-admin",
    tag = "Authentication",
    operation_id = "registerAdmin",
    summary = "Register an account with the admin role",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account created", body = StatusResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 409, description = "Username taken (USER_EXISTS)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(username = %payload.username))]
pub async fn register_admin(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<Json<StatusResponse>, AppError> {
    register_with_role(&state, payload, Role::Admin).await
}

/// Shared body of the three registration endpoints. The username check races
/// with concurrent registrations, so the unique constraint on `users.username`
/// is the final arbiter and maps to the same error.
async fn register_with_role(
    state: &AppState,
    payload: RegisterRequest,
    role: Role,
) -> Result<Json<StatusResponse>, AppError> {
    validate_register_request(&payload)?;

    let username = payload.username.trim().to_string();

    let taken = user::Entity::find()
        .filter(user::Column::Username.eq(username.as_str()))
        .one(state.conn())
        .await?
        .is_some();
    if taken {
        return Err(AppError::UserExists);
    }

    let password_hash =
        hash::hash_password(&payload.password).map_err(|e| AppError::Internal(e.to_string()))?;

    let created = user::ActiveModel {
        username: Set(username),
        email: Set(payload.email.trim().to_string()),
        password_hash: Set(password_hash),
        created_at: Set(chrono::Local::now().naive_local()),
        ..Default::default()
    }
    .insert(state.conn())
    .await
    .map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::UserExists,
        _ => AppError::from(e),
    })?;

    seed::ensure_roles_exist(state.conn()).await?;

    user_role::Entity::insert(user_role::ActiveModel {
        user_id: Set(created.id),
        role_name: Set(role.as_str().to_string()),
    })
    .exec_without_returning(state.conn())
    .await?;

    info!(user_id = created.id, role = role.as_str(), "User registered");

    Ok(Json(StatusResponse {
        status: "Success",
        message: "User created successfully!",
    }))
}

#[utoipa::path(
    post,
    path = "/api/authenticate/login",
    tag = "Authentication",
    operation_id = "login",
    summary = "Exchange credentials for a bearer token",
    description = "Returns a JWT valid for 3 hours together with its expiry instant. Unknown usernames and wrong passwords produce the same response.",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = LoginResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Bad credentials (INVALID_CREDENTIALS)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(username = %payload.username))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    validate_login_request(&payload)?;

    let account = user::Entity::find()
        .filter(user::Column::Username.eq(payload.username.trim()))
        .one(state.conn())
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let password_ok = hash::verify_password(&payload.password, &account.password_hash)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    if !password_ok {
        return Err(AppError::InvalidCredentials);
    }

    let roles: Vec<String> = user_role::Entity::find()
        .filter(user_role::Column::UserId.eq(account.id))
        .all(state.conn())
        .await?
        .into_iter()
        .map(|r| r.role_name)
        .collect();

    let signed = jwt::sign(account.id, &account.username, roles, &state.config.auth)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    info!(user_id = account.id, "User logged in");

    Ok(Json(LoginResponse {
        token: signed.token,
        expiration: signed.expiration,
    }))
}

#[utoipa::path(
    get,
    path = "/api/authenticate/me",
    tag = "Authentication",
    operation_id = "me",
    summary = "Describe the authenticated user",
    security(("jwt" = [])),
    responses(
        (status = 200, description = "Profile from the presented token", body = MeResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
    ),
)]
#[instrument(skip_all, fields(username = %auth.username))]
pub async fn me(auth: AuthUser) -> Json<MeResponse> {
    Json(MeResponse {
        id: auth.user_id,
        username: auth.username,
        roles: auth.roles,
    })
}
