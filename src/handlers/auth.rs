// src/handlers/auth.rs

use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::user::{
        ChangePasswordRequest, LoginRequest, RegisterRequest, Role, SwitchRoleRequest, User,
        UserProfile,
    },
    repositories::DynUserRepository,
    utils::{
        hash::{hash_password, verify_password},
        jwt::{Claims, sign_jwt},
    },
};

/// Registers a new student.
///
/// Hashes the password using Argon2 before storing it.
/// Returns 201 Created and the public user object.
pub async fn register(
    State(users): State<DynUserRepository>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let email = payload.email.trim().to_lowercase();
    if users.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict("Email already in use.".to_string()));
    }

    let user = User {
        id: Uuid::new_v4(),
        name: payload.name.trim().to_string(),
        email,
        password: hash_password(&payload.password)?,
        role: Role::Student,
        created_at: Utc::now(),
    };
    users.insert_user(&user).await?;

    tracing::info!(user_id = %user.id, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User registered successfully",
            "user": UserProfile::from(&user),
        })),
    ))
}

/// Authenticates a user and returns a JWT token.
pub async fn login(
    State(users): State<DynUserRepository>,
    State(config): State<Config>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let email = payload.email.trim().to_lowercase();
    let user = users
        .find_user_by_email(&email)
        .await?
        .ok_or_else(|| AppError::Authentication(format!("unknown email {email}")))?;

    if !verify_password(&payload.password, &user.password)? {
        return Err(AppError::Authentication(format!(
            "password mismatch for {}",
            user.id
        )));
    }

    let token = sign_jwt(
        &user.id.to_string(),
        user.role,
        &config.jwt_secret,
        config.jwt_expiration,
    )?;

    Ok(Json(json!({
        "message": "Login successful",
        "token": token,
        "type": "Bearer",
        "user": UserProfile::from(&user),
    })))
}

/// Token verification endpoint: echoes the identity the token carries.
pub async fn authenticate(Extension(claims): Extension<Claims>) -> impl IntoResponse {
    Json(json!({
        "message": "Authentication successful",
        "subject": claims.sub,
        "role": claims.role,
    }))
}

/// Current user's profile.
pub async fn profile(
    State(users): State<DynUserRepository>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user = users
        .find_user_by_id(claims.user_id()?)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(UserProfile::from(&user)))
}

pub async fn change_password(
    State(users): State<DynUserRepository>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let user = users
        .find_user_by_id(claims.user_id()?)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if !verify_password(&payload.current_password, &user.password)? {
        return Err(AppError::Validation(
            "Current password is incorrect".to_string(),
        ));
    }

    let hashed = hash_password(&payload.new_password)?;
    users.update_password(user.id, &hashed).await?;

    Ok(Json(json!({ "message": "Password changed successfully" })))
}

/// Lists all users.
/// Admin only.
pub async fn list_users(
    State(users): State<DynUserRepository>,
) -> Result<impl IntoResponse, AppError> {
    let users: Vec<UserProfile> = users.list_users().await?.iter().map(UserProfile::from).collect();

    Ok(Json(json!({
        "message": "Users fetched successfully",
        "users": users,
    })))
}

/// Promotes or demotes a user.
/// Admin only.
pub async fn switch_role(
    State(users): State<DynUserRepository>,
    payload: Result<Json<SwitchRoleRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;
    payload.validate()?;

    if payload.new_role == Role::Service {
        return Err(AppError::Validation("Invalid role".to_string()));
    }

    let email = payload.email.trim().to_lowercase();
    let user = users
        .update_role(&email, payload.new_role)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    tracing::info!(user_id = %user.id, role = %user.role, "role switched");

    Ok(Json(json!({
        "message": format!("Role updated successfully to {}", user.role),
        "user": UserProfile::from(&user),
    })))
}
