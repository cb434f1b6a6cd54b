//! Account and session endpoints

use std::sync::Arc;

use axum::{extract::State, Extension, Json};
use huddle_auth::Identity;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::GatewayResult;
use crate::state::GatewayState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub token: String,
    pub expires_at: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct IdentityResponse {
    pub user_id: String,
    pub role: String,
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account created", body = UserResponse),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register(
    State(state): State<Arc<GatewayState>>,
    Json(request): Json<RegisterRequest>,
) -> GatewayResult<Json<UserResponse>> {
    let user = state
        .authenticator
        .register_with_password(
            &request.email,
            &request.password,
            request.display_name.as_deref(),
        )
        .await?;

    Ok(Json(UserResponse {
        id: user.public_id,
        email: user.email,
        display_name: user.display_name,
    }))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session issued", body = SessionResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<Arc<GatewayState>>,
    Json(request): Json<LoginRequest>,
) -> GatewayResult<Json<SessionResponse>> {
    let session = state
        .authenticator
        .login_with_password(&request.email, &request.password)
        .await?;

    Ok(Json(SessionResponse {
        token: session.token,
        expires_at: session.expires_at.to_rfc3339(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "auth",
    responses(
        (status = 200, description = "The caller's reconciled identity", body = IdentityResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn me(Extension(identity): Extension<Identity>) -> Json<IdentityResponse> {
    Json(IdentityResponse {
        user_id: identity.public_id.clone(),
        role: identity.role.as_str().to_string(),
    })
}
