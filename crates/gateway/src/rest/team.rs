//! Team bootstrap, deletion and member removal endpoints

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use huddle_auth::Identity;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{GatewayError, GatewayResult};
use crate::state::GatewayState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTeamRequest {
    pub name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TeamResponse {
    pub id: String,
    pub name: String,
    pub created_at: String,
}

#[utoipa::path(
    post,
    path = "/api/teams",
    tag = "teams",
    request_body = CreateTeamRequest,
    responses(
        (status = 200, description = "Team created, caller is organizer", body = TeamResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn create_team(
    State(state): State<Arc<GatewayState>>,
    Extension(identity): Extension<Identity>,
    Json(request): Json<CreateTeamRequest>,
) -> GatewayResult<Json<TeamResponse>> {
    let team = state
        .memberships
        .create_team(&request.name, identity.user_id)
        .await?;

    Ok(Json(TeamResponse {
        id: team.public_id,
        name: team.name,
        created_at: team.created_at,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/teams/{team_id}",
    tag = "teams",
    params(("team_id" = String, Path, description = "Team public ID")),
    responses(
        (status = 200, description = "Team deleted with cascade"),
        (status = 403, description = "Caller is not an organizer"),
        (status = 404, description = "Team not found")
    )
)]
pub async fn delete_team(
    State(state): State<Arc<GatewayState>>,
    Extension(identity): Extension<Identity>,
    Path(team_id): Path<String>,
) -> GatewayResult<Json<serde_json::Value>> {
    state
        .memberships
        .delete_team(&team_id, identity.user_id)
        .await?;

    // Membership rows are gone; evict the live group as well.
    state.groups.disband(&team_id).await;

    Ok(Json(serde_json::json!({ "success": true })))
}

#[utoipa::path(
    delete,
    path = "/api/teams/{team_id}/members/{user_id}",
    tag = "teams",
    params(
        ("team_id" = String, Path, description = "Team public ID"),
        ("user_id" = String, Path, description = "Member user public ID")
    ),
    responses(
        (status = 200, description = "Membership removed, live sessions force-left"),
        (status = 403, description = "Caller is not an organizer"),
        (status = 404, description = "Team or user not found")
    )
)]
pub async fn remove_member(
    State(state): State<Arc<GatewayState>>,
    Extension(identity): Extension<Identity>,
    Path((team_id, user_id)): Path<(String, String)>,
) -> GatewayResult<Json<serde_json::Value>> {
    let target = state
        .authenticator
        .find_user_by_public_id(&user_id)
        .await?
        .ok_or_else(|| GatewayError::NotFound(format!("user not found: {user_id}")))?;

    let removed = state
        .memberships
        .remove_member(&team_id, identity.user_id, target.id)
        .await?;

    // The removal must be visible before any join can race it; only then
    // are the user's live sessions evicted from the group.
    state.groups.force_leave(&team_id, target.id).await;

    Ok(Json(serde_json::json!({ "success": true, "removed": removed })))
}
