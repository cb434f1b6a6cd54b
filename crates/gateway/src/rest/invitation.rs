//! Invitation endpoints
//!
//! `already_invited` and `not_pending` are expected business outcomes and
//! come back success-shaped (`{"success": false, "reason": …}`) rather
//! than as HTTP errors.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use huddle_auth::Identity;
use huddle_teams::{Invitation, InvitationWithTeam, TeamError};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{GatewayError, GatewayResult};
use crate::state::GatewayState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateInvitationRequest {
    /// Public id of the user to invite
    pub user_id: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RespondInvitationRequest {
    pub accept: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InvitationResponse {
    pub id: String,
    pub team_id: String,
    pub status: String,
    pub sent_at: String,
    pub responded_at: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PendingInvitationResponse {
    pub id: String,
    pub team_id: String,
    pub team_name: String,
    pub invited_by: String,
    pub sent_at: String,
}

/// Outcome envelope shared by create and respond.
#[derive(Debug, Serialize, ToSchema)]
pub struct InvitationActionResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invitation: Option<InvitationResponse>,
}

impl InvitationActionResponse {
    fn ok(invitation: Option<InvitationResponse>) -> Self {
        Self {
            success: true,
            reason: None,
            invitation,
        }
    }

    fn soft(reason: &str) -> Self {
        Self {
            success: false,
            reason: Some(reason.to_string()),
            invitation: None,
        }
    }
}

fn invitation_response(invitation: Invitation, team_public_id: String) -> InvitationResponse {
    InvitationResponse {
        id: invitation.public_id,
        team_id: team_public_id,
        status: String::from(invitation.status),
        sent_at: invitation.sent_at,
        responded_at: invitation.responded_at,
    }
}

#[utoipa::path(
    post,
    path = "/api/teams/{team_id}/invitations",
    tag = "invitations",
    params(("team_id" = String, Path, description = "Team public ID")),
    request_body = CreateInvitationRequest,
    responses(
        (status = 200, description = "Invitation created, or a soft already_invited outcome", body = InvitationActionResponse),
        (status = 403, description = "Caller is not an organizer"),
        (status = 404, description = "Team or user not found")
    )
)]
pub async fn create_invitation(
    State(state): State<Arc<GatewayState>>,
    Extension(identity): Extension<Identity>,
    Path(team_id): Path<String>,
    Json(request): Json<CreateInvitationRequest>,
) -> GatewayResult<Json<InvitationActionResponse>> {
    let invitee = state
        .authenticator
        .find_user_by_public_id(&request.user_id)
        .await?
        .ok_or_else(|| GatewayError::NotFound(format!("user not found: {}", request.user_id)))?;

    match state
        .invitations
        .create(&team_id, identity.user_id, invitee.id)
        .await
    {
        Ok(invitation) => Ok(Json(InvitationActionResponse::ok(Some(
            invitation_response(invitation, team_id),
        )))),
        Err(TeamError::AlreadyInvited) => {
            Ok(Json(InvitationActionResponse::soft("already_invited")))
        }
        Err(err) => Err(err.into()),
    }
}

#[utoipa::path(
    post,
    path = "/api/invitations/{invitation_id}/respond",
    tag = "invitations",
    params(("invitation_id" = String, Path, description = "Invitation public ID")),
    request_body = RespondInvitationRequest,
    responses(
        (status = 200, description = "Invitation resolved, or a soft not_pending outcome", body = InvitationActionResponse),
        (status = 403, description = "Caller is not the invited user"),
        (status = 404, description = "Invitation not found")
    )
)]
pub async fn respond_invitation(
    State(state): State<Arc<GatewayState>>,
    Extension(identity): Extension<Identity>,
    Path(invitation_id): Path<String>,
    Json(request): Json<RespondInvitationRequest>,
) -> GatewayResult<Json<InvitationActionResponse>> {
    match state
        .invitations
        .respond(&invitation_id, identity.user_id, request.accept)
        .await
    {
        Ok(invitation) => {
            let team_id = state
                .memberships
                .repository()
                .find_team_public_id(invitation.team_id)
                .await?;
            Ok(Json(InvitationActionResponse::ok(Some(
                invitation_response(invitation, team_id),
            ))))
        }
        Err(TeamError::NotPending) => Ok(Json(InvitationActionResponse::soft("not_pending"))),
        Err(err) => Err(err.into()),
    }
}

#[utoipa::path(
    get,
    path = "/api/invitations",
    tag = "invitations",
    responses(
        (status = 200, description = "Pending invitations for the caller", body = [PendingInvitationResponse]),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_invitations(
    State(state): State<Arc<GatewayState>>,
    Extension(identity): Extension<Identity>,
) -> GatewayResult<Json<Vec<PendingInvitationResponse>>> {
    let pending = state
        .invitations
        .list_pending_for_user(identity.user_id)
        .await?;

    Ok(Json(
        pending
            .into_iter()
            .map(|invitation: InvitationWithTeam| PendingInvitationResponse {
                id: invitation.public_id,
                team_id: invitation.team_public_id,
                team_name: invitation.team_name,
                invited_by: invitation.invited_by_public_id,
                sent_at: invitation.sent_at,
            })
            .collect(),
    ))
}
