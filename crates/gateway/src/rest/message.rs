//! Message history endpoint, the catch-up path after a reconnect.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use huddle_auth::Identity;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::{GatewayError, GatewayResult};
use crate::state::GatewayState;

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListMessagesQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub id: String,
    pub team_id: String,
    pub user_id: String,
    pub content: String,
    pub created_at: String,
}

#[utoipa::path(
    get,
    path = "/api/teams/{team_id}/messages",
    tag = "messages",
    params(
        ("team_id" = String, Path, description = "Team public ID"),
        ListMessagesQuery
    ),
    responses(
        (status = 200, description = "One page of team history in delivery order", body = [MessageResponse]),
        (status = 403, description = "Caller is not currently a member"),
        (status = 404, description = "Team not found")
    )
)]
pub async fn list_messages(
    State(state): State<Arc<GatewayState>>,
    Extension(identity): Extension<Identity>,
    Path(team_id): Path<String>,
    Query(query): Query<ListMessagesQuery>,
) -> GatewayResult<Json<Vec<MessageResponse>>> {
    // History is membership-gated the same way joins are: checked now.
    if !state.memberships.is_member(&team_id, identity.user_id).await? {
        return Err(GatewayError::Denied(
            "not a member of this team".to_string(),
        ));
    }

    let page = query.page.unwrap_or(0);
    let page_size = query.page_size.unwrap_or(50);

    let messages = state.messages.list_messages(&team_id, page, page_size).await?;

    Ok(Json(
        messages
            .into_iter()
            .map(|record| MessageResponse {
                id: record.public_id,
                team_id: record.team_public_id,
                user_id: record.user_public_id,
                content: record.content,
                created_at: record.created_at,
            })
            .collect(),
    ))
}
