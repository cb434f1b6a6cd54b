//! # huddle-gateway
//!
//! The API gateway: HTTP REST endpoints for accounts, teams, invitations
//! and history, plus the WebSocket endpoint that feeds the realtime hub.

pub mod error;
pub mod middleware;
pub mod rest;
pub mod state;
pub mod websocket;

pub use error::{GatewayError, GatewayResult};
pub use state::GatewayState;

use std::sync::Arc;

use axum::{
    http::Method,
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the application router with all routes and middleware.
pub fn create_router(state: GatewayState) -> Router {
    let state = Arc::new(state);

    let public = Router::new()
        .route("/api/auth/register", post(rest::auth::register))
        .route("/api/auth/login", post(rest::auth::login));

    let protected = Router::new()
        .route("/api/auth/me", get(rest::auth::me))
        .route("/api/teams", post(rest::team::create_team))
        .route("/api/teams/:team_id", delete(rest::team::delete_team))
        .route(
            "/api/teams/:team_id/members/:user_id",
            delete(rest::team::remove_member),
        )
        .route(
            "/api/teams/:team_id/messages",
            get(rest::message::list_messages),
        )
        .route(
            "/api/teams/:team_id/invitations",
            post(rest::invitation::create_invitation),
        )
        .route("/api/invitations", get(rest::invitation::list_invitations))
        .route(
            "/api/invitations/:invitation_id/respond",
            post(rest::invitation::respond_invitation),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    // The websocket endpoint does its own token handshake so a refused
    // bind can close the connection before any session exists.
    let realtime = Router::new().route("/api/ws", get(websocket::ws_handler));

    let mut router = Router::new()
        .merge(public)
        .merge(protected)
        .merge(realtime)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::DELETE])
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    #[cfg(debug_assertions)]
    {
        use utoipa::OpenApi;
        use utoipa_swagger_ui::SwaggerUi;

        #[derive(OpenApi)]
        #[openapi(
            paths(
                rest::auth::register,
                rest::auth::login,
                rest::auth::me,
                rest::team::create_team,
                rest::team::delete_team,
                rest::team::remove_member,
                rest::message::list_messages,
                rest::invitation::create_invitation,
                rest::invitation::respond_invitation,
                rest::invitation::list_invitations,
            ),
            components(
                schemas(
                    rest::auth::RegisterRequest,
                    rest::auth::LoginRequest,
                    rest::auth::UserResponse,
                    rest::auth::SessionResponse,
                    rest::auth::IdentityResponse,
                    rest::team::CreateTeamRequest,
                    rest::team::TeamResponse,
                    rest::message::MessageResponse,
                    rest::invitation::CreateInvitationRequest,
                    rest::invitation::RespondInvitationRequest,
                    rest::invitation::InvitationResponse,
                    rest::invitation::PendingInvitationResponse,
                    rest::invitation::InvitationActionResponse,
                )
            ),
            tags(
                (name = "auth", description = "Accounts and sessions"),
                (name = "teams", description = "Team lifecycle and membership"),
                (name = "invitations", description = "Invitation workflow"),
                (name = "messages", description = "Message history"),
            )
        )]
        struct ApiDoc;

        router = router.merge(
            SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()),
        );
    }

    router.with_state(state)
}
