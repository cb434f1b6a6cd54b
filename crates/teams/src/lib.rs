//! # huddle-teams
//!
//! Team membership, the invitation state machine and message history for
//! the huddle backend.
//!
//! - **Entities**: domain models (Team, TeamMember, Invitation, MessageRecord)
//! - **Repositories**: data access, including the membership authority
//! - **Services**: invitation lifecycle and membership operations
//! - **Types**: shared error taxonomy

pub mod entities;
pub mod repositories;
pub mod services;
pub mod types;

pub use entities::{
    Invitation, InvitationStatus, InvitationWithTeam, MessageRecord, Team, TeamMember, TeamRole,
};
pub use repositories::{InvitationRepository, MembershipRepository, MessageRepository};
pub use services::{InvitationService, MembershipService};
pub use types::{TeamError, TeamResult};
