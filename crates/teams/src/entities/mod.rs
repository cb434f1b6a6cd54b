//! Domain entities for teams, memberships, invitations and messages.

pub mod invitation;
pub mod member;
pub mod message;
pub mod team;

pub use invitation::{Invitation, InvitationStatus, InvitationWithTeam};
pub use member::{TeamMember, TeamRole};
pub use message::MessageRecord;
pub use team::Team;
