//! Business logic layer.

pub mod invitation_service;
pub mod membership_service;

pub use invitation_service::InvitationService;
pub use membership_service::MembershipService;
