//! Data access layer.

pub mod invitation_repository;
pub mod membership_repository;
pub mod message_repository;

pub use invitation_repository::InvitationRepository;
pub use membership_repository::MembershipRepository;
pub use message_repository::MessageRepository;
