//! Shared types for the teams crate.

pub mod errors;

pub use errors::{TeamError, TeamResult};
