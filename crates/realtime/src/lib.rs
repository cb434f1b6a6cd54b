//! # huddle-realtime
//!
//! The realtime hub: connection registry, group membership management and
//! message fanout. Transport-agnostic — the gateway plugs a WebSocket (or
//! anything else that can shuttle `ClientEvent`/`ServerEvent`) into the
//! per-session outbound channel handed out at registration.

pub mod error;
pub mod events;
pub mod fanout;
pub mod group;
pub mod registry;

pub use error::{RealtimeError, RealtimeResult};
pub use events::{ClientEvent, MessagePayload, ServerEvent};
pub use fanout::FanoutEngine;
pub use group::GroupManager;
pub use registry::{ConnectionRegistry, RegistryError, SessionHandle, SessionId};
