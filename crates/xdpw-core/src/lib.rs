//! xdpw Core - Shared types for the screen-capture portal daemon
//!
//! This crate provides the domain types shared between the daemon
//! (xdpwd) and its wire protocol (xdpw-protocol):
//!
//! - `capability` - the immutable capture-capability snapshot built at startup
//! - `session` - storage for ongoing screencast sessions
//! - `error` - the daemon's terminal error taxonomy

pub mod capability;
pub mod error;
pub mod session;

// Re-exports for convenience
pub use capability::{CapabilityRegistry, CursorModes, SourceTypes, CAST_PROTO_VERSION};
pub use error::{DaemonError, DaemonResult};
pub use session::{Session, SessionId, SessionRegistry};
