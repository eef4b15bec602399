//! xdpw daemon library.
//!
//! Everything the `xdpwd` binary does lives here so the integration tests
//! can drive the daemon without a subprocess: the instance lock, the
//! endpoint bootstrap, and the poll-based reactor.

pub mod cli;
pub mod endpoint;
pub mod lock;
pub mod portal;
pub mod reactor;
pub mod screencast;
pub mod screenshot;
pub mod state;
