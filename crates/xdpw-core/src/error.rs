//! The daemon's terminal error taxonomy.
//!
//! Every variant is terminal for the process: bootstrap errors unwind only
//! the endpoints already opened, reactor errors tear down the whole daemon
//! state. Nothing is retried in place except the bounded lock-replacement
//! retry inside the instance lock.

use std::io;
use thiserror::Error;

/// Errors that terminate the daemon.
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Composed lock file path exceeds the fixed bound.
    #[error("lock file path would exceed {0} bytes")]
    PathOverflow(usize),

    /// I/O failure opening, locking, or writing the pid file.
    #[error("failed to open or lock pid file: {0}")]
    LockIo(#[source] io::Error),

    /// Another instance already holds the instance lock.
    #[error("another instance is already running{}", .pid.as_deref().map(|p| format!(" with pid {p}")).unwrap_or_default())]
    AlreadyRunning {
        /// Believed owner pid, read best-effort from the lock file.
        pid: Option<String>,
    },

    /// Failed to connect to the IPC bus.
    #[error("bus: failed to connect: {0}")]
    BusConnect(#[source] io::Error),

    /// Failed to connect to the display server.
    #[error("display: failed to connect: {0}")]
    DisplayConnect(#[source] io::Error),

    /// Failed to create the media-streaming event loop.
    #[error("media: failed to create loop: {0}")]
    MediaLoopInit(#[source] io::Error),

    /// Media loop iteration failed during a reactor pass.
    #[error("media: loop iteration failed: {0}")]
    MediaLoop(#[source] io::Error),

    /// The screencast subsystem refused to initialize.
    #[error("screencast: failed to initialize: {0}")]
    ScreencastInit(String),

    /// The bus refused the daemon's well-known service name.
    #[error("bus: failed to acquire service name: {0}")]
    ServiceName(#[source] io::Error),

    /// The multiplexed wait itself failed.
    #[error("poll failed: {0}")]
    Poll(#[source] io::Error),

    /// Draining or decoding bus messages failed.
    #[error("bus: message processing failed: {0}")]
    BusProcess(#[source] io::Error),

    /// Display event dispatch failed.
    #[error("display: dispatch failed: {0}")]
    DisplayDispatch(#[source] io::Error),
}

/// Result type for daemon operations.
pub type DaemonResult<T> = Result<T, DaemonError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_already_running_names_pid() {
        let err = DaemonError::AlreadyRunning {
            pid: Some("1234".to_string()),
        };
        assert!(err.to_string().contains("1234"));
    }

    #[test]
    fn test_already_running_without_pid() {
        let err = DaemonError::AlreadyRunning { pid: None };
        assert_eq!(err.to_string(), "another instance is already running");
    }

    #[test]
    fn test_errors_name_the_failing_subsystem() {
        let err = DaemonError::DisplayConnect(io::Error::new(
            io::ErrorKind::ConnectionRefused,
            "refused",
        ));
        assert!(err.to_string().starts_with("display:"));

        let err = DaemonError::BusProcess(io::Error::new(io::ErrorKind::InvalidData, "bad frame"));
        assert!(err.to_string().starts_with("bus:"));
    }
}
