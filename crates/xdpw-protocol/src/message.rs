//! Protocol message types for the three endpoints.

use serde::{Deserialize, Serialize};
use xdpw_core::{CursorModes, SessionId, SourceTypes};

/// Messages arriving on the IPC bus from sandboxed applications (via the
/// portal frontend) or from the bus daemon itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BusMessage {
    /// Liveness probe.
    Ping {
        /// Sequence number echoed in the pong.
        seq: u64,
    },

    /// Client asks what this backend can capture.
    GetCapabilities,

    /// Client opens a screencast session.
    CreateSession {
        /// Client-chosen session handle.
        handle: SessionId,
        /// Requested capture source kinds.
        source_types: SourceTypes,
        /// Requested cursor presentation.
        cursor_modes: CursorModes,
    },

    /// Client closes a screencast session.
    CloseSession {
        /// Handle of the session to close.
        handle: SessionId,
    },

    /// Client requests a single-shot screenshot.
    Screenshot {
        /// Request handle for matching the reply.
        handle: String,
    },

    /// Bus granted the requested well-known name.
    NameAcquired {
        /// The granted name.
        name: String,
    },

    /// Bus took the well-known name away (a newer instance replaced us).
    NameLost {
        /// The lost name.
        name: String,
    },
}

/// Messages the daemon sends back on the IPC bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BusReply {
    /// Pong response to a ping.
    Pong {
        /// Sequence number from the ping.
        seq: u64,
    },

    /// Capability advertisement.
    Capabilities {
        /// Supported capture source kinds.
        source_types: SourceTypes,
        /// Supported cursor presentation modes.
        cursor_modes: CursorModes,
        /// Capture protocol version.
        version: u32,
    },

    /// Screencast session accepted.
    SessionCreated {
        /// Handle of the new session.
        handle: SessionId,
    },

    /// Screencast session closed.
    SessionClosed {
        /// Handle of the closed session.
        handle: SessionId,
    },

    /// Screenshot request accepted and forwarded to the display server.
    ScreenshotDone {
        /// Request handle from the Screenshot message.
        handle: String,
    },

    /// Request the well-known service name from the bus.
    RequestName {
        /// The name to claim.
        name: String,
        /// Take the name over from a current owner.
        replace_existing: bool,
        /// Permit a future instance to take the name from us.
        allow_replacement: bool,
    },

    /// Error response.
    Error {
        /// Human-readable reason.
        message: String,
    },
}

impl BusReply {
    /// Creates an error response.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Creates the name request the daemon sends at the end of bootstrap.
    pub fn request_name(name: &str) -> Self {
        Self::RequestName {
            name: name.to_string(),
            replace_existing: true,
            allow_replacement: true,
        }
    }
}

/// Events arriving from the display server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DisplayEvent {
    /// An output appeared (or was announced during the initial roundtrip).
    OutputAdded {
        /// Connector name, e.g. "DP-1".
        name: String,
        /// Pixel width.
        width: u32,
        /// Pixel height.
        height: u32,
    },

    /// An output disappeared.
    OutputRemoved {
        /// Connector name.
        name: String,
    },

    /// Roundtrip barrier: everything sent before the matching Sync request
    /// has been processed.
    SyncDone {
        /// Serial from the Sync request.
        serial: u32,
    },
}

/// Requests the daemon sends to the display server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DisplayRequest {
    /// Roundtrip barrier request.
    Sync {
        /// Serial echoed in SyncDone.
        serial: u32,
    },

    /// Grab one frame of the named output.
    CaptureOutput {
        /// Connector name.
        name: String,
    },
}

/// Events arriving on the media-streaming loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MediaEvent {
    /// Periodic liveness probe from the media daemon.
    Heartbeat {
        /// Sequence number to acknowledge.
        seq: u64,
    },

    /// A stream node became available.
    StreamAdded {
        /// Media-daemon node ID.
        node_id: u32,
    },

    /// A stream node went away.
    StreamRemoved {
        /// Media-daemon node ID.
        node_id: u32,
    },
}

/// Requests the daemon sends on the media-streaming loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MediaRequest {
    /// Initial handshake after connecting the loop.
    Hello {
        /// Capture protocol version of this daemon.
        version: u32,
    },

    /// Heartbeat acknowledgement.
    HeartbeatAck {
        /// Sequence number from the heartbeat.
        seq: u64,
    },
}
