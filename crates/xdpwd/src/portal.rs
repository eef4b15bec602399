//! Routing of drained bus messages to their owning subsystem.

use std::io;

use tracing::{debug, warn};
use xdpw_protocol::{BusMessage, BusReply};

use crate::state::DaemonState;
use crate::{screencast, screenshot};

/// Hands one bus message to the subsystem that owns it.
///
/// Replies are queued on the bus endpoint; the reactor flushes them at
/// the end of the same iteration.
pub fn dispatch(msg: BusMessage, state: &mut DaemonState) -> io::Result<()> {
    match msg {
        BusMessage::Ping { seq } => state.bus.send(&BusReply::Pong { seq }),
        BusMessage::GetCapabilities => {
            let caps = &state.capabilities;
            let reply = BusReply::Capabilities {
                source_types: caps.source_types(),
                cursor_modes: caps.cursor_modes(),
                version: caps.version(),
            };
            state.bus.send(&reply)
        }
        BusMessage::CreateSession {
            handle,
            source_types,
            cursor_modes,
        } => screencast::create_session(state, handle, source_types, cursor_modes),
        BusMessage::CloseSession { handle } => screencast::close_session(state, handle),
        BusMessage::Screenshot { handle } => screenshot::capture(state, handle),
        BusMessage::NameAcquired { name } => {
            debug!(%name, "bus: name acquired");
            Ok(())
        }
        BusMessage::NameLost { name } => {
            // A replacement instance has taken the name; it will signal
            // this process through the pid lock shortly.
            warn!(%name, "bus: service name lost");
            Ok(())
        }
    }
}
