//! Screencast subsystem: capture capabilities and session lifecycle.

use std::io;

use tracing::{debug, info, warn};
use xdpw_core::{CursorModes, DaemonError, DaemonResult, Session, SessionId, SourceTypes};
use xdpw_protocol::BusReply;

use crate::state::DaemonState;

/// Initializes the screencast subsystem during bootstrap.
///
/// A display roundtrip learns the announced outputs, the configured
/// output filter is validated against them, and the daemon's capture
/// capabilities are queued on the bus.
pub fn init(state: &mut DaemonState, output_filter: Option<&str>) -> DaemonResult<()> {
    state
        .display
        .roundtrip()
        .map_err(|err| DaemonError::ScreencastInit(format!("display roundtrip failed: {err}")))?;

    let outputs = state.display.output_names();
    debug!(?outputs, "screencast: outputs discovered");
    if let Some(name) = output_filter {
        if !outputs.iter().any(|o| o == name) {
            return Err(DaemonError::ScreencastInit(format!(
                "configured output {name} not found"
            )));
        }
    }

    let caps = &state.capabilities;
    let advert = BusReply::Capabilities {
        source_types: caps.source_types(),
        cursor_modes: caps.cursor_modes(),
        version: caps.version(),
    };
    state
        .bus
        .send(&advert)
        .map_err(|err| DaemonError::ScreencastInit(format!("capability advert failed: {err}")))?;

    Ok(())
}

/// Creates a capture session for `handle`.
pub fn create_session(
    state: &mut DaemonState,
    handle: SessionId,
    source_types: SourceTypes,
    cursor_modes: CursorModes,
) -> io::Result<()> {
    if !state.capabilities.source_types().contains(source_types) {
        warn!(%handle, "screencast: unsupported source types requested");
        return state
            .bus
            .send(&BusReply::error(format!("unsupported source types for {handle}")));
    }
    if !state.capabilities.cursor_modes().contains(cursor_modes) {
        warn!(%handle, "screencast: unsupported cursor modes requested");
        return state
            .bus
            .send(&BusReply::error(format!("unsupported cursor modes for {handle}")));
    }

    let session = Session {
        id: handle.clone(),
        source_types,
        cursor_modes,
    };
    if !state.sessions.insert(session) {
        return state
            .bus
            .send(&BusReply::error(format!("session {handle} already exists")));
    }

    info!(%handle, total = state.sessions.len(), "screencast: session created");
    state.bus.send(&BusReply::SessionCreated { handle })
}

/// Closes the capture session for `handle`.
pub fn close_session(state: &mut DaemonState, handle: SessionId) -> io::Result<()> {
    match state.sessions.remove(&handle) {
        Some(_) => {
            info!(%handle, total = state.sessions.len(), "screencast: session closed");
            state.bus.send(&BusReply::SessionClosed { handle })
        }
        None => state
            .bus
            .send(&BusReply::error(format!("no such session {handle}"))),
    }
}
