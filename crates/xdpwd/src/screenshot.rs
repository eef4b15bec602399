//! Screenshot subsystem: single-shot frame grabs.

use std::io;

use tracing::{debug, warn};
use xdpw_protocol::{BusReply, DisplayRequest};

use crate::state::DaemonState;

/// Initializes the screenshot subsystem during bootstrap. Infallible:
/// the subsystem has no resources of its own until a capture arrives.
pub fn init(state: &DaemonState) {
    debug!(
        version = state.capabilities.version(),
        "screenshot: initialized"
    );
}

/// Handles one screenshot request.
///
/// The capture request goes to the display server and the bus reply is
/// queued; both leave in the flush phase of the same reactor iteration.
pub fn capture(state: &mut DaemonState, handle: String) -> io::Result<()> {
    let target = match state.capabilities.output_name() {
        Some(name) => Some(name.to_string()),
        None => state.display.output_names().first().cloned(),
    };
    let Some(name) = target else {
        warn!(%handle, "screenshot: no output available");
        return state.bus.send(&BusReply::error("no output available"));
    };

    debug!(%handle, output = %name, "screenshot: capturing");
    state.display.send(&DisplayRequest::CaptureOutput { name })?;
    state.bus.send(&BusReply::ScreenshotDone { handle })
}
