//! The multiplexed event loop.
//!
//! One thread, one `poll(2)` set, three endpoints. Every iteration runs
//! its steps in a fixed order regardless of which descriptors woke the
//! loop, so cross-endpoint effects (a bus request that queues display
//! traffic) resolve within the same iteration.

use tracing::{trace, warn};
use xdpw_core::{DaemonError, DaemonResult};

use crate::endpoint::PollSet;
use crate::portal;
use crate::state::DaemonState;

/// Drives the endpoints until a fatal error.
///
/// There is no success exit; the function only returns the error that
/// killed the loop. Flush failures are not fatal: the peer's next read
/// or our next poll surfaces a genuinely dead connection.
pub fn run(state: &mut DaemonState) -> DaemonResult<()> {
    let mut poll_set = PollSet::new(
        state.bus.poll_fd(),
        state.display.poll_fd(),
        state.media.poll_fd(),
    );

    loop {
        let ready = poll_set.wait()?;

        if ready.bus {
            trace!("event loop: bus event");
            drain_bus(state)?;
        }

        if ready.display {
            trace!("event loop: display event");
            state
                .display
                .dispatch()
                .map_err(DaemonError::DisplayDispatch)?;
        }

        if ready.media {
            trace!("event loop: media event");
            state.media.iterate().map_err(DaemonError::MediaLoop)?;
        }

        // Bus handling may have queued display requests whose replies in
        // turn sit buffered; keep draining until a pass handles nothing.
        loop {
            let handled = state
                .display
                .dispatch_pending()
                .map_err(DaemonError::DisplayDispatch)?;
            if let Err(err) = state.display.flush() {
                warn!(error = %err, "display: flush failed");
            }
            if handled == 0 {
                break;
            }
        }

        if let Err(err) = state.bus.flush() {
            warn!(error = %err, "bus: flush failed");
        }
    }
}

/// Handles bus messages until the endpoint reports an empty queue.
fn drain_bus(state: &mut DaemonState) -> DaemonResult<()> {
    loop {
        let msg = state.bus.process_one().map_err(DaemonError::BusProcess)?;
        let Some(msg) = msg else {
            return Ok(());
        };
        portal::dispatch(msg, state).map_err(DaemonError::BusProcess)?;
    }
}
