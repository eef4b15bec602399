//! Daemon state assembly.
//!
//! [`bootstrap`] brings the three endpoints up in a fixed order and
//! tears the survivors down in reverse when a step fails. The ordering
//! is load-bearing both ways: the display server depends on the bus
//! being reachable for error reporting, the media loop captures from
//! the display connection, and the service name goes out last so the
//! daemon is never discoverable while half-initialized.

use std::io;

use tracing::debug;
use xdpw_core::{
    CapabilityRegistry, CursorModes, DaemonError, DaemonResult, SessionRegistry, SourceTypes,
};

use crate::endpoint::{
    BusConnection, BusEndpoint, DisplayConnection, DisplayEndpoint, MediaEndpoint, MediaRuntime,
};
use crate::{screencast, screenshot};

/// Well-known service name claimed on the bus.
pub const SERVICE_NAME: &str = "org.freedesktop.impl.portal.desktop.wlr";

/// Startup configuration distilled from the command line.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Restrict capture to one named output.
    pub output_name: Option<String>,
}

type BusFactory = Box<dyn FnOnce() -> io::Result<Box<dyn BusEndpoint>>>;
type DisplayFactory = Box<dyn FnOnce() -> io::Result<Box<dyn DisplayEndpoint>>>;
type MediaFactory = Box<dyn FnOnce() -> io::Result<Box<dyn MediaEndpoint>>>;

/// Factories producing the three endpoints.
///
/// [`bootstrap`] consumes them in the fixed order bus, display, media.
/// Tests substitute synthetic endpoints here to observe unwind behavior.
pub struct Connectors {
    pub bus: BusFactory,
    pub display: DisplayFactory,
    pub media: MediaFactory,
}

impl Connectors {
    /// Socket-backed endpoints at their configured paths.
    pub fn system() -> Self {
        Self {
            bus: Box::new(|| {
                let conn = BusConnection::connect()?;
                Ok(Box::new(conn) as Box<dyn BusEndpoint>)
            }),
            display: Box::new(|| {
                let conn = DisplayConnection::connect()?;
                Ok(Box::new(conn) as Box<dyn DisplayEndpoint>)
            }),
            media: Box::new(|| {
                let conn = MediaRuntime::init().create_loop()?;
                Ok(Box::new(conn) as Box<dyn MediaEndpoint>)
            }),
        }
    }
}

/// Live daemon state: either all three endpoints are up, or the process
/// has already bailed out.
///
/// Endpoint fields are declared in teardown order. Struct fields drop
/// top to bottom, so the media loop closes before the display
/// connection, which closes before the bus.
pub struct DaemonState {
    pub media: Box<dyn MediaEndpoint>,
    pub display: Box<dyn DisplayEndpoint>,
    pub bus: Box<dyn BusEndpoint>,
    pub capabilities: CapabilityRegistry,
    pub sessions: SessionRegistry,
}

impl std::fmt::Debug for DaemonState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DaemonState").finish_non_exhaustive()
    }
}

/// Establishes the endpoints in fixed order and hands the assembled
/// state to the subsystem initializers.
///
/// On failure at any step, the endpoints opened so far are dropped in
/// reverse order of establishment, and no later step runs.
pub fn bootstrap(config: &Config, connectors: Connectors) -> DaemonResult<DaemonState> {
    let bus = (connectors.bus)().map_err(DaemonError::BusConnect)?;
    debug!("bootstrap: bus endpoint up");

    let display = (connectors.display)().map_err(DaemonError::DisplayConnect)?;
    debug!("bootstrap: display endpoint up");

    let media = (connectors.media)().map_err(DaemonError::MediaLoopInit)?;
    debug!("bootstrap: media loop up");

    let capabilities = CapabilityRegistry::new(
        SourceTypes::MONITOR,
        CursorModes::HIDDEN | CursorModes::EMBEDDED,
        config.output_name.clone(),
    );

    let mut state = DaemonState {
        bus,
        display,
        media,
        capabilities,
        sessions: SessionRegistry::new(),
    };

    screenshot::init(&state);
    screencast::init(&mut state, config.output_name.as_deref())?;

    state
        .bus
        .request_name(SERVICE_NAME)
        .map_err(DaemonError::ServiceName)?;
    debug!(name = SERVICE_NAME, "bootstrap: service name acquired");

    Ok(state)
}
