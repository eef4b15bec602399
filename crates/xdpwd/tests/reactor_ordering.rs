//! Per-iteration ordering of the event loop, observed through synthetic
//! endpoints that append to a shared operation log.
//!
//! The bus fake never consumes its readiness byte, so the loop wakes
//! again after a full iteration; failing the bus on its second process
//! call gives every test a clean exit.

use std::io::{self, Read, Write};
use std::os::unix::io::{AsRawFd, RawFd};
use std::os::unix::net::UnixStream;
use std::sync::{Arc, Mutex};

use xdpw_core::{
    CapabilityRegistry, CursorModes, DaemonError, SessionRegistry, SourceTypes,
};
use xdpw_protocol::{BusMessage, BusReply, DisplayRequest};
use xdpwd::endpoint::{BusEndpoint, DisplayEndpoint, MediaEndpoint};
use xdpwd::reactor;
use xdpwd::state::DaemonState;

type OpLog = Arc<Mutex<Vec<&'static str>>>;

fn log(ops: &OpLog, op: &'static str) {
    ops.lock().unwrap().push(op);
}

/// A readable descriptor; writing to the retained peer arms it.
struct Wire {
    ours: UnixStream,
    peer: UnixStream,
}

impl Wire {
    fn new() -> Self {
        let (ours, peer) = UnixStream::pair().unwrap();
        ours.set_nonblocking(true).unwrap();
        Self { ours, peer }
    }

    fn armed() -> Self {
        let mut wire = Self::new();
        wire.peer.write_all(b"x").unwrap();
        wire
    }

    fn clear(&mut self) {
        let mut scratch = [0u8; 16];
        let _ = self.ours.read(&mut scratch);
    }
}

struct LogBus {
    wire: Wire,
    ops: OpLog,
    calls: usize,
    fail_on_call: usize,
}

impl BusEndpoint for LogBus {
    fn poll_fd(&self) -> RawFd {
        self.wire.ours.as_raw_fd()
    }
    fn process_one(&mut self) -> io::Result<Option<BusMessage>> {
        log(&self.ops, "bus_process");
        self.calls += 1;
        if self.calls >= self.fail_on_call {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "bus gone"));
        }
        // The readiness byte stays unread so the next poll wakes too.
        Ok(None)
    }
    fn send(&mut self, _reply: &BusReply) -> io::Result<()> {
        Ok(())
    }
    fn flush(&mut self) -> io::Result<()> {
        log(&self.ops, "bus_flush");
        Ok(())
    }
    fn request_name(&mut self, _name: &str) -> io::Result<()> {
        Ok(())
    }
}

struct LogDisplay {
    wire: Wire,
    ops: OpLog,
    fail_dispatch: bool,
    pending_rounds: usize,
}

impl DisplayEndpoint for LogDisplay {
    fn poll_fd(&self) -> RawFd {
        self.wire.ours.as_raw_fd()
    }
    fn dispatch(&mut self) -> io::Result<usize> {
        log(&self.ops, "display_dispatch");
        if self.fail_dispatch {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "display gone"));
        }
        self.wire.clear();
        Ok(0)
    }
    fn dispatch_pending(&mut self) -> io::Result<usize> {
        log(&self.ops, "display_pending");
        if self.pending_rounds > 0 {
            self.pending_rounds -= 1;
            return Ok(1);
        }
        Ok(0)
    }
    fn send(&mut self, _request: &DisplayRequest) -> io::Result<()> {
        Ok(())
    }
    fn flush(&mut self) -> io::Result<()> {
        log(&self.ops, "display_flush");
        Ok(())
    }
    fn roundtrip(&mut self) -> io::Result<()> {
        Ok(())
    }
    fn output_names(&self) -> Vec<String> {
        Vec::new()
    }
}

struct LogMedia {
    wire: Wire,
    ops: OpLog,
}

impl MediaEndpoint for LogMedia {
    fn poll_fd(&self) -> RawFd {
        self.wire.ours.as_raw_fd()
    }
    fn iterate(&mut self) -> io::Result<usize> {
        log(&self.ops, "media_iterate");
        self.wire.clear();
        Ok(0)
    }
}

struct Scenario {
    bus_armed: bool,
    display_armed: bool,
    media_armed: bool,
    bus_fail_on_call: usize,
    display_fail_dispatch: bool,
    pending_rounds: usize,
}

fn build_state(ops: &OpLog, scenario: Scenario) -> DaemonState {
    let wire = |armed| if armed { Wire::armed() } else { Wire::new() };
    DaemonState {
        media: Box::new(LogMedia {
            wire: wire(scenario.media_armed),
            ops: ops.clone(),
        }),
        display: Box::new(LogDisplay {
            wire: wire(scenario.display_armed),
            ops: ops.clone(),
            fail_dispatch: scenario.display_fail_dispatch,
            pending_rounds: scenario.pending_rounds,
        }),
        bus: Box::new(LogBus {
            wire: wire(scenario.bus_armed),
            ops: ops.clone(),
            calls: 0,
            fail_on_call: scenario.bus_fail_on_call,
        }),
        capabilities: CapabilityRegistry::new(
            SourceTypes::MONITOR,
            CursorModes::HIDDEN | CursorModes::EMBEDDED,
            None,
        ),
        sessions: SessionRegistry::new(),
    }
}

#[test]
fn test_iteration_runs_endpoints_in_fixed_order() {
    let ops: OpLog = Arc::new(Mutex::new(Vec::new()));
    let mut state = build_state(
        &ops,
        Scenario {
            bus_armed: true,
            display_armed: true,
            media_armed: true,
            bus_fail_on_call: 2,
            display_fail_dispatch: false,
            pending_rounds: 0,
        },
    );

    let err = reactor::run(&mut state).unwrap_err();
    assert!(matches!(err, DaemonError::BusProcess(_)));

    let ops = ops.lock().unwrap();
    assert_eq!(
        *ops,
        vec![
            "bus_process",
            "display_dispatch",
            "media_iterate",
            "display_pending",
            "display_flush",
            "bus_flush",
            "bus_process",
        ]
    );
}

#[test]
fn test_display_failure_stops_before_media() {
    let ops: OpLog = Arc::new(Mutex::new(Vec::new()));
    let mut state = build_state(
        &ops,
        Scenario {
            bus_armed: true,
            display_armed: true,
            media_armed: true,
            bus_fail_on_call: usize::MAX,
            display_fail_dispatch: true,
            pending_rounds: 0,
        },
    );

    let err = reactor::run(&mut state).unwrap_err();
    assert!(matches!(err, DaemonError::DisplayDispatch(_)));

    let ops = ops.lock().unwrap();
    assert_eq!(*ops, vec!["bus_process", "display_dispatch"]);
}

#[test]
fn test_quiet_endpoints_are_skipped_but_flush_still_runs() {
    let ops: OpLog = Arc::new(Mutex::new(Vec::new()));
    let mut state = build_state(
        &ops,
        Scenario {
            bus_armed: true,
            display_armed: false,
            media_armed: false,
            bus_fail_on_call: 2,
            display_fail_dispatch: false,
            pending_rounds: 0,
        },
    );

    let err = reactor::run(&mut state).unwrap_err();
    assert!(matches!(err, DaemonError::BusProcess(_)));

    let ops = ops.lock().unwrap();
    assert_eq!(
        *ops,
        vec![
            "bus_process",
            "display_pending",
            "display_flush",
            "bus_flush",
            "bus_process",
        ]
    );
}

#[test]
fn test_pending_drain_repeats_until_quiet_and_flushes_each_round() {
    let ops: OpLog = Arc::new(Mutex::new(Vec::new()));
    let mut state = build_state(
        &ops,
        Scenario {
            bus_armed: true,
            display_armed: false,
            media_armed: false,
            bus_fail_on_call: 2,
            display_fail_dispatch: false,
            pending_rounds: 2,
        },
    );

    let err = reactor::run(&mut state).unwrap_err();
    assert!(matches!(err, DaemonError::BusProcess(_)));

    let ops = ops.lock().unwrap();
    assert_eq!(
        *ops,
        vec![
            "bus_process",
            "display_pending",
            "display_flush",
            "display_pending",
            "display_flush",
            "display_pending",
            "display_flush",
            "bus_flush",
            "bus_process",
        ]
    );
}
