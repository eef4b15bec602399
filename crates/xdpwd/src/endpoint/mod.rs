//! Endpoint abstractions multiplexed by the reactor.
//!
//! The three protocol endpoints sit behind narrow traits so the
//! bootstrap and the reactor can be exercised with synthetic endpoints.
//! The socket-backed implementations live in the sibling modules.

pub mod bus;
pub mod display;
pub mod media;

pub use bus::BusConnection;
pub use display::DisplayConnection;
pub use media::{MediaConnection, MediaRuntime};

use std::io;
use std::os::unix::io::RawFd;

use xdpw_core::{DaemonError, DaemonResult};
use xdpw_protocol::{BusMessage, BusReply, DisplayRequest};

/// IPC bus endpoint carrying portal requests.
pub trait BusEndpoint {
    /// Descriptor the reactor polls for readability.
    fn poll_fd(&self) -> RawFd;

    /// Processes one pending message. `Ok(None)` means the queue is
    /// drained for now.
    fn process_one(&mut self) -> io::Result<Option<BusMessage>>;

    /// Queues one reply for the next flush.
    fn send(&mut self, reply: &BusReply) -> io::Result<()>;

    /// Writes queued outgoing traffic.
    fn flush(&mut self) -> io::Result<()>;

    /// Claims the daemon's well-known service name, blocking until the
    /// bus answers. The name is requested with replace-existing and
    /// allow-replacement, matching the pid-lock replacement model.
    fn request_name(&mut self, name: &str) -> io::Result<()>;
}

/// Display-server endpoint carrying output events and capture requests.
pub trait DisplayEndpoint {
    fn poll_fd(&self) -> RawFd;

    /// One read from the socket plus handling of every event it
    /// completed. Returns the number of events handled.
    fn dispatch(&mut self) -> io::Result<usize>;

    /// Handles already-buffered events without touching the socket.
    fn dispatch_pending(&mut self) -> io::Result<usize>;

    /// Queues one request for the next flush.
    fn send(&mut self, request: &DisplayRequest) -> io::Result<()>;

    /// Writes queued outgoing traffic.
    fn flush(&mut self) -> io::Result<()>;

    /// Blocks until the display server has processed everything sent so
    /// far, handling events that arrive in the meantime.
    fn roundtrip(&mut self) -> io::Result<()>;

    /// Output names currently announced by the display server.
    fn output_names(&self) -> Vec<String>;
}

/// Media-streaming loop endpoint.
pub trait MediaEndpoint {
    fn poll_fd(&self) -> RawFd;

    /// One non-blocking iteration of the media loop. Returns the number
    /// of events handled.
    fn iterate(&mut self) -> io::Result<usize>;
}

/// Readiness of the three endpoints after one poll wait.
#[derive(Debug, Clone, Copy, Default)]
pub struct Readiness {
    pub bus: bool,
    pub display: bool,
    pub media: bool,
}

/// Fixed three-slot poll set over the endpoint descriptors.
///
/// Built once after bootstrap and never resized; the daemon's descriptor
/// set is static for its whole life.
pub struct PollSet {
    fds: [libc::pollfd; 3],
}

impl PollSet {
    pub fn new(bus: RawFd, display: RawFd, media: RawFd) -> Self {
        let slot = |fd| libc::pollfd {
            fd,
            events: libc::POLLIN,
            revents: 0,
        };
        Self {
            fds: [slot(bus), slot(display), slot(media)],
        }
    }

    /// Blocks until at least one endpoint is readable.
    ///
    /// Hangup and error conditions count as readable so the endpoint's
    /// own read path reports the failure.
    pub fn wait(&mut self) -> DaemonResult<Readiness> {
        for slot in &mut self.fds {
            slot.revents = 0;
        }
        // SAFETY: fds is a live, initialized array of exactly 3 pollfds.
        let rc = unsafe {
            libc::poll(
                self.fds.as_mut_ptr(),
                self.fds.len() as libc::nfds_t,
                -1,
            )
        };
        if rc < 0 {
            return Err(DaemonError::Poll(io::Error::last_os_error()));
        }
        let readable = |slot: &libc::pollfd| {
            slot.revents & (libc::POLLIN | libc::POLLHUP | libc::POLLERR) != 0
        };
        Ok(Readiness {
            bus: readable(&self.fds[0]),
            display: readable(&self.fds[1]),
            media: readable(&self.fds[2]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::os::unix::io::AsRawFd;
    use std::os::unix::net::UnixStream;

    #[test]
    fn test_poll_set_reports_readable_endpoint() {
        let (bus_a, mut bus_b) = UnixStream::pair().unwrap();
        let (display_a, _display_b) = UnixStream::pair().unwrap();
        let (media_a, _media_b) = UnixStream::pair().unwrap();

        let mut set = PollSet::new(
            bus_a.as_raw_fd(),
            display_a.as_raw_fd(),
            media_a.as_raw_fd(),
        );

        bus_b.write_all(b"x").unwrap();
        let ready = set.wait().unwrap();
        assert!(ready.bus);
        assert!(!ready.display);
        assert!(!ready.media);
    }

    #[test]
    fn test_poll_set_hangup_counts_as_readable() {
        let (bus_a, _bus_b) = UnixStream::pair().unwrap();
        let (display_a, display_b) = UnixStream::pair().unwrap();
        let (media_a, _media_b) = UnixStream::pair().unwrap();

        let mut set = PollSet::new(
            bus_a.as_raw_fd(),
            display_a.as_raw_fd(),
            media_a.as_raw_fd(),
        );

        drop(display_b);
        let ready = set.wait().unwrap();
        assert!(ready.display);
    }
}
