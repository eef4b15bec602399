//! Socket-backed IPC bus endpoint.

use std::io;
use std::os::unix::io::{AsRawFd, RawFd};
use std::os::unix::net::UnixStream;
use std::path::Path;
use std::time::Duration;

use tracing::{debug, trace};
use xdpw_protocol::{
    bus_socket_path, encode_frame, flush_into, BusMessage, BusReply, FrameBuffer,
};

use super::BusEndpoint;

/// How long the bootstrap name request may wait for the bus's answer.
const NAME_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection to the user-session IPC bus.
///
/// The socket stays non-blocking for the reactor; only the bootstrap
/// name request temporarily switches it to blocking reads.
pub struct BusConnection {
    stream: UnixStream,
    incoming: FrameBuffer,
    outgoing: Vec<u8>,
}

impl BusConnection {
    /// Connects to the session bus socket.
    pub fn connect() -> io::Result<Self> {
        Self::connect_to(&bus_socket_path())
    }

    /// Connects to an explicit socket path.
    pub fn connect_to(path: &Path) -> io::Result<Self> {
        let stream = UnixStream::connect(path)?;
        debug!(path = %path.display(), "bus: connected");
        Self::from_stream(stream)
    }

    /// Wraps an already-connected stream.
    pub fn from_stream(stream: UnixStream) -> io::Result<Self> {
        stream.set_nonblocking(true)?;
        Ok(Self {
            stream,
            incoming: FrameBuffer::new(),
            outgoing: Vec::new(),
        })
    }

    /// Blocking exchange for the name request: drain the outgoing queue,
    /// then read until the bus grants or refuses the name.
    fn exchange_name(&mut self, name: &str) -> io::Result<()> {
        while !self.outgoing.is_empty() {
            flush_into(&mut self.stream, &mut self.outgoing)?;
        }
        loop {
            if let Some(msg) = self.incoming.next_frame::<BusMessage>()? {
                return match msg {
                    BusMessage::NameAcquired { name: granted } if granted == name => {
                        debug!(name, "bus: service name acquired");
                        Ok(())
                    }
                    BusMessage::NameLost { name: lost } => Err(io::Error::new(
                        io::ErrorKind::Other,
                        format!("bus refused service name {lost}"),
                    )),
                    other => Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("unexpected bus reply to name request: {other:?}"),
                    )),
                };
            }
            self.incoming.fill_once(&mut self.stream)?;
        }
    }
}

impl BusEndpoint for BusConnection {
    fn poll_fd(&self) -> RawFd {
        self.stream.as_raw_fd()
    }

    fn process_one(&mut self) -> io::Result<Option<BusMessage>> {
        if let Some(msg) = self.incoming.next_frame()? {
            trace!(?msg, "bus: message");
            return Ok(Some(msg));
        }
        if self.incoming.fill(&mut self.stream)? == 0 {
            return Ok(None);
        }
        let msg = self.incoming.next_frame()?;
        if let Some(msg) = &msg {
            trace!(?msg, "bus: message");
        }
        Ok(msg)
    }

    fn send(&mut self, reply: &BusReply) -> io::Result<()> {
        self.outgoing.extend(encode_frame(reply)?);
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        flush_into(&mut self.stream, &mut self.outgoing)
    }

    fn request_name(&mut self, name: &str) -> io::Result<()> {
        self.send(&BusReply::request_name(name))?;
        self.stream.set_nonblocking(false)?;
        self.stream.set_read_timeout(Some(NAME_REQUEST_TIMEOUT))?;
        let result = self.exchange_name(name);
        self.stream.set_read_timeout(None)?;
        self.stream.set_nonblocking(true)?;
        result
    }
}
