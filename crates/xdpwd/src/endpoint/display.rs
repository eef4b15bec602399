//! Socket-backed display-server endpoint.

use std::io;
use std::os::unix::io::{AsRawFd, RawFd};
use std::os::unix::net::UnixStream;
use std::path::Path;
use std::time::Duration;

use tracing::{debug, trace};
use xdpw_protocol::{
    display_socket_path, encode_frame, flush_into, DisplayEvent, DisplayRequest, FrameBuffer,
};

use super::DisplayEndpoint;

/// How long a bootstrap roundtrip may wait for its sync reply.
const ROUNDTRIP_TIMEOUT: Duration = Duration::from_secs(5);

/// An output announced by the display server.
#[derive(Debug, Clone)]
struct Output {
    name: String,
    width: u32,
    height: u32,
}

/// Connection to the display server.
pub struct DisplayConnection {
    stream: UnixStream,
    incoming: FrameBuffer,
    outgoing: Vec<u8>,
    outputs: Vec<Output>,
    sync_serial: u32,
}

impl DisplayConnection {
    /// Connects to the display server socket.
    pub fn connect() -> io::Result<Self> {
        Self::connect_to(&display_socket_path())
    }

    /// Connects to an explicit socket path.
    pub fn connect_to(path: &Path) -> io::Result<Self> {
        let stream = UnixStream::connect(path)?;
        debug!(path = %path.display(), "display: connected");
        Self::from_stream(stream)
    }

    /// Wraps an already-connected stream.
    pub fn from_stream(stream: UnixStream) -> io::Result<Self> {
        stream.set_nonblocking(true)?;
        Ok(Self {
            stream,
            incoming: FrameBuffer::new(),
            outgoing: Vec::new(),
            outputs: Vec::new(),
            sync_serial: 0,
        })
    }

    fn handle_event(&mut self, event: DisplayEvent) {
        match event {
            DisplayEvent::OutputAdded {
                name,
                width,
                height,
            } => {
                debug!(%name, width, height, "display: output added");
                self.outputs.retain(|o| o.name != name);
                self.outputs.push(Output {
                    name,
                    width,
                    height,
                });
            }
            DisplayEvent::OutputRemoved { name } => {
                debug!(%name, "display: output removed");
                self.outputs.retain(|o| o.name != name);
            }
            DisplayEvent::SyncDone { serial } => {
                trace!(serial, "display: sync done");
            }
        }
    }

    /// Handles every complete buffered event, returning how many.
    fn drain_buffered(&mut self) -> io::Result<usize> {
        let mut handled = 0;
        while let Some(event) = self.incoming.next_frame::<DisplayEvent>()? {
            self.handle_event(event);
            handled += 1;
        }
        Ok(handled)
    }

    /// Blocking wait for the matching sync reply, handling events that
    /// arrive ahead of it.
    fn wait_for_sync(&mut self, serial: u32) -> io::Result<()> {
        while !self.outgoing.is_empty() {
            flush_into(&mut self.stream, &mut self.outgoing)?;
        }
        loop {
            while let Some(event) = self.incoming.next_frame::<DisplayEvent>()? {
                let done = matches!(
                    &event,
                    DisplayEvent::SyncDone { serial: s } if *s == serial
                );
                self.handle_event(event);
                if done {
                    return Ok(());
                }
            }
            self.incoming.fill_once(&mut self.stream)?;
        }
    }
}

impl DisplayEndpoint for DisplayConnection {
    fn poll_fd(&self) -> RawFd {
        self.stream.as_raw_fd()
    }

    fn dispatch(&mut self) -> io::Result<usize> {
        self.incoming.fill(&mut self.stream)?;
        self.drain_buffered()
    }

    fn dispatch_pending(&mut self) -> io::Result<usize> {
        self.drain_buffered()
    }

    fn send(&mut self, request: &DisplayRequest) -> io::Result<()> {
        self.outgoing.extend(encode_frame(request)?);
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        flush_into(&mut self.stream, &mut self.outgoing)
    }

    fn roundtrip(&mut self) -> io::Result<()> {
        self.sync_serial += 1;
        let serial = self.sync_serial;
        self.send(&DisplayRequest::Sync { serial })?;

        self.stream.set_nonblocking(false)?;
        self.stream.set_read_timeout(Some(ROUNDTRIP_TIMEOUT))?;
        let result = self.wait_for_sync(serial);
        self.stream.set_read_timeout(None)?;
        self.stream.set_nonblocking(true)?;
        result
    }

    fn output_names(&self) -> Vec<String> {
        self.outputs.iter().map(|o| o.name.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};

    fn pair() -> (DisplayConnection, UnixStream) {
        let (ours, theirs) = UnixStream::pair().unwrap();
        (DisplayConnection::from_stream(ours).unwrap(), theirs)
    }

    #[test]
    fn test_dispatch_tracks_outputs() {
        let (mut display, mut peer) = pair();
        peer.write_all(
            b"{\"type\":\"output_added\",\"name\":\"DP-1\",\"width\":1920,\"height\":1080}\n\
              {\"type\":\"output_added\",\"name\":\"DP-2\",\"width\":2560,\"height\":1440}\n\
              {\"type\":\"output_removed\",\"name\":\"DP-1\"}\n",
        )
        .unwrap();

        let handled = display.dispatch().unwrap();
        assert_eq!(handled, 3);
        assert_eq!(display.output_names(), vec!["DP-2".to_string()]);
    }

    #[test]
    fn test_dispatch_pending_never_reads_the_socket() {
        let (mut display, mut peer) = pair();
        peer.write_all(b"{\"type\":\"output_added\",\"name\":\"DP-1\",\"width\":1,\"height\":1}\n")
            .unwrap();

        assert_eq!(display.dispatch_pending().unwrap(), 0);
        assert_eq!(display.dispatch().unwrap(), 1);
        assert_eq!(display.dispatch_pending().unwrap(), 0);
    }

    #[test]
    fn test_roundtrip_handles_events_ahead_of_sync() {
        let (mut display, mut peer) = pair();

        let server = std::thread::spawn(move || {
            let mut raw = Vec::new();
            let mut byte = [0u8; 1];
            loop {
                peer.read_exact(&mut byte).unwrap();
                if byte[0] == b'\n' {
                    break;
                }
                raw.push(byte[0]);
            }
            let request: serde_json::Value = serde_json::from_slice(&raw).unwrap();
            assert_eq!(request["type"], "sync");
            let serial = request["serial"].as_u64().unwrap();
            peer.write_all(
                b"{\"type\":\"output_added\",\"name\":\"DP-1\",\"width\":1920,\"height\":1080}\n",
            )
            .unwrap();
            peer.write_all(
                format!("{{\"type\":\"sync_done\",\"serial\":{serial}}}\n").as_bytes(),
            )
            .unwrap();
        });

        display.roundtrip().unwrap();
        server.join().unwrap();
        assert_eq!(display.output_names(), vec!["DP-1".to_string()]);
    }
}
