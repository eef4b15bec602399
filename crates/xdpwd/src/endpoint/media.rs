//! Socket-backed media-streaming loop.

use std::io;
use std::os::unix::io::{AsRawFd, RawFd};
use std::os::unix::net::UnixStream;
use std::path::PathBuf;

use tracing::{debug, trace};
use xdpw_protocol::{
    encode_frame, flush_into, media_socket_path, FrameBuffer, MediaEvent, MediaRequest,
};
use xdpw_core::CAST_PROTO_VERSION;

use super::MediaEndpoint;

/// Handle to the media stack, created before any loop exists.
///
/// Mirrors the stack's two-step startup: initialize the runtime, then
/// create the pollable loop from it.
pub struct MediaRuntime {
    socket: PathBuf,
}

impl MediaRuntime {
    /// Initializes the media runtime against the configured socket.
    pub fn init() -> Self {
        Self {
            socket: media_socket_path(),
        }
    }

    /// Initializes the runtime against an explicit socket path.
    pub fn with_socket(socket: PathBuf) -> Self {
        Self { socket }
    }

    /// Creates the media loop: connects the socket and announces the
    /// protocol version.
    pub fn create_loop(&self) -> io::Result<MediaConnection> {
        let stream = UnixStream::connect(&self.socket)?;
        let mut conn = MediaConnection::from_stream(stream)?;
        conn.outgoing.extend(encode_frame(&MediaRequest::Hello {
            version: CAST_PROTO_VERSION,
        })?);
        conn.flush_outgoing()?;
        debug!(path = %self.socket.display(), "media: loop created");
        Ok(conn)
    }
}

/// Pollable connection to the media loop.
pub struct MediaConnection {
    stream: UnixStream,
    incoming: FrameBuffer,
    outgoing: Vec<u8>,
    nodes: Vec<u32>,
}

impl MediaConnection {
    /// Wraps an already-connected stream.
    pub fn from_stream(stream: UnixStream) -> io::Result<Self> {
        stream.set_nonblocking(true)?;
        Ok(Self {
            stream,
            incoming: FrameBuffer::new(),
            outgoing: Vec::new(),
            nodes: Vec::new(),
        })
    }

    /// Node ids of the streams currently live on the media loop.
    pub fn stream_nodes(&self) -> &[u32] {
        &self.nodes
    }

    fn flush_outgoing(&mut self) -> io::Result<()> {
        flush_into(&mut self.stream, &mut self.outgoing)
    }
}

impl MediaEndpoint for MediaConnection {
    fn poll_fd(&self) -> RawFd {
        self.stream.as_raw_fd()
    }

    fn iterate(&mut self) -> io::Result<usize> {
        self.incoming.fill(&mut self.stream)?;
        let mut handled = 0;
        while let Some(event) = self.incoming.next_frame::<MediaEvent>()? {
            match event {
                MediaEvent::Heartbeat { seq } => {
                    trace!(seq, "media: heartbeat");
                    self.outgoing
                        .extend(encode_frame(&MediaRequest::HeartbeatAck { seq })?);
                }
                MediaEvent::StreamAdded { node_id } => {
                    debug!(node_id, "media: stream added");
                    self.nodes.retain(|n| *n != node_id);
                    self.nodes.push(node_id);
                }
                MediaEvent::StreamRemoved { node_id } => {
                    debug!(node_id, "media: stream removed");
                    self.nodes.retain(|n| *n != node_id);
                }
            }
            handled += 1;
        }
        // The media loop flushes its own acks within the iteration.
        self.flush_outgoing()?;
        Ok(handled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};

    fn pair() -> (MediaConnection, UnixStream) {
        let (ours, theirs) = UnixStream::pair().unwrap();
        (MediaConnection::from_stream(ours).unwrap(), theirs)
    }

    #[test]
    fn test_iterate_acks_heartbeats_immediately() {
        let (mut media, mut peer) = pair();
        peer.write_all(b"{\"type\":\"heartbeat\",\"seq\":3}\n").unwrap();

        assert_eq!(media.iterate().unwrap(), 1);

        let mut buf = [0u8; 64];
        let n = peer.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"{\"type\":\"heartbeat_ack\",\"seq\":3}\n");
    }

    #[test]
    fn test_iterate_tracks_stream_nodes() {
        let (mut media, mut peer) = pair();
        peer.write_all(
            b"{\"type\":\"stream_added\",\"node_id\":41}\n\
              {\"type\":\"stream_added\",\"node_id\":42}\n\
              {\"type\":\"stream_removed\",\"node_id\":41}\n",
        )
        .unwrap();

        assert_eq!(media.iterate().unwrap(), 3);
        assert_eq!(media.stream_nodes(), &[42]);
    }

    #[test]
    fn test_iterate_with_nothing_ready_is_a_no_op() {
        let (mut media, _peer) = pair();
        assert_eq!(media.iterate().unwrap(), 0);
    }
}
