//! Newline-delimited JSON framing shared by the three endpoints.
//!
//! Each endpoint keeps one [`FrameBuffer`] for its socket. Readiness
//! handling fills the buffer from the socket (draining everything the
//! kernel has for us), then pops complete frames one at a time. Writes go
//! through a plain byte queue flushed with [`flush_into`], so a slow peer
//! never blocks the reactor.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::{self, Read, Write};

/// Maximum size of one frame (1 MiB).
pub const MAX_FRAME_SIZE: usize = 1_048_576;

/// Accumulates raw socket bytes and yields complete frames.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    buf: Vec<u8>,
}

impl FrameBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads from `src` until it would block, appending to the buffer.
    ///
    /// Returns the number of bytes read. A peer that closed the connection
    /// before delivering any bytes yields `UnexpectedEof`.
    pub fn fill(&mut self, src: &mut impl Read) -> io::Result<usize> {
        let mut total = 0;
        loop {
            let mut chunk = [0u8; 4096];
            match src.read(&mut chunk) {
                Ok(0) => {
                    if total == 0 {
                        return Err(io::Error::new(
                            io::ErrorKind::UnexpectedEof,
                            "peer closed the connection",
                        ));
                    }
                    break;
                }
                Ok(n) => {
                    self.push(&chunk[..n])?;
                    total += n;
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(total)
    }

    /// Performs exactly one read from `src`, appending to the buffer.
    ///
    /// Used for blocking exchanges (roundtrips, the bootstrap name
    /// request) where one readiness event corresponds to one read.
    pub fn fill_once(&mut self, src: &mut impl Read) -> io::Result<usize> {
        let mut chunk = [0u8; 4096];
        loop {
            match src.read(&mut chunk) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "peer closed the connection",
                    ))
                }
                Ok(n) => {
                    self.push(&chunk[..n])?;
                    return Ok(n);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    /// Pops the next complete frame, decoded as `T`.
    ///
    /// Returns `Ok(None)` when no complete frame is buffered. A frame that
    /// fails to decode is a protocol error and poisons the connection.
    pub fn next_frame<T: DeserializeOwned>(&mut self) -> io::Result<Option<T>> {
        loop {
            let Some(pos) = self.buf.iter().position(|&b| b == b'\n') else {
                return Ok(None);
            };
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            let line = &line[..line.len() - 1];
            if line.is_empty() {
                continue;
            }
            return serde_json::from_slice(line)
                .map(Some)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e));
        }
    }

    fn push(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.buf.extend_from_slice(bytes);
        // The cap applies to a single frame: only the unterminated tail
        // counts, complete frames awaiting decode do not.
        let tail = match self.buf.iter().rposition(|&b| b == b'\n') {
            Some(pos) => self.buf.len() - pos - 1,
            None => self.buf.len(),
        };
        if tail > MAX_FRAME_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("frame exceeds {MAX_FRAME_SIZE} bytes"),
            ));
        }
        Ok(())
    }
}

/// Encodes one message as a newline-terminated JSON frame.
pub fn encode_frame<T: Serialize>(msg: &T) -> io::Result<Vec<u8>> {
    let mut frame =
        serde_json::to_vec(msg).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    frame.push(b'\n');
    Ok(frame)
}

/// Writes as much of `out` as the socket accepts, keeping the remainder
/// queued. Would-block is not an error; the next flush continues.
pub fn flush_into(dst: &mut impl Write, out: &mut Vec<u8>) -> io::Result<()> {
    while !out.is_empty() {
        match dst.write(out) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "peer stopped accepting bytes",
                ))
            }
            Ok(n) => {
                out.drain(..n);
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
