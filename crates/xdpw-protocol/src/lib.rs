//! xdpw Protocol - Wire protocol for endpoint communication
//!
//! This crate provides the message types and framing the daemon speaks on
//! its three endpoints: the IPC bus (portal requests from sandboxed
//! applications), the display server (output events and capture requests),
//! and the media-streaming loop (stream nodes and heartbeats).
//!
//! Frames are newline-delimited JSON; the wire layout is an implementation
//! detail of this project and carries no compatibility promise beyond
//! [`message::BusReply::Capabilities`]'s version field.

pub mod framing;
pub mod message;
pub mod socket;

pub use framing::{encode_frame, flush_into, FrameBuffer, MAX_FRAME_SIZE};
pub use message::{
    BusMessage, BusReply, DisplayEvent, DisplayRequest, MediaEvent, MediaRequest,
};
pub use socket::{bus_socket_path, display_socket_path, media_socket_path, runtime_dir};
