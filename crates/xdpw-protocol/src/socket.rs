//! Endpoint socket and runtime-directory path resolution.

use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

/// Environment variable overriding the bus socket path.
pub const BUS_SOCKET_ENV: &str = "XDPW_BUS_SOCKET";

/// Environment variable overriding the display-server socket path.
pub const DISPLAY_SOCKET_ENV: &str = "XDPW_DISPLAY_SOCKET";

/// Environment variable overriding the media-daemon socket path.
pub const MEDIA_SOCKET_ENV: &str = "XDPW_MEDIA_SOCKET";

/// Fallback base directory when `XDG_RUNTIME_DIR` is unset.
pub const RUNTIME_DIR_FALLBACK: &str = "/tmp";

/// Base directory for sockets and the instance lock.
///
/// `$XDG_RUNTIME_DIR`, falling back to `/tmp` when unset.
pub fn runtime_dir() -> PathBuf {
    runtime_dir_from(env::var_os("XDG_RUNTIME_DIR"))
}

pub(crate) fn runtime_dir_from(var: Option<OsString>) -> PathBuf {
    match var {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => PathBuf::from(RUNTIME_DIR_FALLBACK),
    }
}

/// Socket of the user-session IPC bus.
pub fn bus_socket_path() -> PathBuf {
    socket_path(env::var_os(BUS_SOCKET_ENV), "portal-bus.sock")
}

/// Socket of the display server.
pub fn display_socket_path() -> PathBuf {
    socket_path(env::var_os(DISPLAY_SOCKET_ENV), "display.sock")
}

/// Socket of the media-streaming daemon.
pub fn media_socket_path() -> PathBuf {
    socket_path(env::var_os(MEDIA_SOCKET_ENV), "media-0.sock")
}

fn socket_path(var: Option<OsString>, default_name: &str) -> PathBuf {
    match var {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => runtime_dir().join(default_name),
    }
}
