//! Capture capability advertisement.
//!
//! The daemon decides once, at startup, which capture source kinds and
//! cursor presentation modes it supports. The resulting registry is
//! immutable for the life of the process and is shared by reference with
//! the screenshot and screencast subsystems.

use serde::{Deserialize, Serialize};
use std::ops::BitOr;

/// Capture protocol version advertised to clients.
pub const CAST_PROTO_VERSION: u32 = 2;

/// Bitset of supported capture source kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceTypes(u32);

impl SourceTypes {
    /// No sources supported.
    pub const EMPTY: SourceTypes = SourceTypes(0);

    /// Whole-output capture.
    pub const MONITOR: SourceTypes = SourceTypes(1);

    /// Single-window capture.
    pub const WINDOW: SourceTypes = SourceTypes(2);

    /// Returns true if every bit of `other` is set in `self`.
    pub fn contains(self, other: SourceTypes) -> bool {
        self.0 & other.0 == other.0
    }

    /// Raw bit representation, as sent on the wire.
    pub fn bits(self) -> u32 {
        self.0
    }
}

impl BitOr for SourceTypes {
    type Output = SourceTypes;

    fn bitor(self, rhs: SourceTypes) -> SourceTypes {
        SourceTypes(self.0 | rhs.0)
    }
}

/// Bitset of supported cursor presentation modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CursorModes(u32);

impl CursorModes {
    /// No cursor modes supported.
    pub const EMPTY: CursorModes = CursorModes(0);

    /// Cursor is not drawn at all.
    pub const HIDDEN: CursorModes = CursorModes(1);

    /// Cursor is composited into the captured frames.
    pub const EMBEDDED: CursorModes = CursorModes(2);

    /// Cursor position is delivered as stream metadata only.
    pub const METADATA: CursorModes = CursorModes(4);

    /// Returns true if every bit of `other` is set in `self`.
    pub fn contains(self, other: CursorModes) -> bool {
        self.0 & other.0 == other.0
    }

    /// Raw bit representation, as sent on the wire.
    pub fn bits(self) -> u32 {
        self.0
    }
}

impl BitOr for CursorModes {
    type Output = CursorModes;

    fn bitor(self, rhs: CursorModes) -> CursorModes {
        CursorModes(self.0 | rhs.0)
    }
}

/// Process-wide capture configuration snapshot.
///
/// Constructed once during endpoint bootstrap and read-only afterwards.
#[derive(Debug, Clone)]
pub struct CapabilityRegistry {
    source_types: SourceTypes,
    cursor_modes: CursorModes,
    version: u32,
    output_name: Option<String>,
}

impl CapabilityRegistry {
    /// Creates a registry advertising the given capabilities at the
    /// current protocol version.
    pub fn new(
        source_types: SourceTypes,
        cursor_modes: CursorModes,
        output_name: Option<String>,
    ) -> Self {
        Self {
            source_types,
            cursor_modes,
            version: CAST_PROTO_VERSION,
            output_name,
        }
    }

    /// Supported capture source kinds.
    pub fn source_types(&self) -> SourceTypes {
        self.source_types
    }

    /// Supported cursor presentation modes.
    pub fn cursor_modes(&self) -> CursorModes {
        self.cursor_modes
    }

    /// Advertised capture protocol version.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Optional restriction to one named output.
    pub fn output_name(&self) -> Option<&str> {
        self.output_name.as_deref()
    }
}
