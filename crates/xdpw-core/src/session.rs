//! Session registry storage.
//!
//! Sessions are opaque to the daemon core: entries are created and
//! destroyed entirely by the screencast subsystem, the core only allocates
//! the collection empty at startup and owns its storage for the process
//! lifetime.

use crate::capability::{CursorModes, SourceTypes};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier a client chose for one capture session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Creates a session ID from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One ongoing capture session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Client-chosen handle for the session.
    pub id: SessionId,

    /// Source kinds the client asked to capture.
    pub source_types: SourceTypes,

    /// Cursor presentation the client asked for.
    pub cursor_modes: CursorModes,
}

/// Ordered collection of capture sessions.
///
/// Insertion order is preserved; the daemon core never iterates the
/// collection itself.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Vec<Session>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a session. Returns false if the ID is already present.
    pub fn insert(&mut self, session: Session) -> bool {
        if self.contains(&session.id) {
            return false;
        }
        self.sessions.push(session);
        true
    }

    /// Removes and returns the session with the given ID.
    pub fn remove(&mut self, id: &SessionId) -> Option<Session> {
        let pos = self.sessions.iter().position(|s| &s.id == id)?;
        Some(self.sessions.remove(pos))
    }

    /// Returns a reference to the session with the given ID.
    pub fn get(&self, id: &SessionId) -> Option<&Session> {
        self.sessions.iter().find(|s| &s.id == id)
    }

    /// Returns true if a session with the given ID exists.
    pub fn contains(&self, id: &SessionId) -> bool {
        self.get(id).is_some()
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns true if no sessions exist.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
