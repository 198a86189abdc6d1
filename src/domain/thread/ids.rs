//! Opaque identifiers issued by the remote assistant service.
//!
//! Unlike locally minted ids these are never parsed or generated here; the
//! relay only carries them between the caller and the remote API.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a remote conversation thread.
///
/// Owned by the caller across turns. The relay trusts whatever id it is given.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThreadId(String);

impl ThreadId {
    /// Wraps a remote thread id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Wraps a caller-supplied id, treating empty or blank input as absent.
    pub fn from_optional(id: Option<String>) -> Option<Self> {
        id.filter(|s| !s.trim().is_empty()).map(Self)
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the id, returning the inner string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of one run against a thread.
///
/// Only valid for the thread it was created on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    /// Wraps a remote run id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of the preconfigured assistant persona that executes runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssistantId(String);

impl AssistantId {
    /// Wraps an assistant id from configuration.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssistantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
