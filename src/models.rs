//! Core data types shared across the gateway, ingestion, and sidebar modules.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user-supplied document tracked by the sidebar.
///
/// Created once per file during an ingestion batch and appended in input
/// order. `content` holds the extracted/decoded text, or a placeholder
/// string when extraction failed. Records live only for the session and are
/// removed solely by explicit user action keyed on `id`.
#[derive(Debug, Clone, Serialize)]
pub struct SourceRecord {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    pub content: String,
}

/// A named knowledge partition reported by the backend.
///
/// Replaced wholesale on every registry reload; the backend is the source
/// of truth, so `is_current` may be stale relative to client-side selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexDescriptor {
    pub name: String,
    pub document_count: u64,
    pub is_current: bool,
}

/// One chat-completion-shaped message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Source of record identifiers, injected into the ingestion pipeline so
/// tests can substitute a deterministic sequence.
pub trait IdSource: Send + Sync {
    /// Returns a fresh identifier, never repeated within a process.
    fn next_id(&self) -> String;
}

/// Default identifier source backed by UUIDv4.
pub struct UuidIds;

impl IdSource for UuidIds {
    fn next_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Deterministic identifier source for tests: `id-0`, `id-1`, ...
pub struct SequentialIds {
    counter: std::sync::atomic::AtomicU64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self {
            counter: std::sync::atomic::AtomicU64::new(0),
        }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new()
    }
}

impl IdSource for SequentialIds {
    fn next_id(&self) -> String {
        let n = self
            .counter
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        format!("id-{}", n)
    }
}
