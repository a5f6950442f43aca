//! Change events and the event bus that carries them to subscribers.
//!
//! Tag-set changes on notes are the one event the core emits outward. The
//! presentation layer subscribes to refresh views that depend on a note's tags.
//! Repositories receive the bus explicitly at construction time.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

// ============================================================================
// Event Envelope
// ============================================================================

/// Versioned, self-describing wrapper around a [`ChangeEvent`].
///
/// ## Wire Format (JSON)
///
/// ```text
/// {"event_id":"...","event_type":"note.tags_changed","occurred_at":"...",
///  "payload_version":1,"payload":{"type":"TagsChanged",...}}
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct EventEnvelope {
    /// Unique event identifier (UUIDv7 for temporal ordering).
    pub event_id: Uuid,
    /// Namespaced event type (e.g., `"note.tags_changed"`).
    pub event_type: String,
    /// When the event occurred (UTC).
    pub occurred_at: DateTime<Utc>,
    /// Payload schema version.
    pub payload_version: u32,
    /// Domain-specific event data.
    pub payload: ChangeEvent,
}

impl EventEnvelope {
    pub fn new(event: ChangeEvent) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            event_type: event.namespaced_event_type().to_string(),
            occurred_at: Utc::now(),
            payload_version: 1,
            payload: event,
        }
    }
}

// ============================================================================
// Change Event (domain payloads)
// ============================================================================

/// What happened to the tag set of the affected notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TagChange {
    /// The tag was attached to the note.
    Associated,
    /// The tag was detached from the note.
    Disassociated,
    /// The tag itself was deleted, detaching it from every listed note.
    TagDeleted,
    /// The listed note was deleted, detaching the tag from it.
    NoteDeleted,
}

/// Domain events emitted by the repositories.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum ChangeEvent {
    /// The tag set of one or more notes changed.
    TagsChanged {
        note_ids: Vec<i64>,
        tag_id: i64,
        change: TagChange,
    },
}

impl ChangeEvent {
    /// Single-note tag change.
    pub fn tags_changed(note_id: i64, tag_id: i64, change: TagChange) -> Self {
        ChangeEvent::TagsChanged {
            note_ids: vec![note_id],
            tag_id,
            change,
        }
    }

    /// Returns the namespaced event type for the envelope.
    pub fn namespaced_event_type(&self) -> &'static str {
        match self {
            ChangeEvent::TagsChanged { .. } => "note.tags_changed",
        }
    }

    /// Notes whose tag set changed.
    pub fn note_ids(&self) -> &[i64] {
        match self {
            ChangeEvent::TagsChanged { note_ids, .. } => note_ids,
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Broadcast-based event bus distributing change events to every subscriber.
///
/// Slow receivers that fall behind get a `Lagged` error and miss events; a
/// subscriber that lags should reload its view from the repository.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<EventEnvelope>,
}

impl EventBus {
    /// Create a new event bus with the given buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Emit an event to all subscribers. Dropped silently when nobody listens.
    pub fn emit(&self, event: ChangeEvent) {
        let envelope = EventEnvelope::new(event);
        let subscriber_count = self.tx.receiver_count();
        tracing::debug!(
            event_type = %envelope.event_type,
            event_id = %envelope.event_id,
            subscriber_count,
            "EventBus emit"
        );
        let _ = self.tx.send(envelope);
    }

    /// Subscribe to receive enveloped events. Each subscriber gets its own independent stream.
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.tx.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(crate::defaults::EVENT_BUS_CAPACITY)
    }
}

// ============================================================================
// Tests
// ============================================================================
