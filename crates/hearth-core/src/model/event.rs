// ── Event model ──
//
// One `EventMessage` is an immutable parse of a single envelope from the
// subscription stream. The envelope carries exactly one of two branches:
// a resource update (trait deltas and/or ephemeral capture events for a
// named resource) or a relation update (a structure↔device edge change).
// Envelopes with both or neither branch are tolerated; both accessors
// simply read as absent and the caller decides what that means.

use chrono::{DateTime, TimeDelta, Utc};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use strum::Display;
use tracing::debug;

use crate::error::ParseError;

/// Validity window of an ephemeral capture event, from its envelope
/// timestamp. Advisory only -- the engine computes it, consumers enforce it.
const CAPTURE_EVENT_TTL_SECS: i64 = 30;

// ── Relation updates ────────────────────────────────────────────────

/// Direction of a relation change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationKind {
    Created,
    Deleted,
}

/// An edge created or deleted between two named resources.
///
/// `subject` is the structure side, `object` the device side.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationUpdate {
    #[serde(rename = "type")]
    pub kind: RelationKind,
    pub subject: String,
    pub object: String,
}

// ── Resource updates ────────────────────────────────────────────────

/// An ephemeral capture notification (motion, sound, chime, ...) inside
/// a resource update.
///
/// Carries its own event id and session id; the timestamp is inherited
/// from the envelope and `expires_at` is `timestamp + 30s`. Consumers
/// use `expires_at` to discard stale notifications -- nothing in this
/// crate runs a timer against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceEvent {
    pub event_id: String,
    pub event_session_id: String,
    pub timestamp: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Trait deltas and capture events for one named resource.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceUpdate {
    /// Resource name of the target device.
    pub name: String,
    /// Raw trait payloads, keyed by trait-type string. Decoded against
    /// the [`TraitRegistry`](crate::TraitRegistry) when applied.
    pub traits: IndexMap<String, Value>,
    /// Capture events, keyed by event-type string.
    pub events: IndexMap<String, ResourceEvent>,
}

// ── Envelope ────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEnvelope {
    event_id: Option<String>,
    timestamp: Option<String>,
    user_id: Option<String>,
    resource_update: Option<RawResourceUpdate>,
    relation_update: Option<RelationUpdate>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawResourceUpdate {
    name: String,
    #[serde(default)]
    traits: IndexMap<String, Value>,
    #[serde(default)]
    events: IndexMap<String, RawResourceEvent>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawResourceEvent {
    event_id: String,
    event_session_id: String,
}

/// One parsed event envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct EventMessage {
    event_id: String,
    timestamp: DateTime<Utc>,
    user_id: Option<String>,
    resource_update: Option<ResourceUpdate>,
    relation_update: Option<RelationUpdate>,
}

impl EventMessage {
    /// Parse a raw envelope.
    ///
    /// Fails with [`ParseError`] when `eventId` or `timestamp` is
    /// missing, or the timestamp is not a valid RFC 3339 instant. An
    /// envelope carrying both update branches (or neither) parses fine;
    /// a both-branch envelope exposes *neither* branch, since the wire
    /// contract promises exactly one and we can't tell which to trust.
    pub fn parse(raw: Value) -> Result<Self, ParseError> {
        let envelope: RawEnvelope = serde_json::from_value(raw)?;

        let event_id = envelope
            .event_id
            .ok_or(ParseError::MissingField("eventId"))?;
        let value = envelope
            .timestamp
            .ok_or(ParseError::MissingField("timestamp"))?;
        let timestamp = DateTime::parse_from_rfc3339(&value)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|source| ParseError::Timestamp { value, source })?;

        let (resource_update, relation_update) =
            match (envelope.resource_update, envelope.relation_update) {
                (Some(_), Some(_)) => {
                    debug!(%event_id, "envelope carries both update branches; exposing neither");
                    (None, None)
                }
                (resource, relation) => (resource, relation),
            };

        let resource_update = resource_update.map(|raw| ResourceUpdate {
            name: raw.name,
            traits: raw.traits,
            events: raw
                .events
                .into_iter()
                .map(|(event_type, e)| {
                    (
                        event_type,
                        ResourceEvent {
                            event_id: e.event_id,
                            event_session_id: e.event_session_id,
                            timestamp,
                            expires_at: timestamp + TimeDelta::seconds(CAPTURE_EVENT_TTL_SECS),
                        },
                    )
                })
                .collect(),
        });

        Ok(Self {
            event_id,
            timestamp,
            user_id: envelope.user_id,
            resource_update,
            relation_update,
        })
    }

    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// The resource-update branch, if this envelope carries one.
    pub fn resource_update(&self) -> Option<&ResourceUpdate> {
        self.resource_update.as_ref()
    }

    /// Target resource name of the resource-update branch.
    pub fn resource_update_name(&self) -> Option<&str> {
        self.resource_update.as_ref().map(|u| u.name.as_str())
    }

    /// Raw trait deltas of the resource-update branch.
    pub fn resource_update_traits(&self) -> Option<&IndexMap<String, Value>> {
        self.resource_update.as_ref().map(|u| &u.traits)
    }

    /// Decoded capture events of the resource-update branch.
    pub fn resource_update_events(&self) -> Option<&IndexMap<String, ResourceEvent>> {
        self.resource_update.as_ref().map(|u| &u.events)
    }

    /// The relation-update branch, if this envelope carries one.
    pub fn relation_update(&self) -> Option<&RelationUpdate> {
        self.relation_update.as_ref()
    }
}
