//! Client-side state cache and event-reconciliation engine for a
//! smart-device management API.
//!
//! The crate tracks a fleet of remote devices and structures (locations),
//! each exposing a dynamic set of namespaced traits, and keeps that local
//! state consistent as the server streams partial-update events:
//!
//! - **[`DeviceManager`]** — the authoritative in-memory registry and the
//!   single event-application entry point. Routes resource updates into
//!   the target device, maintains structure↔device relations, and fans
//!   events out to per-device listeners.
//!
//! - **[`EventMessage`]** — one parsed event envelope: either a resource
//!   update (trait deltas + ephemeral capture events) or a relation
//!   update, with id, timestamp, and acting-user metadata.
//!
//! - **[`TraitRegistry`]** — decode table mapping trait-type strings to
//!   typed decoders, with a verbatim pass-through for trait types this
//!   crate doesn't know yet (forward compatibility).
//!
//! - **Entities** ([`model`]) — [`Device`] (traits, parent relations,
//!   listeners) and [`Structure`] (read-only trait bundle).
//!
//! Transport, authentication flows, and the subscription mechanism that
//! produces raw payloads live outside this crate; it is a pure in-memory
//! reducer over a serialized stream of update messages.
//!
//! [`Device`]: model::Device
//! [`Structure`]: model::Structure
//! [`EventMessage`]: model::EventMessage

pub mod auth;
pub mod error;
pub mod manager;
pub mod model;
pub mod registry;

// ── Primary re-exports ──────────────────────────────────────────────
pub use auth::{Authenticator, StaticToken};
pub use error::{CallbackError, DecodeError, ParseError};
pub use manager::DeviceManager;
pub use registry::{TraitDecoder, TraitRegistry};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    Device, EventCallback, EventMessage, ListenerToken, RelationKind, RelationUpdate,
    ResourceEvent, ResourceUpdate, Structure, Trait,
};
