// ── Core error types ──
//
// Two failure domains, kept separate on purpose: `ParseError` rejects a
// whole envelope or entity descriptor before any state is touched, while
// `DecodeError` is scoped to a single trait entry inside an otherwise
// valid payload. Everything else the engine encounters (unknown resource
// names, duplicate registrations, deletes of absent edges) is a logged
// no-op, not an error.

use thiserror::Error;

/// Error produced by a failing event listener.
///
/// Listener failures are isolated inside [`Device::notify`]: they are
/// logged and the remaining listeners still run.
///
/// [`Device::notify`]: crate::model::Device::notify
pub type CallbackError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure to parse an event envelope or entity descriptor.
///
/// A `ParseError` is fatal for that single payload: nothing from it
/// reaches the manager, so state is never left partially applied.
#[derive(Debug, Error)]
pub enum ParseError {
    /// A required envelope or descriptor field is absent.
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    /// The `timestamp` field is present but not a valid RFC 3339 instant.
    #[error("invalid timestamp {value:?}")]
    Timestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    /// The payload is not structurally valid JSON for its expected shape.
    #[error("malformed payload")]
    Malformed(#[from] serde_json::Error),

    /// A trait inside an entity descriptor failed to decode.
    ///
    /// Descriptors are strict: an entity is either fully constructed or
    /// not at all. (Resource updates are lenient instead — see
    /// [`Device::apply_resource_update`].)
    ///
    /// [`Device::apply_resource_update`]: crate::model::Device::apply_resource_update
    #[error(transparent)]
    Trait(#[from] DecodeError),
}

/// Failure to decode the payload of a *known* trait type.
///
/// Unknown trait types never produce this error; they degrade to
/// [`Trait::Unknown`](crate::model::Trait::Unknown) instead.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The payload does not match the trait's declared fields.
    #[error("invalid payload for trait `{trait_type}`: {source}")]
    Payload {
        trait_type: String,
        #[source]
        source: serde_json::Error,
    },

    /// A field decoded structurally but failed semantic validation.
    #[error("trait `{trait_type}` field `{field}`: {reason}")]
    Field {
        trait_type: String,
        field: &'static str,
        reason: String,
    },
}
