// ── Device entity ──
//
// A device owns its decoded trait map, its parent-structure relations
// (denormalized as name -> cached display label), and the listeners
// interested in its events. Created once from a raw descriptor and then
// mutated in place by the manager for every matching event.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::auth::Authenticator;
use crate::error::{CallbackError, ParseError};
use crate::model::event::{EventMessage, ResourceUpdate};
use crate::model::traits::{ConnectivityTrait, InfoTrait, Trait};
use crate::registry::TraitRegistry;

/// A per-device event listener.
///
/// Invoked synchronously on the event-processing thread, so it should
/// return quickly. Returning `Err` is logged and isolated; it never
/// affects other listeners or subsequent events. Panics are not caught.
pub trait EventCallback: Send + Sync {
    fn handle_event(&self, event: &EventMessage) -> Result<(), CallbackError>;
}

impl<F> EventCallback for F
where
    F: Fn(&EventMessage) -> Result<(), CallbackError> + Send + Sync,
{
    fn handle_event(&self, event: &EventMessage) -> Result<(), CallbackError> {
        self(event)
    }
}

/// Opaque handle identifying one registered listener.
///
/// Returned by [`Device::add_event_callback`]; pass it to
/// [`Device::remove_listener`] to unregister. Tokens are never reused
/// within a device's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerToken(u64);

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDescriptor {
    name: Option<String>,
    #[serde(rename = "type")]
    device_type: Option<String>,
    #[serde(default)]
    traits: IndexMap<String, Value>,
    #[serde(default)]
    parent_relations: Vec<RawParentRelation>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawParentRelation {
    parent: String,
    display_name: Option<String>,
}

/// One managed device.
pub struct Device {
    name: String,
    device_type: String,
    traits: IndexMap<String, Trait>,
    /// Parent structure name -> display label cached at edge creation.
    parent_relations: IndexMap<String, Option<String>>,
    listeners: Vec<(ListenerToken, Arc<dyn EventCallback>)>,
    next_token: u64,
    auth: Option<Arc<dyn Authenticator>>,
}

impl Device {
    /// Build a device from a raw API descriptor.
    ///
    /// Descriptors are strict: a missing `name`/`type` or a malformed
    /// known-trait payload rejects the whole descriptor. `auth` is the
    /// opaque credential capability threaded through for the (external)
    /// command layer; the engine never calls into it.
    pub fn from_descriptor(
        raw: Value,
        registry: &TraitRegistry,
        auth: Option<Arc<dyn Authenticator>>,
    ) -> Result<Self, ParseError> {
        let descriptor: RawDescriptor = serde_json::from_value(raw)?;
        let name = descriptor.name.ok_or(ParseError::MissingField("name"))?;
        let device_type = descriptor
            .device_type
            .ok_or(ParseError::MissingField("type"))?;

        let mut traits = IndexMap::with_capacity(descriptor.traits.len());
        for (trait_type, raw) in &descriptor.traits {
            traits.insert(trait_type.clone(), registry.decode(trait_type, raw)?);
        }

        let parent_relations = descriptor
            .parent_relations
            .into_iter()
            .map(|r| (r.parent, r.display_name))
            .collect();

        Ok(Self {
            name,
            device_type,
            traits,
            parent_relations,
            listeners: Vec::new(),
            next_token: 0,
            auth,
        })
    }

    /// Globally unique resource name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn device_type(&self) -> &str {
        &self.device_type
    }

    /// All decoded traits, keyed by trait-type string, insertion-ordered.
    pub fn traits(&self) -> &IndexMap<String, Trait> {
        &self.traits
    }

    pub fn get_trait(&self, trait_type: &str) -> Option<&Trait> {
        self.traits.get(trait_type)
    }

    /// Typed shortcut for the connectivity trait.
    pub fn connectivity(&self) -> Option<&ConnectivityTrait> {
        match self.traits.get(ConnectivityTrait::NAME) {
            Some(Trait::Connectivity(t)) => Some(t),
            _ => None,
        }
    }

    /// User-assigned display name, from the device info trait.
    pub fn custom_name(&self) -> Option<&str> {
        match self.traits.get(InfoTrait::NAME) {
            Some(Trait::Info(info)) => info.custom_name.as_deref(),
            _ => None,
        }
    }

    /// Parent structure name -> cached display label.
    pub fn parent_relations(&self) -> &IndexMap<String, Option<String>> {
        &self.parent_relations
    }

    /// The opaque credential capability attached at creation, if any.
    pub fn authenticator(&self) -> Option<&Arc<dyn Authenticator>> {
        self.auth.as_ref()
    }

    /// Register a listener for events targeting this device.
    ///
    /// Listeners run in registration order. The returned token
    /// unregisters exactly this listener via [`remove_listener`].
    ///
    /// [`remove_listener`]: Self::remove_listener
    pub fn add_event_callback(&mut self, callback: Arc<dyn EventCallback>) -> ListenerToken {
        let token = ListenerToken(self.next_token);
        self.next_token += 1;
        self.listeners.push((token, callback));
        token
    }

    /// Unregister a listener. Removing an already-removed token is a no-op.
    pub fn remove_listener(&mut self, token: ListenerToken) {
        self.listeners.retain(|(t, _)| *t != token);
    }

    /// Merge a resource update's trait deltas into this device.
    ///
    /// Each entry replaces the stored trait of the same type wholesale;
    /// trait types absent from the update are untouched. Application is
    /// lenient: a malformed known-trait entry is skipped with a warning
    /// and the remaining entries still apply, so a single bad delta never
    /// blocks the rest of the update. Capture events are decoded at parse
    /// time and forwarded to listeners only -- they are never stored here.
    pub fn apply_resource_update(&mut self, update: &ResourceUpdate, registry: &TraitRegistry) {
        for (trait_type, raw) in &update.traits {
            match registry.decode(trait_type, raw) {
                Ok(decoded) => {
                    self.traits.insert(trait_type.clone(), decoded);
                }
                Err(error) => {
                    warn!(device = %self.name, %trait_type, %error, "skipping malformed trait delta");
                }
            }
        }
    }

    /// Fan the event out to every registered listener, in registration
    /// order, synchronously.
    ///
    /// Dispatch runs over a snapshot of the listener list taken at entry,
    /// so registration changes made by a listener take effect from the
    /// next event onward. Listener failures are logged and isolated.
    pub fn notify(&self, event: &EventMessage) {
        let snapshot: Vec<(ListenerToken, Arc<dyn EventCallback>)> = self.listeners.clone();
        for (token, listener) in snapshot {
            if let Err(error) = listener.handle_event(event) {
                warn!(
                    device = %self.name,
                    listener = token.0,
                    error = %error,
                    "event listener failed; continuing with remaining listeners"
                );
            }
        }
    }

    pub(crate) fn set_parent_relation(&mut self, subject: String, label: Option<String>) {
        self.parent_relations.insert(subject, label);
    }

    pub(crate) fn remove_parent_relation(&mut self, subject: &str) {
        self.parent_relations.shift_remove(subject);
    }
}

impl fmt::Debug for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device")
            .field("name", &self.name)
            .field("device_type", &self.device_type)
            .field("traits", &self.traits)
            .field("parent_relations", &self.parent_relations)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::traits::ConnectivityStatus;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn registry() -> TraitRegistry {
        TraitRegistry::default()
    }

    fn device(raw: Value) -> Device {
        Device::from_descriptor(raw, &registry(), None).unwrap()
    }

    fn event(raw: Value) -> EventMessage {
        EventMessage::parse(raw).unwrap()
    }

    #[test]
    fn descriptor_without_name_is_rejected() {
        let err = Device::from_descriptor(
            json!({"type": "sdm.devices.types.THERMOSTAT"}),
            &registry(),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, ParseError::MissingField("name")));
    }

    #[test]
    fn descriptor_with_malformed_trait_is_rejected() {
        let err = Device::from_descriptor(
            json!({
                "name": "my/device/name1",
                "type": "sdm.devices.types.THERMOSTAT",
                "traits": {
                    "sdm.devices.traits.Connectivity": {"status": "DANCING"},
                },
            }),
            &registry(),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, ParseError::Trait(_)));
    }

    #[test]
    fn descriptor_parent_relations_are_cached() {
        let device = device(json!({
            "name": "my/device/name1",
            "type": "sdm.devices.types.CAMERA",
            "parentRelations": [
                {"parent": "my/structure/a", "displayName": "Living Room"},
            ],
        }));
        assert_eq!(
            device.parent_relations().get("my/structure/a"),
            Some(&Some("Living Room".to_owned()))
        );
    }

    #[test]
    fn update_replaces_trait_wholesale_and_leaves_others() {
        let mut device = device(json!({
            "name": "my/device/name1",
            "type": "sdm.devices.types.THERMOSTAT",
            "traits": {
                "sdm.devices.traits.Connectivity": {"status": "OFFLINE"},
                "sdm.devices.traits.Humidity": {"ambientHumidityPercent": 35.0},
            },
        }));
        let reg = registry();

        let msg = event(json!({
            "eventId": "e1",
            "timestamp": "2019-01-01T00:00:01Z",
            "resourceUpdate": {
                "name": "my/device/name1",
                "traits": {
                    "sdm.devices.traits.Connectivity": {"status": "ONLINE"},
                },
            },
        }));
        device.apply_resource_update(msg.resource_update().unwrap(), &reg);

        assert_eq!(
            device.connectivity().unwrap().status,
            ConnectivityStatus::Online
        );
        // Unrelated trait untouched.
        assert!(device.get_trait("sdm.devices.traits.Humidity").is_some());
    }

    #[test]
    fn malformed_delta_is_skipped_and_rest_applies() {
        let mut device = device(json!({
            "name": "my/device/name1",
            "type": "sdm.devices.types.THERMOSTAT",
            "traits": {
                "sdm.devices.traits.Connectivity": {"status": "OFFLINE"},
            },
        }));
        let reg = registry();

        let msg = event(json!({
            "eventId": "e1",
            "timestamp": "2019-01-01T00:00:01Z",
            "resourceUpdate": {
                "name": "my/device/name1",
                "traits": {
                    "sdm.devices.traits.Humidity": {"ambientHumidityPercent": 900.0},
                    "sdm.devices.traits.Connectivity": {"status": "ONLINE"},
                },
            },
        }));
        device.apply_resource_update(msg.resource_update().unwrap(), &reg);

        // Bad humidity skipped, good connectivity applied.
        assert!(device.get_trait("sdm.devices.traits.Humidity").is_none());
        assert_eq!(
            device.connectivity().unwrap().status,
            ConnectivityStatus::Online
        );
    }

    #[test]
    fn listeners_run_in_registration_order_and_failures_are_isolated() {
        let mut device = device(json!({
            "name": "my/device/name1",
            "type": "sdm.devices.types.CAMERA",
        }));

        let calls = Arc::new(AtomicUsize::new(0));

        let first = Arc::clone(&calls);
        device.add_event_callback(Arc::new(move |_: &EventMessage| {
            first.fetch_add(1, Ordering::SeqCst);
            Err::<(), CallbackError>("listener blew up".into())
        }));

        let second = Arc::clone(&calls);
        device.add_event_callback(Arc::new(move |_: &EventMessage| {
            second.fetch_add(1, Ordering::SeqCst);
            Ok::<(), CallbackError>(())
        }));

        let msg = event(json!({
            "eventId": "e1",
            "timestamp": "2019-01-01T00:00:01Z",
        }));
        device.notify(&msg);

        // Both ran despite the first one failing.
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn remove_listener_is_idempotent() {
        let mut device = device(json!({
            "name": "my/device/name1",
            "type": "sdm.devices.types.CAMERA",
        }));

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let token = device.add_event_callback(Arc::new(move |_: &EventMessage| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<(), CallbackError>(())
        }));

        device.remove_listener(token);
        device.remove_listener(token);

        let msg = event(json!({
            "eventId": "e1",
            "timestamp": "2019-01-01T00:00:01Z",
        }));
        device.notify(&msg);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
