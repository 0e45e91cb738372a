// ── Device manager ──
//
// The top-level registry and the single event-application entry point.
// A synchronous, single-writer reducer: `handle_event` is the only
// mutator and takes `&mut self`, so exclusive access is expressed in the
// type system rather than through internal locking. Callers feeding
// events from multiple sources serialize them outside (one dispatch
// queue, or a mutex around the manager).

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::model::event::{EventMessage, RelationKind, RelationUpdate};
use crate::model::{Device, Structure};
use crate::registry::TraitRegistry;

/// In-memory registry of devices and structures, reconciled against the
/// event stream.
///
/// Both registries are keyed by unique resource name and iterate in
/// insertion order.
pub struct DeviceManager {
    registry: TraitRegistry,
    devices: IndexMap<String, Device>,
    structures: IndexMap<String, Structure>,
}

impl DeviceManager {
    /// A manager with every built-in trait decoder registered.
    pub fn new() -> Self {
        Self::with_registry(TraitRegistry::default())
    }

    /// A manager with a caller-composed decoder table.
    pub fn with_registry(registry: TraitRegistry) -> Self {
        Self {
            registry,
            devices: IndexMap::new(),
            structures: IndexMap::new(),
        }
    }

    /// The decode table used for trait deltas (and handy for building
    /// entities destined for this manager).
    pub fn registry(&self) -> &TraitRegistry {
        &self.registry
    }

    /// Register a device. First registration wins: re-adding a name that
    /// is already present is a no-op and the original instance (with its
    /// listeners and accumulated state) is preserved.
    pub fn add_device(&mut self, device: Device) {
        if self.devices.contains_key(device.name()) {
            debug!(device = device.name(), "duplicate device registration ignored");
            return;
        }
        self.devices.insert(device.name().to_owned(), device);
    }

    /// Register a structure. Same first-registration-wins contract as
    /// [`add_device`](Self::add_device).
    pub fn add_structure(&mut self, structure: Structure) {
        if self.structures.contains_key(structure.name()) {
            debug!(
                structure = structure.name(),
                "duplicate structure registration ignored"
            );
            return;
        }
        self.structures
            .insert(structure.name().to_owned(), structure);
    }

    /// All registered devices, keyed by resource name, insertion-ordered.
    pub fn devices(&self) -> &IndexMap<String, Device> {
        &self.devices
    }

    /// All registered structures, keyed by resource name, insertion-ordered.
    pub fn structures(&self) -> &IndexMap<String, Structure> {
        &self.structures
    }

    pub fn device(&self, name: &str) -> Option<&Device> {
        self.devices.get(name)
    }

    /// Mutable device access, e.g. for listener registration.
    pub fn device_mut(&mut self, name: &str) -> Option<&mut Device> {
        self.devices.get_mut(name)
    }

    pub fn structure(&self, name: &str) -> Option<&Structure> {
        self.structures.get(name)
    }

    /// Apply one event to the registry.
    ///
    /// Resource updates merge trait deltas into the target device and
    /// then notify its listeners with the originating event. Relation
    /// updates mutate the device's parent-relation map. Events naming a
    /// device not (yet) registered are dropped silently -- subscription
    /// delivery can race entity registration, so this is not an error.
    /// Envelope-only events are a no-op.
    pub fn handle_event(&mut self, event: &EventMessage) {
        if let Some(update) = event.resource_update() {
            let Some(device) = self.devices.get_mut(&update.name) else {
                debug!(
                    resource = %update.name,
                    event_id = event.event_id(),
                    "resource update for unknown device dropped"
                );
                return;
            };
            device.apply_resource_update(update, &self.registry);
            device.notify(event);
            return;
        }

        if let Some(relation) = event.relation_update() {
            self.apply_relation(relation, event);
            return;
        }

        trace!(event_id = event.event_id(), "envelope-only event, nothing to apply");
    }

    /// Relation-edge lifecycle per device:
    /// absent --Created--> present(label) --Created--> present(new label)
    /// --Deleted--> absent. Deleting an absent edge is a legal no-op.
    fn apply_relation(&mut self, relation: &RelationUpdate, event: &EventMessage) {
        // Resolve the label before borrowing the device mutably. The
        // label is the subject structure's current custom name; an
        // unregistered subject still creates the edge, unlabeled.
        let label = match relation.kind {
            RelationKind::Created => self
                .structures
                .get(&relation.subject)
                .and_then(Structure::custom_name)
                .map(str::to_owned),
            RelationKind::Deleted => None,
        };

        let Some(device) = self.devices.get_mut(&relation.object) else {
            debug!(
                object = %relation.object,
                event_id = event.event_id(),
                "relation update for unknown device dropped"
            );
            return;
        };

        match relation.kind {
            RelationKind::Created => device.set_parent_relation(relation.subject.clone(), label),
            RelationKind::Deleted => device.remove_parent_relation(&relation.subject),
        }
    }
}

impl Default for DeviceManager {
    fn default() -> Self {
        Self::new()
    }
}
