// ── Domain model ──
//
// Entity and event types for the reconciliation engine: devices and
// structures with their decoded trait maps, plus the parsed event
// envelope that drives every mutation.

pub mod device;
pub mod event;
pub mod structure;
pub mod traits;

// ── Re-exports ──────────────────────────────────────────────────────

pub use device::{Device, EventCallback, ListenerToken};
pub use event::{EventMessage, RelationKind, RelationUpdate, ResourceEvent, ResourceUpdate};
pub use structure::Structure;
pub use traits::{
    ConnectivityStatus, ConnectivityTrait, FanTimerMode, FanTrait, HumidityTrait, HvacStatus,
    InfoTrait, RoomInfoTrait, SettingsTrait, StructureInfoTrait, TemperatureScale,
    TemperatureTrait, ThermostatHvacTrait, ThermostatMode, ThermostatModeTrait,
    ThermostatTemperatureSetpointTrait, Trait, UnknownTrait,
};
