// ── Trait domain types ──
//
// A trait is an immutable, named bundle of capability state on a device
// or structure. Known trait types decode into typed structs with field
// validation; anything the server sends that we don't recognize degrades
// to `Trait::Unknown`, which keeps the raw payload verbatim. Traits are
// replaced wholesale per trait-type on update, never field-merged.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

use crate::error::DecodeError;

/// One decoded trait instance, tagged by kind.
///
/// Each variant corresponds to a known trait-type string (see the
/// associated `NAME` consts); [`Unknown`](Self::Unknown) is the
/// forward-compatibility catch-all for server-side trait definitions
/// this crate predates.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Trait {
    Connectivity(ConnectivityTrait),
    Info(InfoTrait),
    Fan(FanTrait),
    Humidity(HumidityTrait),
    Temperature(TemperatureTrait),
    ThermostatHvac(ThermostatHvacTrait),
    ThermostatMode(ThermostatModeTrait),
    ThermostatTemperatureSetpoint(ThermostatTemperatureSetpointTrait),
    Settings(SettingsTrait),
    StructureInfo(StructureInfoTrait),
    RoomInfo(RoomInfoTrait),
    Unknown(UnknownTrait),
}

impl Trait {
    /// The namespaced trait-type string this instance was decoded from.
    pub fn trait_type(&self) -> &str {
        match self {
            Self::Connectivity(_) => ConnectivityTrait::NAME,
            Self::Info(_) => InfoTrait::NAME,
            Self::Fan(_) => FanTrait::NAME,
            Self::Humidity(_) => HumidityTrait::NAME,
            Self::Temperature(_) => TemperatureTrait::NAME,
            Self::ThermostatHvac(_) => ThermostatHvacTrait::NAME,
            Self::ThermostatMode(_) => ThermostatModeTrait::NAME,
            Self::ThermostatTemperatureSetpoint(_) => ThermostatTemperatureSetpointTrait::NAME,
            Self::Settings(_) => SettingsTrait::NAME,
            Self::StructureInfo(_) => StructureInfoTrait::NAME,
            Self::RoomInfo(_) => RoomInfoTrait::NAME,
            Self::Unknown(t) => &t.trait_type,
        }
    }
}

/// Decode helper: deserialize `raw` into the typed trait struct,
/// attributing failures to `trait_type`.
fn decode_fields<T: DeserializeOwned>(
    trait_type: &'static str,
    raw: &Value,
) -> Result<T, DecodeError> {
    serde_json::from_value(raw.clone()).map_err(|source| DecodeError::Payload {
        trait_type: trait_type.to_owned(),
        source,
    })
}

// ── Device traits ───────────────────────────────────────────────────

/// Device network connectivity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectivityTrait {
    pub status: ConnectivityStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectivityStatus {
    Online,
    Offline,
}

impl ConnectivityTrait {
    pub const NAME: &'static str = "sdm.devices.traits.Connectivity";

    pub(crate) fn decode(raw: &Value) -> Result<Trait, DecodeError> {
        Ok(Trait::Connectivity(decode_fields(Self::NAME, raw)?))
    }
}

/// Device metadata (user-assigned name).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoTrait {
    pub custom_name: Option<String>,
}

impl InfoTrait {
    pub const NAME: &'static str = "sdm.devices.traits.Info";

    pub(crate) fn decode(raw: &Value) -> Result<Trait, DecodeError> {
        Ok(Trait::Info(decode_fields(Self::NAME, raw)?))
    }
}

/// Fan timer state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FanTrait {
    pub timer_mode: Option<FanTimerMode>,
    pub timer_timeout: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum FanTimerMode {
    On,
    Off,
}

impl FanTrait {
    pub const NAME: &'static str = "sdm.devices.traits.Fan";

    pub(crate) fn decode(raw: &Value) -> Result<Trait, DecodeError> {
        Ok(Trait::Fan(decode_fields(Self::NAME, raw)?))
    }
}

/// Ambient relative humidity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HumidityTrait {
    pub ambient_humidity_percent: f64,
}

impl HumidityTrait {
    pub const NAME: &'static str = "sdm.devices.traits.Humidity";

    pub(crate) fn decode(raw: &Value) -> Result<Trait, DecodeError> {
        let humidity: Self = decode_fields(Self::NAME, raw)?;
        let pct = humidity.ambient_humidity_percent;
        if !(0.0..=100.0).contains(&pct) {
            return Err(DecodeError::Field {
                trait_type: Self::NAME.to_owned(),
                field: "ambientHumidityPercent",
                reason: format!("{pct} outside 0..=100"),
            });
        }
        Ok(Trait::Humidity(humidity))
    }
}

/// Ambient temperature reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemperatureTrait {
    pub ambient_temperature_celsius: f64,
}

impl TemperatureTrait {
    pub const NAME: &'static str = "sdm.devices.traits.Temperature";

    pub(crate) fn decode(raw: &Value) -> Result<Trait, DecodeError> {
        Ok(Trait::Temperature(decode_fields(Self::NAME, raw)?))
    }
}

/// Current HVAC activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThermostatHvacTrait {
    pub status: HvacStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum HvacStatus {
    Off,
    Heating,
    Cooling,
}

impl ThermostatHvacTrait {
    pub const NAME: &'static str = "sdm.devices.traits.ThermostatHvac";

    pub(crate) fn decode(raw: &Value) -> Result<Trait, DecodeError> {
        Ok(Trait::ThermostatHvac(decode_fields(Self::NAME, raw)?))
    }
}

/// Thermostat operating mode and the modes the device supports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThermostatModeTrait {
    pub mode: ThermostatMode,
    #[serde(default)]
    pub available_modes: Vec<ThermostatMode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ThermostatMode {
    Heat,
    Cool,
    // Wire form has no separator.
    #[serde(rename = "HEATCOOL")]
    #[strum(serialize = "HEATCOOL")]
    HeatCool,
    Off,
}

impl ThermostatModeTrait {
    pub const NAME: &'static str = "sdm.devices.traits.ThermostatMode";

    pub(crate) fn decode(raw: &Value) -> Result<Trait, DecodeError> {
        Ok(Trait::ThermostatMode(decode_fields(Self::NAME, raw)?))
    }
}

/// Target temperature setpoints; which fields are present depends on the
/// active thermostat mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThermostatTemperatureSetpointTrait {
    pub heat_celsius: Option<f64>,
    pub cool_celsius: Option<f64>,
}

impl ThermostatTemperatureSetpointTrait {
    pub const NAME: &'static str = "sdm.devices.traits.ThermostatTemperatureSetpoint";

    pub(crate) fn decode(raw: &Value) -> Result<Trait, DecodeError> {
        Ok(Trait::ThermostatTemperatureSetpoint(decode_fields(
            Self::NAME,
            raw,
        )?))
    }
}

/// Device-level display settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsTrait {
    pub temperature_scale: TemperatureScale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TemperatureScale {
    Celsius,
    Fahrenheit,
}

impl SettingsTrait {
    pub const NAME: &'static str = "sdm.devices.traits.Settings";

    pub(crate) fn decode(raw: &Value) -> Result<Trait, DecodeError> {
        Ok(Trait::Settings(decode_fields(Self::NAME, raw)?))
    }
}

// ── Structure traits ────────────────────────────────────────────────

/// Structure metadata (user-assigned name).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureInfoTrait {
    pub custom_name: Option<String>,
}

impl StructureInfoTrait {
    pub const NAME: &'static str = "sdm.structures.traits.Info";

    pub(crate) fn decode(raw: &Value) -> Result<Trait, DecodeError> {
        Ok(Trait::StructureInfo(decode_fields(Self::NAME, raw)?))
    }
}

/// Room metadata within a structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomInfoTrait {
    pub custom_name: Option<String>,
}

impl RoomInfoTrait {
    pub const NAME: &'static str = "sdm.structures.traits.RoomInfo";

    pub(crate) fn decode(raw: &Value) -> Result<Trait, DecodeError> {
        Ok(Trait::RoomInfo(decode_fields(Self::NAME, raw)?))
    }
}

// ── Unknown fallback ────────────────────────────────────────────────

/// Verbatim pass-through for unrecognized trait types.
///
/// Decoding an unknown type never fails; the raw fields are preserved
/// so consumers can still inspect them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnknownTrait {
    pub trait_type: String,
    pub fields: Value,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn connectivity_decodes_enumerated_status() {
        let decoded = ConnectivityTrait::decode(&json!({"status": "OFFLINE"})).unwrap();
        assert_eq!(
            decoded,
            Trait::Connectivity(ConnectivityTrait {
                status: ConnectivityStatus::Offline
            })
        );
        assert_eq!(decoded.trait_type(), "sdm.devices.traits.Connectivity");
    }

    #[test]
    fn connectivity_rejects_unknown_status() {
        let err = ConnectivityTrait::decode(&json!({"status": "SLEEPING"})).unwrap_err();
        assert!(err.to_string().contains("sdm.devices.traits.Connectivity"));
    }

    #[test]
    fn humidity_rejects_out_of_range_percent() {
        let err =
            HumidityTrait::decode(&json!({"ambientHumidityPercent": 140.0})).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("ambientHumidityPercent"), "{msg}");
    }

    #[test]
    fn thermostat_mode_uses_wire_spelling() {
        let decoded = ThermostatModeTrait::decode(&json!({
            "mode": "HEATCOOL",
            "availableModes": ["HEAT", "COOL", "HEATCOOL", "OFF"],
        }))
        .unwrap();
        let Trait::ThermostatMode(t) = decoded else {
            panic!("wrong variant");
        };
        assert_eq!(t.mode, ThermostatMode::HeatCool);
        assert_eq!(t.available_modes.len(), 4);
        assert_eq!(ThermostatMode::HeatCool.to_string(), "HEATCOOL");
    }

    #[test]
    fn fan_timeout_parses_rfc3339() {
        let decoded = FanTrait::decode(&json!({
            "timerMode": "ON",
            "timerTimeout": "2019-05-10T03:22:54Z",
        }))
        .unwrap();
        let Trait::Fan(fan) = decoded else {
            panic!("wrong variant");
        };
        assert_eq!(fan.timer_mode, Some(FanTimerMode::On));
        assert!(fan.timer_timeout.is_some());
    }
}
