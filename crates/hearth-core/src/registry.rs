// ── Trait registry ──
//
// Maps namespaced trait-type strings to decoder functions. This replaces
// the upstream API's open-ended trait dictionaries with a closed decode
// table plus an explicit fallback: unknown trait types never fail, they
// pass through as `Trait::Unknown` so new server-side trait definitions
// don't break existing state.

use std::collections::HashMap;

use serde_json::Value;

use crate::error::DecodeError;
use crate::model::traits::{
    ConnectivityTrait, FanTrait, HumidityTrait, InfoTrait, RoomInfoTrait, SettingsTrait,
    StructureInfoTrait, TemperatureTrait, ThermostatHvacTrait, ThermostatModeTrait,
    ThermostatTemperatureSetpointTrait, Trait, UnknownTrait,
};

/// Decoder for one trait type: raw fields in, typed trait out.
pub type TraitDecoder = fn(&Value) -> Result<Trait, DecodeError>;

/// Decode table for trait payloads.
///
/// [`Default`] populates every built-in trait type; [`register`] is the
/// extension point for callers that know about traits this crate does
/// not. Decoding is a pure function of its inputs.
///
/// [`register`]: Self::register
pub struct TraitRegistry {
    decoders: HashMap<&'static str, TraitDecoder>,
}

impl TraitRegistry {
    /// An empty registry. Every trait type will pass through as
    /// [`Trait::Unknown`] until decoders are registered.
    pub fn empty() -> Self {
        Self {
            decoders: HashMap::new(),
        }
    }

    /// Register (or replace) the decoder for a trait type.
    pub fn register(&mut self, trait_type: &'static str, decoder: TraitDecoder) {
        self.decoders.insert(trait_type, decoder);
    }

    /// Decode a raw trait payload.
    ///
    /// Known types validate their declared fields and fail with a
    /// [`DecodeError`] naming the trait type and offending field.
    /// Unrecognized types succeed unconditionally, keeping the raw
    /// mapping verbatim.
    pub fn decode(&self, trait_type: &str, raw: &Value) -> Result<Trait, DecodeError> {
        match self.decoders.get(trait_type) {
            Some(decoder) => decoder(raw),
            None => Ok(Trait::Unknown(UnknownTrait {
                trait_type: trait_type.to_owned(),
                fields: raw.clone(),
            })),
        }
    }

    /// Whether a decoder is registered for `trait_type`.
    pub fn knows(&self, trait_type: &str) -> bool {
        self.decoders.contains_key(trait_type)
    }
}

impl Default for TraitRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(ConnectivityTrait::NAME, ConnectivityTrait::decode);
        registry.register(InfoTrait::NAME, InfoTrait::decode);
        registry.register(FanTrait::NAME, FanTrait::decode);
        registry.register(HumidityTrait::NAME, HumidityTrait::decode);
        registry.register(TemperatureTrait::NAME, TemperatureTrait::decode);
        registry.register(ThermostatHvacTrait::NAME, ThermostatHvacTrait::decode);
        registry.register(ThermostatModeTrait::NAME, ThermostatModeTrait::decode);
        registry.register(
            ThermostatTemperatureSetpointTrait::NAME,
            ThermostatTemperatureSetpointTrait::decode,
        );
        registry.register(SettingsTrait::NAME, SettingsTrait::decode);
        registry.register(StructureInfoTrait::NAME, StructureInfoTrait::decode);
        registry.register(RoomInfoTrait::NAME, RoomInfoTrait::decode);
        registry
    }
}
