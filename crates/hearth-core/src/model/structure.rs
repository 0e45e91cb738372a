// ── Structure entity ──
//
// A structure is a named location/grouping that can own devices via
// relations. Much simpler than a device: its traits are decoded once at
// construction and read-only thereafter -- structures receive no
// resource updates and carry no listeners.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use crate::error::ParseError;
use crate::model::traits::{RoomInfoTrait, StructureInfoTrait, Trait};
use crate::registry::TraitRegistry;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDescriptor {
    name: Option<String>,
    #[serde(default)]
    traits: IndexMap<String, Value>,
}

/// One managed structure (home, room, ...).
#[derive(Debug)]
pub struct Structure {
    name: String,
    traits: IndexMap<String, Trait>,
}

impl Structure {
    /// Build a structure from a raw API descriptor. Strict, like the
    /// device factory: any malformed known trait rejects the descriptor.
    pub fn from_descriptor(raw: Value, registry: &TraitRegistry) -> Result<Self, ParseError> {
        let descriptor: RawDescriptor = serde_json::from_value(raw)?;
        let name = descriptor.name.ok_or(ParseError::MissingField("name"))?;

        let mut traits = IndexMap::with_capacity(descriptor.traits.len());
        for (trait_type, raw) in &descriptor.traits {
            traits.insert(trait_type.clone(), registry.decode(trait_type, raw)?);
        }

        Ok(Self { name, traits })
    }

    /// Globally unique resource name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn traits(&self) -> &IndexMap<String, Trait> {
        &self.traits
    }

    pub fn get_trait(&self, trait_type: &str) -> Option<&Trait> {
        self.traits.get(trait_type)
    }

    /// User-assigned display name: the structure info trait, falling
    /// back to room info for room-level structures.
    pub fn custom_name(&self) -> Option<&str> {
        if let Some(Trait::StructureInfo(info)) = self.traits.get(StructureInfoTrait::NAME) {
            return info.custom_name.as_deref();
        }
        if let Some(Trait::RoomInfo(info)) = self.traits.get(RoomInfoTrait::NAME) {
            return info.custom_name.as_deref();
        }
        None
    }
}
