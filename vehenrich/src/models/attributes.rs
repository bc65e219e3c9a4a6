//! Vehicle attributes produced by classification

use super::record::VehicleRecord;
use std::fmt;

/// Output columns of the enriched CSV, in order
pub const OUTPUT_HEADERS: [&str; 7] = [
    "Veh_Make_ID",
    "Veh_Mod_ID",
    "Veh_Mod_Year",
    "n_crashes",
    "IsElectric",
    "IsHybrid",
    "HasAutomaticBrakingSystem",
];

/// Four-valued attribute
///
/// `Unknown` marks a reply that could not be parsed; `Error` marks a failed
/// service call. Neither is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeValue {
    True,
    False,
    Unknown,
    Error,
}

impl AttributeValue {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeValue::True => "true",
            AttributeValue::False => "false",
            AttributeValue::Unknown => "Unknown",
            AttributeValue::Error => "Error",
        }
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        if value {
            AttributeValue::True
        } else {
            AttributeValue::False
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three classified attributes of a vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VehicleAttributes {
    pub is_electric: AttributeValue,
    pub is_hybrid: AttributeValue,
    pub has_automatic_braking: AttributeValue,
}

impl VehicleAttributes {
    pub fn from_flags(is_electric: bool, is_hybrid: bool, has_automatic_braking: bool) -> Self {
        Self {
            is_electric: is_electric.into(),
            is_hybrid: is_hybrid.into(),
            has_automatic_braking: has_automatic_braking.into(),
        }
    }

    /// All three set to `Unknown` (unparseable reply)
    pub fn unknown() -> Self {
        Self::filled(AttributeValue::Unknown)
    }

    /// All three set to `Error` (service failure)
    pub fn error() -> Self {
        Self::filled(AttributeValue::Error)
    }

    fn filled(value: AttributeValue) -> Self {
        Self {
            is_electric: value,
            is_hybrid: value,
            has_automatic_braking: value,
        }
    }
}

/// A vehicle record with its classified attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichedRecord {
    pub record: VehicleRecord,
    pub attributes: VehicleAttributes,
}

impl EnrichedRecord {
    pub fn new(record: VehicleRecord, attributes: VehicleAttributes) -> Self {
        Self { record, attributes }
    }

    /// Field values in [`OUTPUT_HEADERS`] order
    pub fn csv_fields(&self) -> [&str; 7] {
        let key = &self.record.key;
        [
            key.make(),
            key.model(),
            key.model_year(),
            self.record.n_crashes.as_str(),
            self.attributes.is_electric.as_str(),
            self.attributes.is_hybrid.as_str(),
            self.attributes.has_automatic_braking.as_str(),
        ]
    }
}
