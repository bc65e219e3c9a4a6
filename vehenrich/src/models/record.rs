//! Vehicle crash records and the composite vehicle key

use csv::{ByteRecord, StringRecord};
use serde::Deserialize;
use std::fmt;

/// Source column holding the vehicle make
pub const MAKE_COLUMN: &str = "Veh_Make_ID";
/// Source column holding the vehicle model
pub const MODEL_COLUMN: &str = "Veh_Mod_ID";
/// Source column holding the model year
pub const YEAR_COLUMN: &str = "Veh_Mod_Year";
/// Source column holding the crash count
pub const CRASHES_COLUMN: &str = "n_crashes";

/// Identity of a vehicle: trimmed make, model and model year
///
/// Two records describe the same vehicle iff their keys are equal. Only
/// surrounding whitespace is removed; case and numeric formatting are kept
/// as-is, so `"2022"` and `"2022.0"` are different vehicles.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CompositeKey {
    make: String,
    model: String,
    model_year: String,
}

impl CompositeKey {
    pub fn new(make: &str, model: &str, model_year: &str) -> Self {
        Self {
            make: make.trim().to_string(),
            model: model.trim().to_string(),
            model_year: model_year.trim().to_string(),
        }
    }

    pub fn make(&self) -> &str {
        &self.make
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn model_year(&self) -> &str {
        &self.model_year
    }

    /// True when none of the three parts is empty
    pub fn is_complete(&self) -> bool {
        !self.make.is_empty() && !self.model.is_empty() && !self.model_year.is_empty()
    }
}

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.make, self.model, self.model_year)
    }
}

/// A row of the source crash CSV, addressed by header name
///
/// Missing columns, and fields missing from a short row, deserialize as
/// `None`; extra columns are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceRow {
    #[serde(rename = "Veh_Make_ID", default)]
    pub make: Option<String>,
    #[serde(rename = "Veh_Mod_ID", default)]
    pub model: Option<String>,
    #[serde(rename = "Veh_Mod_Year", default)]
    pub model_year: Option<String>,
    #[serde(rename = "n_crashes", default)]
    pub n_crashes: Option<String>,
}

impl SourceRow {
    /// Decode a raw row against trimmed `headers`
    ///
    /// Bytes that are not valid UTF-8 become U+FFFD, so one badly encoded
    /// field never aborts a run. Returns whether any replacement happened.
    pub fn from_byte_record(
        raw: &ByteRecord,
        headers: &StringRecord,
    ) -> csv::Result<(Self, bool)> {
        let lossy = raw.iter().any(|field| std::str::from_utf8(field).is_err());
        let decoded: StringRecord = raw.iter().map(String::from_utf8_lossy).collect();
        let row = decoded.deserialize(Some(headers))?;
        Ok((row, lossy))
    }

    pub fn key(&self) -> CompositeKey {
        CompositeKey::new(
            self.make.as_deref().unwrap_or_default(),
            self.model.as_deref().unwrap_or_default(),
            self.model_year.as_deref().unwrap_or_default(),
        )
    }

    /// Convert into a record, or `None` if make, model or year is blank
    pub fn into_record(self) -> Option<VehicleRecord> {
        let key = self.key();
        if !key.is_complete() {
            return None;
        }
        Some(VehicleRecord {
            key,
            n_crashes: self.n_crashes.unwrap_or_default(),
        })
    }
}

/// A valid vehicle crash entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VehicleRecord {
    pub key: CompositeKey,
    /// Carried through to the output exactly as read
    pub n_crashes: String,
}
