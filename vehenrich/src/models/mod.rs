//! Data models for vehenrich
//!
//! - Source crash rows and the composite vehicle key
//! - Four-valued vehicle attributes and enriched records

pub mod attributes;
pub mod record;

pub use attributes::{AttributeValue, EnrichedRecord, VehicleAttributes, OUTPUT_HEADERS};
pub use record::{
    CompositeKey, SourceRow, VehicleRecord, CRASHES_COLUMN, MAKE_COLUMN, MODEL_COLUMN,
    YEAR_COLUMN,
};
