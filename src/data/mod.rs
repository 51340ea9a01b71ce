//! Data module - Collision loading, caching and filtering

pub mod loader;
pub mod processor;
pub mod source;
pub mod table;

pub use loader::{CollisionCache, LoaderError, RowLimit};
pub use processor::{
    AffectedType, CollisionFilters, FilterError, HourOfDay, InjuryThreshold, MinuteHistogram,
    StreetCount,
};
pub use source::{CsvSource, HttpCsvSource, StaticCsvSource};
pub use table::{Collision, CollisionTable, GeoPoint};
