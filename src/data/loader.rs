//! Collision Data Loader Module
//! Parses the collision CSV with Polars, normalizes it, and caches the result per row limit.

use crate::data::source::{CsvSource, SourceError};
use crate::data::table::{
    Cell, Collision, CollisionTable, ColumnKind, ColumnSpec, Schema, INJURED_CYCLISTS,
    INJURED_MOTORISTS, INJURED_PEDESTRIANS, INJURED_PERSONS, LATITUDE, LONGITUDE, ON_STREET_NAME,
};
use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::io::Cursor;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

const CRASH_DATE: &str = "crash_date";
const CRASH_TIME: &str = "crash_time";

/// Columns that must exist (case-insensitively) in the source.
const REQUIRED_COLUMNS: [&str; 9] = [
    CRASH_DATE,
    CRASH_TIME,
    LATITUDE,
    LONGITUDE,
    INJURED_PERSONS,
    INJURED_PEDESTRIANS,
    INJURED_CYCLISTS,
    INJURED_MOTORISTS,
    ON_STREET_NAME,
];

const DATE_TIME_FORMATS: [&str; 4] = [
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
];

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Collision data unavailable: {0}")]
    DataUnavailable(String),
    #[error("Invalid collision schema: {0}")]
    InvalidSchema(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl From<SourceError> for LoaderError {
    fn from(err: SourceError) -> Self {
        LoaderError::DataUnavailable(err.to_string())
    }
}

impl From<PolarsError> for LoaderError {
    fn from(err: PolarsError) -> Self {
        LoaderError::DataUnavailable(format!("failed to parse CSV: {err}"))
    }
}

/// Maximum number of records read from the source. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowLimit(NonZeroUsize);

impl RowLimit {
    pub fn new(rows: usize) -> Result<Self, LoaderError> {
        NonZeroUsize::new(rows)
            .map(RowLimit)
            .ok_or_else(|| LoaderError::InvalidArgument("row limit must be positive".into()))
    }

    pub fn get(self) -> usize {
        self.0.get()
    }
}

impl fmt::Display for RowLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parse raw CSV content into a normalized collision table.
///
/// Reads at most `row_limit` data rows, lowercases column names, merges
/// `crash_date` and `crash_time` into `date_time`, and drops every row
/// without a finite latitude and longitude.
pub fn parse_collisions(bytes: Vec<u8>, row_limit: RowLimit) -> Result<CollisionTable, LoaderError> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_n_rows(Some(row_limit.get()))
        .with_infer_schema_length(Some(10000))
        .with_ignore_errors(true)
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()?;

    let columns = normalized_columns(&df)?;
    let lookup = |name: &str| required_column(&df, &columns, name);

    let dates = string_values(lookup(CRASH_DATE)?)?;
    let times = string_values(lookup(CRASH_TIME)?)?;
    let latitudes = float_values(lookup(LATITUDE)?)?;
    let longitudes = float_values(lookup(LONGITUDE)?)?;
    let persons = count_values(lookup(INJURED_PERSONS)?)?;
    let pedestrians = count_values(lookup(INJURED_PEDESTRIANS)?)?;
    let cyclists = count_values(lookup(INJURED_CYCLISTS)?)?;
    let motorists = count_values(lookup(INJURED_MOTORISTS)?)?;
    let streets = string_values(lookup(ON_STREET_NAME)?)?;

    // Everything else passes through, in source order.
    let mut extra_specs = Vec::new();
    let mut extra_values: Vec<Vec<Cell>> = Vec::new();
    for col in df.get_columns() {
        let name = col.name().to_lowercase();
        if REQUIRED_COLUMNS.contains(&name.as_str()) {
            continue;
        }
        let (kind, cells) = pass_through_values(col)?;
        extra_specs.push(ColumnSpec { name, kind });
        extra_values.push(cells);
    }
    let schema = Arc::new(Schema { extra: extra_specs });

    let mut records = Vec::with_capacity(df.height());
    let mut unparsed_timestamps = 0usize;
    for i in 0..df.height() {
        let (Some(latitude), Some(longitude)) = (latitudes[i], longitudes[i]) else {
            continue;
        };
        if !latitude.is_finite() || !longitude.is_finite() {
            continue;
        }

        let date_time = dates[i]
            .as_deref()
            .and_then(|d| parse_date_time(d, times[i].as_deref().unwrap_or("")));
        if date_time.is_none() {
            unparsed_timestamps += 1;
        }

        records.push(Collision {
            date_time,
            latitude,
            longitude,
            injured_persons: persons[i],
            injured_pedestrians: pedestrians[i],
            injured_cyclists: cyclists[i],
            injured_motorists: motorists[i],
            on_street_name: streets[i].clone(),
            extra: extra_values.iter().map(|c| c[i].clone()).collect(),
        });
    }

    let dropped = df.height() - records.len();
    if dropped > 0 {
        debug!(dropped, "dropped rows without coordinates");
    }
    if unparsed_timestamps > 0 {
        warn!(rows = unparsed_timestamps, "rows with unparseable crash date/time");
    }

    Ok(CollisionTable::new(schema, records))
}

/// Map lowercase column name to the source column name, rejecting collisions.
fn normalized_columns(df: &DataFrame) -> Result<HashMap<String, String>, LoaderError> {
    let mut columns = HashMap::new();
    let mut seen = HashSet::new();
    for name in df.get_column_names() {
        let original = name.to_string();
        let lower = original.to_lowercase();
        if !seen.insert(lower.clone()) {
            return Err(LoaderError::InvalidSchema(format!(
                "column `{original}` duplicates `{lower}` after lowercasing"
            )));
        }
        columns.insert(lower, original);
    }
    Ok(columns)
}

fn required_column<'a>(
    df: &'a DataFrame,
    columns: &HashMap<String, String>,
    name: &str,
) -> Result<&'a Column, LoaderError> {
    let source = columns
        .get(name)
        .ok_or_else(|| LoaderError::InvalidSchema(format!("missing column `{name}`")))?;
    Ok(df.column(source)?)
}

fn string_values(col: &Column) -> Result<Vec<Option<String>>, LoaderError> {
    let as_str = col.cast(&DataType::String)?;
    let ca = as_str.as_materialized_series().str()?;
    Ok(ca
        .into_iter()
        .map(|v| {
            v.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        })
        .collect())
}

fn float_values(col: &Column) -> Result<Vec<Option<f64>>, LoaderError> {
    let as_f64 = col.cast(&DataType::Float64)?;
    let ca = as_f64.f64()?;
    Ok(ca.into_iter().collect())
}

fn count_values(col: &Column) -> Result<Vec<Option<u32>>, LoaderError> {
    Ok(float_values(col)?
        .into_iter()
        .map(|v| v.filter(|n| n.is_finite() && *n >= 0.0).map(|n| n as u32))
        .collect())
}

fn pass_through_values(col: &Column) -> Result<(ColumnKind, Vec<Cell>), LoaderError> {
    let numeric = matches!(
        col.dtype(),
        DataType::Float32
            | DataType::Float64
            | DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    );

    if numeric {
        let cells = float_values(col)?
            .into_iter()
            .map(|v| v.map(Cell::Number).unwrap_or(Cell::Null))
            .collect();
        Ok((ColumnKind::Numeric, cells))
    } else {
        let cells = string_values(col)?
            .into_iter()
            .map(|v| v.map(Cell::Text).unwrap_or(Cell::Null))
            .collect();
        Ok((ColumnKind::Text, cells))
    }
}

/// Combine a crash date and a crash time into one timestamp.
pub fn parse_date_time(date: &str, time: &str) -> Option<NaiveDateTime> {
    // Some exports carry the date as an ISO timestamp at midnight.
    let date = date.split('T').next().unwrap_or(date).trim();
    let combined = format!("{} {}", date, time.trim());
    DATE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&combined, fmt).ok())
        .or_else(|| {
            // Date-only values fall back to midnight.
            ["%m/%d/%Y", "%Y-%m-%d"]
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(date, fmt).ok())
                .filter(|_| time.trim().is_empty())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

struct CacheEntry {
    table: Arc<CollisionTable>,
    loaded_at: Instant,
}

type Slot = Arc<Mutex<Option<CacheEntry>>>;

/// Read-through cache of parsed collision tables keyed by row limit.
///
/// Each key is populated under its own lock, so concurrent callers for the
/// same limit wait for one fetch instead of issuing several. Failed loads
/// are not cached.
pub struct CollisionCache<S: CsvSource> {
    source: S,
    ttl: Option<Duration>,
    slots: Mutex<HashMap<RowLimit, Slot>>,
}

impl<S: CsvSource> CollisionCache<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            ttl: None,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Entries older than `ttl` are re-fetched on next access.
    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    fn slot(&self, row_limit: RowLimit) -> Slot {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(slots.entry(row_limit).or_default())
    }

    fn is_fresh(&self, entry: &CacheEntry) -> bool {
        self.ttl.map_or(true, |ttl| entry.loaded_at.elapsed() < ttl)
    }

    /// Load the table for `row_limit`, fetching only on a cache miss.
    pub fn load(&self, row_limit: RowLimit) -> Result<Arc<CollisionTable>, LoaderError> {
        let slot = self.slot(row_limit);
        let mut guard = slot.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(entry) = guard.as_ref().filter(|e| self.is_fresh(e)) {
            debug!(%row_limit, "collision cache hit");
            return Ok(Arc::clone(&entry.table));
        }

        info!(%row_limit, source = %self.source.describe(), "loading collision data");
        let started = Instant::now();
        let bytes = self.source.fetch(row_limit.get())?;
        let table = Arc::new(parse_collisions(bytes, row_limit)?);
        info!(
            %row_limit,
            rows = table.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "collision data loaded"
        );

        *guard = Some(CacheEntry {
            table: Arc::clone(&table),
            loaded_at: Instant::now(),
        });
        Ok(table)
    }

    /// Cached table for `row_limit`, if present and fresh. Never fetches.
    pub fn peek(&self, row_limit: RowLimit) -> Option<Arc<CollisionTable>> {
        let slot = {
            let slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
            slots.get(&row_limit).cloned()
        }?;
        let guard = slot.lock().unwrap_or_else(|e| e.into_inner());
        guard
            .as_ref()
            .filter(|e| self.is_fresh(e))
            .map(|e| Arc::clone(&e.table))
    }

    pub fn invalidate(&self, row_limit: RowLimit) {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        if slots.remove(&row_limit).is_some() {
            debug!(%row_limit, "collision cache entry invalidated");
        }
    }
}
