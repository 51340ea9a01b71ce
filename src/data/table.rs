//! Collision Table Module
//! Typed, immutable in-memory representation of the loaded collision records.

use chrono::NaiveDateTime;
use std::fmt;
use std::sync::Arc;

/// Canonical name of the merged date + time column.
pub const DATE_TIME: &str = "date_time";
pub const LATITUDE: &str = "latitude";
pub const LONGITUDE: &str = "longitude";
pub const ON_STREET_NAME: &str = "on_street_name";
pub const INJURED_PERSONS: &str = "injured_persons";
pub const INJURED_PEDESTRIANS: &str = "injured_pedestrians";
pub const INJURED_CYCLISTS: &str = "injured_cyclists";
pub const INJURED_MOTORISTS: &str = "injured_motorists";

/// Interpreted columns, in display order.
pub const CORE_COLUMNS: [&str; 8] = [
    DATE_TIME,
    LATITUDE,
    LONGITUDE,
    ON_STREET_NAME,
    INJURED_PERSONS,
    INJURED_PEDESTRIANS,
    INJURED_CYCLISTS,
    INJURED_MOTORISTS,
];

/// A geographic coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Value of a pass-through column.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Number(f64),
    Text(String),
}

impl Cell {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => Ok(()),
            Cell::Number(v) if v.fract() == 0.0 && v.abs() < 1e15 => write!(f, "{}", *v as i64),
            Cell::Number(v) => write!(f, "{v}"),
            Cell::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Numeric,
    Text,
}

/// A pass-through column carried unchanged from the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: String,
    pub kind: ColumnKind,
}

/// Pass-through columns shared by every record of a table (and of tables derived from it).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    pub extra: Vec<ColumnSpec>,
}

impl Schema {
    /// All column names: interpreted columns first, then pass-through columns in source order.
    pub fn column_names(&self) -> Vec<String> {
        CORE_COLUMNS
            .iter()
            .map(|s| s.to_string())
            .chain(self.extra.iter().map(|c| c.name.clone()))
            .collect()
    }
}

/// One collision record.
#[derive(Debug, Clone, PartialEq)]
pub struct Collision {
    pub date_time: Option<NaiveDateTime>,
    pub latitude: f64,
    pub longitude: f64,
    pub injured_persons: Option<u32>,
    pub injured_pedestrians: Option<u32>,
    pub injured_cyclists: Option<u32>,
    pub injured_motorists: Option<u32>,
    pub on_street_name: Option<String>,
    /// Values of the schema's pass-through columns, same order.
    pub extra: Vec<Cell>,
}

impl Collision {
    pub fn location(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }

    /// Display strings for every column, in `Schema::column_names` order.
    pub fn display_cells(&self) -> Vec<String> {
        let count = |v: Option<u32>| v.map(|n| n.to_string()).unwrap_or_default();
        let mut cells = vec![
            self.date_time
                .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_default(),
            format!("{:.6}", self.latitude),
            format!("{:.6}", self.longitude),
            self.on_street_name.clone().unwrap_or_default(),
            count(self.injured_persons),
            count(self.injured_pedestrians),
            count(self.injured_cyclists),
            count(self.injured_motorists),
        ];
        cells.extend(self.extra.iter().map(|c| c.to_string()));
        cells
    }
}

/// Immutable, ordered table of collisions. Every record has finite coordinates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollisionTable {
    schema: Arc<Schema>,
    records: Vec<Collision>,
}

impl CollisionTable {
    pub fn new(schema: Arc<Schema>, records: Vec<Collision>) -> Self {
        debug_assert!(records
            .iter()
            .all(|r| r.latitude.is_finite() && r.longitude.is_finite()));
        debug_assert!(records.iter().all(|r| r.extra.len() == schema.extra.len()));
        Self { schema, records }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn records(&self) -> &[Collision] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.schema.column_names()
    }

    /// New table holding the records matching `predicate`, in order.
    pub fn filter<F>(&self, predicate: F) -> CollisionTable
    where
        F: Fn(&Collision) -> bool,
    {
        let records = self
            .records
            .iter()
            .filter(|r| predicate(r))
            .cloned()
            .collect();
        CollisionTable::new(Arc::clone(&self.schema), records)
    }

    /// First `n` records.
    pub fn head(&self, n: usize) -> CollisionTable {
        let records = self.records.iter().take(n).cloned().collect();
        CollisionTable::new(Arc::clone(&self.schema), records)
    }

    /// Numeric columns with their non-null values, in column order.
    pub fn numeric_columns(&self) -> Vec<(String, Vec<f64>)> {
        let counts = |f: fn(&Collision) -> Option<u32>| -> Vec<f64> {
            self.records
                .iter()
                .filter_map(|r| f(r).map(f64::from))
                .collect()
        };

        let mut columns = vec![
            (
                LATITUDE.to_string(),
                self.records.iter().map(|r| r.latitude).collect(),
            ),
            (
                LONGITUDE.to_string(),
                self.records.iter().map(|r| r.longitude).collect(),
            ),
            (INJURED_PERSONS.to_string(), counts(|r| r.injured_persons)),
            (
                INJURED_PEDESTRIANS.to_string(),
                counts(|r| r.injured_pedestrians),
            ),
            (INJURED_CYCLISTS.to_string(), counts(|r| r.injured_cyclists)),
            (INJURED_MOTORISTS.to_string(), counts(|r| r.injured_motorists)),
        ];

        for (idx, spec) in self.schema.extra.iter().enumerate() {
            if spec.kind == ColumnKind::Numeric {
                let values = self
                    .records
                    .iter()
                    .filter_map(|r| r.extra.get(idx).and_then(Cell::as_number))
                    .collect();
                columns.push((spec.name.clone(), values));
            }
        }

        columns
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_filter_keeps_order_and_schema() {
        let schema = Arc::new(Schema {
            extra: vec![ColumnSpec {
                name: "borough".into(),
                kind: ColumnKind::Text,
            }],
        });
        let records = (0..4)
            .map(|i| Collision {
                extra: vec![Cell::Text(format!("b{i}"))],
                ..collision(40.0 + i as f64, -74.0)
            })
            .collect();
        let table = CollisionTable::new(Arc::clone(&schema), records);

        let odd = table.filter(|r| r.latitude as i64 % 2 == 1);
        assert_eq!(odd.len(), 2);
        assert_eq!(odd.records()[0].latitude, 41.0);
        assert_eq!(odd.records()[1].latitude, 43.0);
        assert!(Arc::ptr_eq(odd.schema(), &schema));
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn test_display_cells_align_with_columns() {
        let schema = Schema {
            extra: vec![
                ColumnSpec {
                    name: "zip_code".into(),
                    kind: ColumnKind::Numeric,
                },
                ColumnSpec {
                    name: "borough".into(),
                    kind: ColumnKind::Text,
                },
            ],
        };
        let record = Collision {
            on_street_name: Some("BROADWAY".into()),
            injured_persons: Some(2),
            extra: vec![Cell::Number(10001.0), Cell::Null],
            ..collision(40.75, -73.99)
        };

        let cells = record.display_cells();
        assert_eq!(cells.len(), schema.column_names().len());
        assert_eq!(cells[0], "2019-04-16 00:00:00");
        assert_eq!(cells[3], "BROADWAY");
        assert_eq!(cells[4], "2");
        assert_eq!(cells[8], "10001");
        assert_eq!(cells[9], "");
    }

    #[test]
    fn test_numeric_columns_skip_nulls() {
        let mut a = collision(40.0, -74.0);
        a.injured_cyclists = None;
        let b = collision(41.0, -73.0);
        let table = table(vec![a, b]);

        let columns = table.numeric_columns();
        let cyclists = columns
            .iter()
            .find(|(name, _)| name == INJURED_CYCLISTS)
            .map(|(_, v)| v.len());
        assert_eq!(cyclists, Some(1));
        assert_eq!(columns[0].1, vec![40.0, 41.0]);
    }
}
