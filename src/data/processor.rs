//! Collision Filter Module
//! Pure filters and aggregations over a loaded collision table.

use crate::data::table::{Collision, CollisionTable, GeoPoint};
use chrono::Timelike;
use std::fmt;
use thiserror::Error;

/// Number of ranked streets returned by `top_streets`.
pub const TOP_STREETS: usize = 10;

/// Highest value of the injuries slider.
pub const MAX_INJURY_THRESHOLD: u32 = 19;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FilterError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Minimum injured-persons count, `0..=19`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InjuryThreshold(u32);

impl InjuryThreshold {
    pub fn new(value: u32) -> Result<Self, FilterError> {
        if value > MAX_INJURY_THRESHOLD {
            return Err(FilterError::InvalidArgument(format!(
                "injury threshold {value} outside 0..={MAX_INJURY_THRESHOLD}"
            )));
        }
        Ok(Self(value))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

/// Hour-of-day bucket, `0..=23`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HourOfDay(u32);

impl HourOfDay {
    pub fn new(value: u32) -> Result<Self, FilterError> {
        if value > 23 {
            return Err(FilterError::InvalidArgument(format!(
                "hour {value} outside 0..=23"
            )));
        }
        Ok(Self(value))
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// The following hour, wrapping at midnight.
    pub fn next(self) -> HourOfDay {
        HourOfDay((self.0 + 1) % 24)
    }
}

/// Party whose injury count drives the street ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AffectedType {
    #[default]
    Pedestrians,
    Cyclists,
    Motorists,
}

impl AffectedType {
    pub const ALL: [AffectedType; 3] = [
        AffectedType::Pedestrians,
        AffectedType::Cyclists,
        AffectedType::Motorists,
    ];

    /// Name of the count column this type selects.
    pub fn column(self) -> &'static str {
        match self {
            AffectedType::Pedestrians => crate::data::table::INJURED_PEDESTRIANS,
            AffectedType::Cyclists => crate::data::table::INJURED_CYCLISTS,
            AffectedType::Motorists => crate::data::table::INJURED_MOTORISTS,
        }
    }

    pub fn count(self, record: &Collision) -> Option<u32> {
        match self {
            AffectedType::Pedestrians => record.injured_pedestrians,
            AffectedType::Cyclists => record.injured_cyclists,
            AffectedType::Motorists => record.injured_motorists,
        }
    }
}

impl fmt::Display for AffectedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AffectedType::Pedestrians => "Pedestrians",
            AffectedType::Cyclists => "Cyclists",
            AffectedType::Motorists => "Motorists",
        };
        f.write_str(label)
    }
}

/// Collisions per minute of an hour. Always 60 buckets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinuteHistogram([u32; 60]);

impl MinuteHistogram {
    pub fn buckets(&self) -> &[u32; 60] {
        &self.0
    }

    pub fn total(&self) -> u64 {
        self.0.iter().map(|&c| u64::from(c)).sum()
    }

    /// `(minute, count)` pairs, minute ascending.
    pub fn pairs(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.0.iter().enumerate().map(|(m, &c)| (m as u32, c))
    }
}

/// A street and the injury count of one collision on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreetCount {
    pub street: String,
    pub count: u32,
}

/// Handles filtering of the collision table for each view.
pub struct CollisionFilters;

impl CollisionFilters {
    /// Coordinates of collisions injuring at least `min_injured` persons, input order.
    ///
    /// A threshold of zero keeps every row, including rows without a count.
    pub fn filter_by_min_injured(
        table: &CollisionTable,
        min_injured: InjuryThreshold,
    ) -> Vec<GeoPoint> {
        let min = min_injured.get();
        table
            .records()
            .iter()
            .filter(|r| min == 0 || r.injured_persons.is_some_and(|n| n >= min))
            .map(Collision::location)
            .collect()
    }

    /// Collisions whose timestamp falls in `hour`.
    pub fn filter_by_hour(table: &CollisionTable, hour: HourOfDay) -> CollisionTable {
        table.filter(|r| r.date_time.is_some_and(|dt| dt.hour() == hour.get()))
    }

    /// Count collisions per minute-of-hour.
    pub fn minute_histogram(hourly: &CollisionTable) -> MinuteHistogram {
        let mut buckets = [0u32; 60];
        for dt in hourly.records().iter().filter_map(|r| r.date_time) {
            buckets[dt.minute() as usize] += 1;
        }
        MinuteHistogram(buckets)
    }

    /// Mean latitude and longitude, or `None` for an empty table.
    pub fn midpoint(table: &CollisionTable) -> Option<GeoPoint> {
        if table.is_empty() {
            return None;
        }
        let n = table.len() as f64;
        let (lat, lon) = table
            .records()
            .iter()
            .fold((0.0, 0.0), |(lat, lon), r| (lat + r.latitude, lon + r.longitude));
        Some(GeoPoint::new(lat / n, lon / n))
    }

    /// The ten collisions injuring the most `affected` parties, with their street.
    ///
    /// Rows without a street or with a zero count are skipped. Ties keep
    /// their original row order.
    pub fn top_streets(table: &CollisionTable, affected: AffectedType) -> Vec<StreetCount> {
        let mut ranked: Vec<StreetCount> = table
            .records()
            .iter()
            .filter_map(|r| {
                let count = affected.count(r).filter(|&c| c >= 1)?;
                let street = r.on_street_name.clone()?;
                Some(StreetCount { street, count })
            })
            .collect();

        // sort_by is stable
        ranked.sort_by(|a, b| b.count.cmp(&a.count));
        ranked.truncate(TOP_STREETS);
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::table::test_support::{at, collision, table};

    fn injured(n: Option<u32>, lat: f64) -> Collision {
        Collision {
            injured_persons: n,
            ..collision(lat, -74.0)
        }
    }

    fn timed(hour: u32, minute: u32) -> Collision {
        Collision {
            date_time: at(hour, minute),
            ..collision(40.7, -74.0)
        }
    }

    fn pedestrians(count: u32, street: Option<&str>) -> Collision {
        Collision {
            injured_pedestrians: Some(count),
            on_street_name: street.map(str::to_string),
            ..collision(40.7, -74.0)
        }
    }

    #[test]
    fn test_parameter_ranges() {
        assert!(InjuryThreshold::new(19).is_ok());
        assert!(InjuryThreshold::new(20).is_err());
        assert!(HourOfDay::new(23).is_ok());
        assert_eq!(
            HourOfDay::new(24),
            Err(FilterError::InvalidArgument("hour 24 outside 0..=23".into()))
        );
        assert_eq!(HourOfDay::new(23).unwrap().next().get(), 0);
    }

    #[test]
    fn test_min_injured_zero_returns_all_in_order() {
        let t = table(vec![
            injured(Some(0), 40.1),
            injured(Some(3), 40.2),
            injured(Some(1), 40.3),
        ]);
        let points = CollisionFilters::filter_by_min_injured(&t, InjuryThreshold::new(0).unwrap());
        let lats: Vec<f64> = points.iter().map(|p| p.latitude).collect();
        assert_eq!(lats, vec![40.1, 40.2, 40.3]);
    }

    #[test]
    fn test_min_injured_zero_keeps_rows_without_count() {
        let t = table(vec![
            injured(Some(2), 40.1),
            injured(None, 40.2),
            injured(Some(0), 40.3),
        ]);
        let all = CollisionFilters::filter_by_min_injured(&t, InjuryThreshold::new(0).unwrap());
        assert_eq!(all.len(), t.len());
        assert_eq!(all[1], GeoPoint::new(40.2, -74.0));

        let one_or_more =
            CollisionFilters::filter_by_min_injured(&t, InjuryThreshold::new(1).unwrap());
        assert_eq!(one_or_more, vec![GeoPoint::new(40.1, -74.0)]);
    }

    #[test]
    fn test_min_injured_is_monotonic() {
        let t = table(
            [0, 4, 1, 2, 7, 0, 3]
                .iter()
                .enumerate()
                .map(|(i, &n)| injured(Some(n), 40.0 + i as f64 / 100.0))
                .chain(std::iter::once(injured(None, 41.0)))
                .collect(),
        );

        let mut previous = usize::MAX;
        for threshold in 0..=MAX_INJURY_THRESHOLD {
            let points =
                CollisionFilters::filter_by_min_injured(&t, InjuryThreshold::new(threshold).unwrap());
            assert!(points.len() <= previous);
            assert!(points.len() <= t.len());
            previous = points.len();
        }
        let two_or_more =
            CollisionFilters::filter_by_min_injured(&t, InjuryThreshold::new(2).unwrap());
        assert_eq!(two_or_more.len(), 4);
    }

    #[test]
    fn test_filter_by_hour() {
        let t = table(vec![timed(9, 5), timed(10, 0), timed(9, 59), {
            let mut c = timed(9, 0);
            c.date_time = None;
            c
        }]);
        let hourly = CollisionFilters::filter_by_hour(&t, HourOfDay::new(9).unwrap());
        assert_eq!(hourly.len(), 2);
        assert_eq!(t.len(), 4);
    }

    #[test]
    fn test_minute_histogram_scenario() {
        let hourly = table(vec![timed(8, 5), timed(8, 5), timed(8, 40)]);
        let histogram = CollisionFilters::minute_histogram(&hourly);
        let buckets = histogram.buckets();
        assert_eq!(buckets.len(), 60);
        assert_eq!(buckets[5], 2);
        assert_eq!(buckets[40], 1);
        for (minute, &count) in buckets.iter().enumerate() {
            if minute != 5 && minute != 40 {
                assert_eq!(count, 0, "minute {minute}");
            }
        }
        assert_eq!(histogram.total(), hourly.len() as u64);
    }

    #[test]
    fn test_minute_histogram_empty_input() {
        let histogram = CollisionFilters::minute_histogram(&table(Vec::new()));
        assert_eq!(histogram.pairs().count(), 60);
        assert!(histogram.buckets().iter().all(|&c| c == 0));
    }

    #[test]
    fn test_midpoint() {
        assert_eq!(CollisionFilters::midpoint(&table(Vec::new())), None);
        let t = table(vec![collision(40.0, -74.0), collision(41.0, -73.0)]);
        assert_eq!(
            CollisionFilters::midpoint(&t),
            Some(GeoPoint::new(40.5, -73.5))
        );
    }

    #[test]
    fn test_top_streets_scenario() {
        let t = table(vec![
            pedestrians(0, Some("A St")),
            pedestrians(2, Some("B St")),
            pedestrians(5, Some("C St")),
        ]);
        let top = CollisionFilters::top_streets(&t, AffectedType::Pedestrians);
        assert_eq!(
            top,
            vec![
                StreetCount {
                    street: "C St".into(),
                    count: 5
                },
                StreetCount {
                    street: "B St".into(),
                    count: 2
                },
            ]
        );
    }

    #[test]
    fn test_top_streets_limits_and_orders() {
        let mut records: Vec<Collision> = (0..25)
            .map(|i| pedestrians(i % 4 + 1, Some(&format!("Street {i}"))))
            .collect();
        records.push(pedestrians(9, None));
        let t = table(records);

        let top = CollisionFilters::top_streets(&t, AffectedType::Pedestrians);
        assert_eq!(top.len(), TOP_STREETS);
        assert!(top.windows(2).all(|w| w[0].count >= w[1].count));
        // Ties keep row order: streets 3, 7, 11, ... all have count 4.
        assert_eq!(top[0].street, "Street 3");
        assert_eq!(top[1].street, "Street 7");
    }

    #[test]
    fn test_top_streets_uses_affected_column() {
        let mut cyclist = collision(40.7, -74.0);
        cyclist.injured_cyclists = Some(1);
        cyclist.on_street_name = Some("BIKE LANE".into());
        let t = table(vec![cyclist, pedestrians(3, Some("MAIN ST"))]);

        let top = CollisionFilters::top_streets(&t, AffectedType::Cyclists);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].street, "BIKE LANE");
        assert!(CollisionFilters::top_streets(&t, AffectedType::Motorists).is_empty());
        assert_eq!(AffectedType::Cyclists.column(), "injured_cyclists");
    }
}
