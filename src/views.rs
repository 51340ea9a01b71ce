//! View dispatch
//! Closed set of dashboard views and the filter pipeline behind each.

use crate::charts::{HexBin, HexagonLayer};
use crate::data::{
    AffectedType, CollisionFilters, CollisionTable, GeoPoint, HourOfDay,
    InjuryThreshold, MinuteHistogram, StreetCount,
};
use crate::stats::{ColumnSummary, StatsCalculator};
use std::sync::Arc;
use tracing::debug;

/// The five dashboard views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ViewKind {
    #[default]
    Overview,
    InjuriesMap,
    CollisionsByTime,
    DangerousStreets,
    RawData,
}

impl ViewKind {
    pub const ALL: [ViewKind; 5] = [
        ViewKind::Overview,
        ViewKind::InjuriesMap,
        ViewKind::CollisionsByTime,
        ViewKind::DangerousStreets,
        ViewKind::RawData,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ViewKind::Overview => "Overview",
            ViewKind::InjuriesMap => "Injuries Map",
            ViewKind::CollisionsByTime => "Collisions by Time",
            ViewKind::DangerousStreets => "Dangerous Streets",
            ViewKind::RawData => "Raw Data",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            ViewKind::Overview => "🏠",
            ViewKind::InjuriesMap => "🗺",
            ViewKind::CollisionsByTime => "🕑",
            ViewKind::DangerousStreets => "⚠",
            ViewKind::RawData => "📄",
        }
    }
}

/// Per-view control values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewControls {
    pub min_injured: InjuryThreshold,
    pub hour: HourOfDay,
    pub affected: AffectedType,
}

impl Default for ViewControls {
    fn default() -> Self {
        Self {
            min_injured: InjuryThreshold::default(),
            // The hour selector opens on 1:00.
            hour: HourOfDay::new(1).unwrap_or_default(),
            affected: AffectedType::Pedestrians,
        }
    }
}

/// Settings the views take from configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewSettings {
    pub default_center: GeoPoint,
    pub hexagon: HexagonLayer,
    pub preview_rows: usize,
}

/// Everything a renderer needs to draw one view.
#[derive(Debug, Clone)]
pub enum ViewContent {
    Overview {
        summary: Vec<ColumnSummary>,
        preview: CollisionTable,
        points: Vec<GeoPoint>,
    },
    InjuriesMap {
        min_injured: InjuryThreshold,
        points: Vec<GeoPoint>,
    },
    CollisionsByTime {
        hour: HourOfDay,
        /// Rows in the hour.
        collisions: usize,
        center: GeoPoint,
        hexagons: Vec<HexBin>,
        histogram: MinuteHistogram,
    },
    DangerousStreets {
        affected: AffectedType,
        streets: Vec<StreetCount>,
    },
    RawData {
        table: Arc<CollisionTable>,
    },
}

impl ViewContent {
    pub fn kind(&self) -> ViewKind {
        match self {
            ViewContent::Overview { .. } => ViewKind::Overview,
            ViewContent::InjuriesMap { .. } => ViewKind::InjuriesMap,
            ViewContent::CollisionsByTime { .. } => ViewKind::CollisionsByTime,
            ViewContent::DangerousStreets { .. } => ViewKind::DangerousStreets,
            ViewContent::RawData { .. } => ViewKind::RawData,
        }
    }

    /// Whether the view's filter selected nothing.
    pub fn is_empty_selection(&self) -> bool {
        match self {
            ViewContent::Overview { points, .. } | ViewContent::InjuriesMap { points, .. } => {
                points.is_empty()
            }
            ViewContent::CollisionsByTime { collisions, .. } => *collisions == 0,
            ViewContent::DangerousStreets { streets, .. } => streets.is_empty(),
            ViewContent::RawData { table } => table.is_empty(),
        }
    }
}

/// Caption of an hour window, e.g. `between 23:00 and 0:00`.
pub fn hour_window(hour: HourOfDay) -> String {
    format!("between {}:00 and {}:00", hour.get(), hour.next().get())
}

/// Run the filters behind `kind` against the unfiltered `table`.
pub fn build_view(
    kind: ViewKind,
    table: &Arc<CollisionTable>,
    controls: &ViewControls,
    settings: &ViewSettings,
) -> ViewContent {
    debug!(view = kind.label(), rows = table.len(), "building view");

    match kind {
        ViewKind::Overview => ViewContent::Overview {
            summary: StatsCalculator::describe(table),
            preview: table.head(settings.preview_rows),
            points: table.records().iter().map(|r| r.location()).collect(),
        },
        ViewKind::InjuriesMap => ViewContent::InjuriesMap {
            min_injured: controls.min_injured,
            points: CollisionFilters::filter_by_min_injured(table, controls.min_injured),
        },
        ViewKind::CollisionsByTime => {
            let hourly = CollisionFilters::filter_by_hour(table, controls.hour);
            let center =
                CollisionFilters::midpoint(&hourly).unwrap_or(settings.default_center);
            let locations: Vec<GeoPoint> = hourly.records().iter().map(|r| r.location()).collect();
            ViewContent::CollisionsByTime {
                hour: controls.hour,
                collisions: hourly.len(),
                center,
                hexagons: settings.hexagon.aggregate(&locations),
                histogram: CollisionFilters::minute_histogram(&hourly),
            }
        }
        ViewKind::DangerousStreets => ViewContent::DangerousStreets {
            affected: controls.affected,
            streets: CollisionFilters::top_streets(table, controls.affected),
        },
        ViewKind::RawData => ViewContent::RawData {
            table: Arc::clone(table),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::{fixtures::SAMPLE_CSV, parse_collisions};
    use crate::data::RowLimit;

    fn sample() -> Arc<CollisionTable> {
        Arc::new(
            parse_collisions(SAMPLE_CSV.as_bytes().to_vec(), RowLimit::new(100).unwrap()).unwrap(),
        )
    }

    fn settings() -> ViewSettings {
        ViewSettings {
            default_center: GeoPoint::new(40.7128, -74.0060),
            hexagon: HexagonLayer::default(),
            preview_rows: 2,
        }
    }

    #[test]
    fn test_every_kind_dispatches_to_its_content() {
        let table = sample();
        for kind in ViewKind::ALL {
            let content = build_view(kind, &table, &ViewControls::default(), &settings());
            assert_eq!(content.kind(), kind);
        }
    }

    #[test]
    fn test_labels_are_unique() {
        let labels: std::collections::HashSet<_> = ViewKind::ALL.iter().map(|k| k.label()).collect();
        assert_eq!(labels.len(), 5);
        assert_eq!(ViewKind::default(), ViewKind::Overview);
    }

    #[test]
    fn test_overview_preview_and_points() {
        let table = sample();
        let content =
            build_view(ViewKind::Overview, &table, &ViewControls::default(), &settings());
        let ViewContent::Overview {
            summary,
            preview,
            points,
        } = content
        else {
            panic!("expected overview");
        };
        assert_eq!(preview.len(), 2);
        assert_eq!(points.len(), table.len());
        assert!(summary.iter().any(|s| s.column == "zip_code"));
    }

    #[test]
    fn test_collisions_by_time_uses_hour_rows() {
        let table = sample();
        let controls = ViewControls {
            hour: HourOfDay::new(17).unwrap(),
            ..ViewControls::default()
        };
        let content = build_view(ViewKind::CollisionsByTime, &table, &controls, &settings());
        let ViewContent::CollisionsByTime {
            collisions,
            center,
            histogram,
            hexagons,
            ..
        } = content
        else {
            panic!("expected collisions by time");
        };
        assert_eq!(collisions, 2);
        assert_eq!(histogram.buckets()[5], 2);
        assert_eq!(hexagons.iter().map(|h| h.count).sum::<usize>(), 2);
        assert!((center.latitude - 40.7499).abs() < 1e-9);
    }

    #[test]
    fn test_empty_hour_falls_back_to_default_center() {
        let table = sample();
        let controls = ViewControls {
            hour: HourOfDay::new(3).unwrap(),
            ..ViewControls::default()
        };
        let content = build_view(ViewKind::CollisionsByTime, &table, &controls, &settings());
        assert!(content.is_empty_selection());
        let ViewContent::CollisionsByTime {
            center,
            histogram,
            hexagons,
            ..
        } = content
        else {
            panic!("expected collisions by time");
        };
        assert_eq!(center, settings().default_center);
        assert_eq!(histogram.total(), 0);
        assert!(hexagons.is_empty());
    }

    #[test]
    fn test_dangerous_streets_view() {
        let table = sample();
        let controls = ViewControls {
            affected: AffectedType::Motorists,
            ..ViewControls::default()
        };
        let content = build_view(ViewKind::DangerousStreets, &table, &controls, &settings());
        let ViewContent::DangerousStreets { streets, .. } = content else {
            panic!("expected dangerous streets");
        };
        // The QUEENS row has 2 motorists but no street name.
        let names: Vec<&str> = streets.iter().map(|s| s.street.as_str()).collect();
        assert_eq!(names, vec!["ATLANTIC AVENUE", "GRAND CONCOURSE"]);
    }

    #[test]
    fn test_raw_data_shares_table() {
        let table = sample();
        let content =
            build_view(ViewKind::RawData, &table, &ViewControls::default(), &settings());
        let ViewContent::RawData { table: shown } = content else {
            panic!("expected raw data");
        };
        assert!(Arc::ptr_eq(&shown, &table));
    }

    #[test]
    fn test_hour_window_wraps() {
        assert_eq!(hour_window(HourOfDay::new(23).unwrap()), "between 23:00 and 0:00");
        assert_eq!(hour_window(HourOfDay::new(9).unwrap()), "between 9:00 and 10:00");
    }
}
