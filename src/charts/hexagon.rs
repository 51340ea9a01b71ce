//! Hexagon Aggregation Module
//! Bins coordinates into a pointy-top hexagonal grid measured in meters.

use crate::data::GeoPoint;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const METERS_PER_DEGREE: f64 = 111_320.0;

/// Grid and elevation parameters of the density layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HexagonLayer {
    /// Hexagon circumradius in meters.
    pub radius_m: f64,
    pub elevation_scale: f64,
    /// Elevation of the least and most populated bins, before scaling.
    pub elevation_range: [f64; 2],
}

impl Default for HexagonLayer {
    fn default() -> Self {
        Self {
            radius_m: 100.0,
            elevation_scale: 4.0,
            elevation_range: [0.0, 1000.0],
        }
    }
}

/// One populated hexagon.
#[derive(Debug, Clone, PartialEq)]
pub struct HexBin {
    pub center: GeoPoint,
    pub count: usize,
    pub elevation: f64,
    /// Hexagon corners, clockwise from the top.
    pub corners: [GeoPoint; 6],
}

/// Equirectangular projection around a reference latitude.
#[derive(Debug, Clone, Copy)]
struct Projection {
    cos_lat: f64,
}

impl Projection {
    fn around(points: &[GeoPoint]) -> Self {
        let lat = points.iter().map(|p| p.latitude).sum::<f64>() / points.len().max(1) as f64;
        Self {
            cos_lat: lat.to_radians().cos().max(1e-6),
        }
    }

    fn to_meters(self, p: GeoPoint) -> (f64, f64) {
        (
            p.longitude * METERS_PER_DEGREE * self.cos_lat,
            p.latitude * METERS_PER_DEGREE,
        )
    }

    fn to_geo(self, x: f64, y: f64) -> GeoPoint {
        GeoPoint::new(
            y / METERS_PER_DEGREE,
            x / (METERS_PER_DEGREE * self.cos_lat),
        )
    }
}

/// Round fractional axial coordinates to the containing hexagon.
fn axial_round(q: f64, r: f64) -> (i64, i64) {
    let s = -q - r;
    let (mut rq, mut rr, rs) = (q.round(), r.round(), s.round());
    let (dq, dr, ds) = ((rq - q).abs(), (rr - r).abs(), (rs - s).abs());
    if dq > dr && dq > ds {
        rq = -rr - rs;
    } else if dr > ds {
        rr = -rq - rs;
    }
    (rq as i64, rr as i64)
}

impl HexagonLayer {
    /// Aggregate points into hexagons, most populated first.
    ///
    /// Elevation maps the count linearly from `[min, max]` onto
    /// `elevation_range`, times `elevation_scale`. When every bin holds the
    /// same count they all get the top of the range.
    pub fn aggregate(&self, points: &[GeoPoint]) -> Vec<HexBin> {
        if points.is_empty() || self.radius_m <= 0.0 {
            return Vec::new();
        }

        let projection = Projection::around(points);
        let size = self.radius_m;
        let sqrt3 = 3f64.sqrt();

        let mut counts: HashMap<(i64, i64), usize> = HashMap::new();
        let mut order: Vec<(i64, i64)> = Vec::new();
        for &p in points {
            let (x, y) = projection.to_meters(p);
            let q = (sqrt3 / 3.0 * x - y / 3.0) / size;
            let r = (2.0 / 3.0 * y) / size;
            let key = axial_round(q, r);
            let entry = counts.entry(key).or_insert(0);
            if *entry == 0 {
                order.push(key);
            }
            *entry += 1;
        }

        let min = counts.values().copied().min().unwrap_or(0) as f64;
        let max = counts.values().copied().max().unwrap_or(0) as f64;
        let [low, high] = self.elevation_range;

        let mut bins: Vec<HexBin> = order
            .into_iter()
            .map(|(q, r)| {
                let count = counts[&(q, r)];
                let cx = size * sqrt3 * (q as f64 + r as f64 / 2.0);
                let cy = size * 1.5 * r as f64;
                let t = if max > min {
                    (count as f64 - min) / (max - min)
                } else {
                    1.0
                };
                let corners = std::array::from_fn(|i| {
                    let angle = (90.0 - 60.0 * i as f64).to_radians();
                    projection.to_geo(cx + size * angle.cos(), cy + size * angle.sin())
                });
                HexBin {
                    center: projection.to_geo(cx, cy),
                    count,
                    elevation: (low + t * (high - low)) * self.elevation_scale,
                    corners,
                }
            })
            .collect();

        bins.sort_by(|a, b| b.count.cmp(&a.count));
        bins
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meters_apart(a: GeoPoint, b: GeoPoint) -> f64 {
        let dy = (a.latitude - b.latitude) * METERS_PER_DEGREE;
        let dx = (a.longitude - b.longitude)
            * METERS_PER_DEGREE
            * a.latitude.to_radians().cos();
        (dx * dx + dy * dy).sqrt()
    }

    #[test]
    fn test_empty_input_has_no_bins() {
        assert!(HexagonLayer::default().aggregate(&[]).is_empty());
    }

    #[test]
    fn test_nearby_points_share_a_bin() {
        let layer = HexagonLayer::default();
        let base = GeoPoint::new(40.7128, -74.0060);
        let near = GeoPoint::new(40.71281, -74.00601);
        let far = GeoPoint::new(40.7300, -74.0060);

        let bins = layer.aggregate(&[base, near, far]);
        assert_eq!(bins.len(), 2);
        assert_eq!(bins[0].count, 2);
        assert_eq!(bins[1].count, 1);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 3);
        assert!(meters_apart(bins[0].center, base) <= layer.radius_m);
    }

    #[test]
    fn test_elevation_scales_with_count() {
        let layer = HexagonLayer::default();
        let base = GeoPoint::new(40.7128, -74.0060);
        let far = GeoPoint::new(40.7500, -73.9500);
        let bins = layer.aggregate(&[base, base, base, far]);

        assert_eq!(bins[0].elevation, 1000.0 * 4.0);
        assert_eq!(bins[1].elevation, 0.0);

        let single = layer.aggregate(&[base]);
        assert_eq!(single[0].elevation, 4000.0);
    }

    #[test]
    fn test_corners_lie_on_radius() {
        let layer = HexagonLayer {
            radius_m: 250.0,
            ..HexagonLayer::default()
        };
        let bins = layer.aggregate(&[GeoPoint::new(40.7128, -74.0060)]);
        for corner in bins[0].corners {
            let d = meters_apart(bins[0].center, corner);
            assert!((d - 250.0).abs() < 1.0, "corner at {d} m");
        }
    }
}
