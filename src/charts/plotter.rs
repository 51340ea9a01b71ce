//! Chart Plotter Module
//! Draws maps, charts and tables for the dashboard views using egui_plot.

use crate::charts::hexagon::HexBin;
use crate::data::{AffectedType, CollisionTable, GeoPoint, MinuteHistogram, StreetCount};
use crate::stats::ColumnSummary;
use egui::{Color32, RichText, ScrollArea};
use egui_plot::{Bar, BarChart, Legend, Plot, PlotPoints, Points, Polygon};

pub const POINT_COLOR: Color32 = Color32::from_rgb(200, 30, 0);
pub const BAR_COLOR: Color32 = Color32::from_rgb(99, 110, 250);

/// Hexagon fill ramp, least to most populated.
pub const HEX_RAMP: [Color32; 6] = [
    Color32::from_rgb(1, 152, 189),
    Color32::from_rgb(73, 227, 206),
    Color32::from_rgb(216, 254, 181),
    Color32::from_rgb(254, 237, 177),
    Color32::from_rgb(254, 173, 84),
    Color32::from_rgb(209, 55, 78),
];

const MAP_HEIGHT: f32 = 420.0;
const CHART_HEIGHT: f32 = 400.0;
/// Half extent of a map view around its center, in degrees.
const MAP_SPAN: f64 = 0.12;

/// Creates map and chart visualizations using egui_plot.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Ramp color for a bin, by its share of the tallest elevation.
    pub fn hex_color(elevation: f64, max_elevation: f64) -> Color32 {
        if max_elevation <= 0.0 {
            return HEX_RAMP[0];
        }
        let t = (elevation / max_elevation).clamp(0.0, 1.0);
        let idx = (t * (HEX_RAMP.len() - 1) as f64).round() as usize;
        HEX_RAMP[idx]
    }

    /// Scatter map of collision locations. Longitude on x, latitude on y.
    pub fn draw_point_map(ui: &mut egui::Ui, id: &str, points: &[GeoPoint]) {
        if points.is_empty() {
            ui.label(RichText::new("No collisions match the current selection.").italics());
        }

        let plot_points: PlotPoints = points.iter().map(|p| [p.longitude, p.latitude]).collect();

        Plot::new(id)
            .height(MAP_HEIGHT)
            .data_aspect(1.0)
            .x_axis_label("Longitude")
            .y_axis_label("Latitude")
            .legend(Legend::default())
            .show(ui, |plot_ui| {
                plot_ui.points(
                    Points::new(plot_points)
                        .radius(1.5)
                        .color(POINT_COLOR.gamma_multiply(0.7))
                        .name(format!("{} collisions", points.len())),
                );
            });
    }

    /// Hexagon density map centered on `center`.
    pub fn draw_hexagon_map(ui: &mut egui::Ui, bins: &[HexBin], center: GeoPoint) {
        if bins.is_empty() {
            ui.label(RichText::new("No collisions in this hour.").italics());
        }

        let max_elevation = bins.iter().map(|b| b.elevation).fold(0.0, f64::max);

        Plot::new("hexagon_map")
            .height(MAP_HEIGHT)
            .data_aspect(1.0)
            .x_axis_label("Longitude")
            .y_axis_label("Latitude")
            .include_x(center.longitude - MAP_SPAN)
            .include_x(center.longitude + MAP_SPAN)
            .include_y(center.latitude - MAP_SPAN)
            .include_y(center.latitude + MAP_SPAN)
            .show(ui, |plot_ui| {
                // Draw sparse bins first so dense ones stay on top.
                for bin in bins.iter().rev() {
                    let color = Self::hex_color(bin.elevation, max_elevation);
                    let corners: PlotPoints = bin
                        .corners
                        .iter()
                        .map(|c| [c.longitude, c.latitude])
                        .collect();
                    plot_ui.polygon(
                        Polygon::new(corners)
                            .fill_color(color.gamma_multiply(0.8))
                            .stroke(egui::Stroke::new(0.5, color)),
                    );
                }
            });

        if let Some(top) = bins.first() {
            ui.label(
                RichText::new(format!(
                    "{} hexagons, densest holds {} collisions",
                    bins.len(),
                    top.count
                ))
                .size(11.0)
                .color(Color32::GRAY),
            );
        }
    }

    /// Bar chart of collisions per minute of the hour.
    pub fn draw_minute_chart(ui: &mut egui::Ui, histogram: &MinuteHistogram) {
        let bars: Vec<Bar> = histogram
            .pairs()
            .map(|(minute, count)| {
                Bar::new(minute as f64, count as f64)
                    .width(0.8)
                    .name(format!("minute {minute}: {count} crashes"))
            })
            .collect();

        Plot::new("minute_chart")
            .height(CHART_HEIGHT)
            .x_axis_label("Minute of the Hour")
            .y_axis_label("Number of Collisions")
            .include_x(-1.0)
            .include_x(60.0)
            .include_y(0.0)
            .allow_scroll(false)
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(BarChart::new(bars).color(BAR_COLOR).name("Collisions"));
            });
    }

    /// Descriptive statistics, one row per numeric column.
    pub fn draw_summary_table(ui: &mut egui::Ui, summaries: &[ColumnSummary]) {
        let fmt = |v: f64| {
            if v.is_nan() {
                "-".to_string()
            } else {
                format!("{v:.3}")
            }
        };

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                egui::Grid::new("summary_table")
                    .striped(true)
                    .min_col_width(70.0)
                    .spacing([8.0, 4.0])
                    .show(ui, |ui| {
                        for header in
                            ["Column", "Count", "Mean", "Std", "Min", "25%", "50%", "75%", "Max"]
                        {
                            ui.label(RichText::new(header).strong().size(11.0));
                        }
                        ui.end_row();

                        for s in summaries {
                            ui.label(RichText::new(&s.column).size(11.0));
                            ui.label(RichText::new(s.count.to_string()).size(11.0));
                            for v in [s.mean, s.std, s.min, s.p25, s.median, s.p75, s.max] {
                                ui.label(RichText::new(fmt(v)).size(11.0));
                            }
                            ui.end_row();
                        }
                    });
            });
    }

    /// Ranked streets for an affected type.
    pub fn draw_street_table(ui: &mut egui::Ui, affected: AffectedType, streets: &[StreetCount]) {
        if streets.is_empty() {
            ui.label(RichText::new(format!("No injured {} recorded.", affected)).italics());
            return;
        }

        egui::Grid::new("street_table")
            .striped(true)
            .min_col_width(60.0)
            .spacing([12.0, 4.0])
            .show(ui, |ui| {
                ui.label(RichText::new("#").strong());
                ui.label(RichText::new("on_street_name").strong());
                ui.label(RichText::new(affected.column()).strong());
                ui.end_row();

                for (rank, entry) in streets.iter().enumerate() {
                    ui.label((rank + 1).to_string());
                    ui.label(&entry.street);
                    ui.label(entry.count.to_string());
                    ui.end_row();
                }
            });
    }

    /// Grid of records. Only visible rows are laid out.
    pub fn draw_record_grid(ui: &mut egui::Ui, id: &str, table: &CollisionTable, max_height: f32) {
        let columns = table.column_names();
        let row_height = ui.text_style_height(&egui::TextStyle::Body) + 4.0;

        ScrollArea::both()
            .id_salt(id)
            .max_height(max_height)
            .auto_shrink([false, true])
            .show_rows(ui, row_height, table.len(), |ui, row_range| {
                egui::Grid::new(format!("{id}_grid"))
                    .striped(true)
                    .min_col_width(90.0)
                    .show(ui, |ui| {
                        for name in &columns {
                            ui.label(RichText::new(name).strong().size(11.0));
                        }
                        ui.end_row();

                        for record in &table.records()[row_range] {
                            for cell in record.display_cells() {
                                ui.label(RichText::new(cell).size(11.0));
                            }
                            ui.end_row();
                        }
                    });
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_color_ramp_ends() {
        assert_eq!(ChartPlotter::hex_color(0.0, 4000.0), HEX_RAMP[0]);
        assert_eq!(ChartPlotter::hex_color(4000.0, 4000.0), HEX_RAMP[5]);
        assert_eq!(ChartPlotter::hex_color(2000.0, 4000.0), HEX_RAMP[3]);
        assert_eq!(ChartPlotter::hex_color(10.0, 0.0), HEX_RAMP[0]);
    }
}
