//! View Panel Widget
//! Central scrollable area drawing the content of the selected view.

use crate::charts::ChartPlotter;
use crate::views::{hour_window, ViewContent};
use egui::{Color32, RichText, ScrollArea};

const SECTION_SPACING: f32 = 15.0;
const RAW_TABLE_HEIGHT: f32 = 600.0;

/// Displays one `ViewContent`, or a message when there is none.
#[derive(Default)]
pub struct ViewPanel {
    pub content: Option<ViewContent>,
    pub message: Option<String>,
}

impl ViewPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_content(&mut self, content: ViewContent) {
        self.content = Some(content);
        self.message = None;
    }

    /// Replace the content with a user-visible message.
    pub fn set_message(&mut self, message: impl Into<String>) {
        self.content = None;
        self.message = Some(message.into());
    }

    pub fn clear(&mut self) {
        self.content = None;
        self.message = None;
    }

    pub fn show(&self, ui: &mut egui::Ui) {
        Self::draw_header(ui);

        let Some(content) = &self.content else {
            let text = self.message.as_deref().unwrap_or("No Data");
            let color = if self.message.is_some() {
                Color32::from_rgb(220, 53, 69)
            } else {
                Color32::GRAY
            };
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new(text).size(18.0).color(color));
            });
            return;
        };

        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| Self::draw_content(ui, content));
    }

    fn draw_header(ui: &mut egui::Ui) {
        ui.label(
            RichText::new("Motor Vehicle Collisions in New York City 🚗")
                .size(26.0)
                .strong(),
        );
        ui.label(
            RichText::new(
                "A dashboard for analysing motor vehicle collisions in NYC. \
                 Use the sliders and dropdowns to filter data and visualise the results.",
            )
            .size(12.0)
            .color(Color32::GRAY),
        );
        ui.add_space(SECTION_SPACING);
    }

    fn section(ui: &mut egui::Ui, title: &str) {
        ui.add_space(SECTION_SPACING);
        ui.label(RichText::new(title).size(18.0).strong());
        ui.add_space(5.0);
    }

    fn draw_content(ui: &mut egui::Ui, content: &ViewContent) {
        match content {
            ViewContent::Overview {
                summary,
                preview,
                points,
            } => {
                ui.label(
                    RichText::new(
                        "Navigate to the various sections using the sidebar. \
                         Use the sliders and dropdowns to filter data and visualise the results.",
                    )
                    .size(14.0),
                );
                Self::section(ui, "Summary Statistics");
                ChartPlotter::draw_summary_table(ui, summary);
                Self::section(ui, "Sample Data");
                ChartPlotter::draw_record_grid(ui, "preview", preview, 200.0);
                Self::section(ui, "Map of All Collisions");
                ChartPlotter::draw_point_map(ui, "overview_map", points);
            }
            ViewContent::InjuriesMap {
                min_injured,
                points,
            } => {
                Self::section(ui, "Where are the most people injured in New York City?");
                ui.label(format!(
                    "{} collisions with at least {} people injured",
                    points.len(),
                    min_injured.get()
                ));
                ChartPlotter::draw_point_map(ui, "injuries_map", points);
            }
            ViewContent::CollisionsByTime {
                hour,
                collisions,
                center,
                hexagons,
                histogram,
            } => {
                Self::section(ui, "How many collisions occur during a given time of the day?");
                ui.label(format!(
                    "{} vehicle collisions {}",
                    collisions,
                    hour_window(*hour)
                ));
                ChartPlotter::draw_hexagon_map(ui, hexagons, *center);
                Self::section(
                    ui,
                    &format!("Breakdown by minute {}", hour_window(*hour)),
                );
                ChartPlotter::draw_minute_chart(ui, histogram);
            }
            ViewContent::DangerousStreets { affected, streets } => {
                Self::section(ui, "Top 10 Dangerous Streets by Affected Type");
                ChartPlotter::draw_street_table(ui, *affected, streets);
            }
            ViewContent::RawData { table } => {
                Self::section(ui, "Raw Data");
                ui.label(format!(
                    "{} rows, {} columns",
                    table.len(),
                    table.column_names().len()
                ));
                ChartPlotter::draw_record_grid(ui, "raw_data", table, RAW_TABLE_HEIGHT);
            }
        }
    }
}
