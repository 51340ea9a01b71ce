//! Control Panel Widget
//! Left side panel with view navigation and per-view filter controls.

use crate::data::processor::MAX_INJURY_THRESHOLD;
use crate::data::{AffectedType, FilterError, HourOfDay, InjuryThreshold};
use crate::views::{ViewControls, ViewKind};
use egui::{Color32, ComboBox, RichText};

/// Left side control panel with navigation, filters and data status.
pub struct ControlPanel {
    pub selected: ViewKind,
    pub min_injured: u32,
    pub hour: u32,
    pub affected: AffectedType,
    pub status: String,
    pub reload_enabled: bool,
}

impl Default for ControlPanel {
    fn default() -> Self {
        let controls = ViewControls::default();
        Self {
            selected: ViewKind::default(),
            min_injured: controls.min_injured.get(),
            hour: controls.hour.get(),
            affected: controls.affected,
            status: "Ready".to_string(),
            reload_enabled: false,
        }
    }
}

impl ControlPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current control values, validated.
    pub fn controls(&self) -> Result<ViewControls, FilterError> {
        Ok(ViewControls {
            min_injured: InjuryThreshold::new(self.min_injured)?,
            hour: HourOfDay::new(self.hour)?,
            affected: self.affected,
        })
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        // Title
        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("🚗 Collisions")
                    .size(22.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
            ui.label(RichText::new("New York City").size(11.0).color(Color32::GRAY));
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Navigation Section =====
        ui.label(RichText::new("Navigation").size(14.0).strong());
        ui.add_space(5.0);

        for kind in ViewKind::ALL {
            let text = RichText::new(format!("{}  {}", kind.icon(), kind.label())).size(14.0);
            if ui.selectable_label(self.selected == kind, text).clicked() && self.selected != kind {
                self.selected = kind;
                action = ControlPanelAction::ViewChanged;
            }
        }

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Filter Section =====
        if self.show_filters(ui) {
            action = ControlPanelAction::ControlsChanged;
        }

        // ===== Data Section =====
        ui.label(RichText::new("Data").size(14.0).strong());
        ui.add_space(5.0);

        let status_color = if self.status.contains("Error") {
            Color32::from_rgb(220, 53, 69)
        } else if self.status.starts_with("Loaded") {
            Color32::from_rgb(40, 167, 69)
        } else {
            Color32::GRAY
        };
        ui.label(RichText::new(&self.status).size(11.0).color(status_color));
        ui.add_space(8.0);

        ui.vertical_centered(|ui| {
            ui.add_enabled_ui(self.reload_enabled, |ui| {
                let button = egui::Button::new(RichText::new("⟳ Reload Data").size(14.0))
                    .min_size(egui::vec2(150.0, 30.0));
                if ui.add(button).clicked() {
                    action = ControlPanelAction::Reload;
                }
            });
        });

        action
    }

    /// Controls of the selected view. Returns true when a value changed.
    fn show_filters(&mut self, ui: &mut egui::Ui) -> bool {
        let mut changed = false;

        match self.selected {
            ViewKind::InjuriesMap => {
                ui.label(RichText::new("Filters").size(14.0).strong());
                ui.add_space(5.0);
                ui.label("Number of people injured in vehicle collisions");
                changed |= ui
                    .add(egui::Slider::new(
                        &mut self.min_injured,
                        0..=MAX_INJURY_THRESHOLD,
                    ))
                    .changed();
            }
            ViewKind::CollisionsByTime => {
                ui.label(RichText::new("Filters").size(14.0).strong());
                ui.add_space(5.0);
                ui.horizontal(|ui| {
                    ui.label("Hour to look at");
                    ComboBox::from_id_salt("hour")
                        .width(80.0)
                        .selected_text(self.hour.to_string())
                        .show_ui(ui, |ui| {
                            for hour in 0..24u32 {
                                if ui
                                    .selectable_value(&mut self.hour, hour, hour.to_string())
                                    .changed()
                                {
                                    changed = true;
                                }
                            }
                        });
                });
            }
            ViewKind::DangerousStreets => {
                ui.label(RichText::new("Filters").size(14.0).strong());
                ui.add_space(5.0);
                ui.horizontal(|ui| {
                    ui.label("Affected type of people");
                    ComboBox::from_id_salt("affected")
                        .width(120.0)
                        .selected_text(self.affected.to_string())
                        .show_ui(ui, |ui| {
                            for affected in AffectedType::ALL {
                                if ui
                                    .selectable_value(&mut self.affected, affected, affected.to_string())
                                    .changed()
                                {
                                    changed = true;
                                }
                            }
                        });
                });
            }
            ViewKind::Overview | ViewKind::RawData => return false,
        }

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);
        changed
    }

    /// Set status line
    pub fn set_status(&mut self, status: &str) {
        self.status = status.to_string();
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    ViewChanged,
    ControlsChanged,
    Reload,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_controls_are_valid() {
        let panel = ControlPanel::new();
        let controls = panel.controls().unwrap();
        assert_eq!(controls, ViewControls::default());
        assert_eq!(panel.selected, ViewKind::Overview);
    }

    #[test]
    fn test_out_of_range_controls_rejected() {
        let mut panel = ControlPanel::new();
        panel.hour = 24;
        assert!(panel.controls().is_err());
        panel.hour = 0;
        panel.min_injured = 20;
        assert!(panel.controls().is_err());
    }
}
