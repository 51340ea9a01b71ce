//! Collision Dashboard Main Application
//! Main window with navigation panel and view panel.

use crate::data::{CollisionCache, CollisionTable, CsvSource, RowLimit};
use crate::gui::{ControlPanel, ControlPanelAction, ViewPanel};
use crate::views::{build_view, ViewControls, ViewKind, ViewSettings};
use egui::SidePanel;
use std::sync::mpsc::{channel, Receiver};
use std::sync::Arc;
use std::thread;
use tracing::{debug, error, info};

/// Data loading result from background thread
enum LoadResult {
    Complete(Arc<CollisionTable>),
    Error(String),
}

/// Main application window.
pub struct DashboardApp<S: CsvSource + 'static> {
    cache: Arc<CollisionCache<S>>,
    row_limit: RowLimit,
    settings: ViewSettings,
    control_panel: ControlPanel,
    view_panel: ViewPanel,

    /// Unfiltered table every view is built from.
    table: Option<Arc<CollisionTable>>,
    /// Selection the view panel currently shows.
    shown: Option<(ViewKind, ViewControls)>,

    // Async loading
    load_rx: Option<Receiver<LoadResult>>,
    is_loading: bool,
    load_failed: bool,
}

impl<S: CsvSource + 'static> DashboardApp<S> {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        cache: Arc<CollisionCache<S>>,
        row_limit: RowLimit,
        settings: ViewSettings,
    ) -> Self {
        let mut app = Self {
            cache,
            row_limit,
            settings,
            control_panel: ControlPanel::new(),
            view_panel: ViewPanel::new(),
            table: None,
            shown: None,
            load_rx: None,
            is_loading: false,
            load_failed: false,
        };
        app.start_load();
        app
    }

    /// Load the table in a background thread so the window keeps painting.
    fn start_load(&mut self) {
        if self.is_loading {
            return;
        }

        self.is_loading = true;
        self.load_failed = false;
        self.shown = None;
        self.control_panel.reload_enabled = false;
        self.control_panel
            .set_status(&format!("Loading up to {} rows...", self.row_limit));

        let (tx, rx) = channel();
        self.load_rx = Some(rx);

        let cache = Arc::clone(&self.cache);
        let row_limit = self.row_limit;
        thread::spawn(move || {
            let result = match cache.load(row_limit) {
                Ok(table) => LoadResult::Complete(table),
                Err(e) => LoadResult::Error(e.to_string()),
            };
            let _ = tx.send(result);
        });
    }

    fn handle_reload(&mut self) {
        info!(row_limit = %self.row_limit, "reload requested");
        self.cache.invalidate(self.row_limit);
        self.start_load();
    }

    /// Check for loading results
    fn check_load_results(&mut self) {
        let Some(rx) = self.load_rx.take() else {
            return;
        };

        match rx.try_recv() {
            Ok(LoadResult::Complete(table)) => {
                self.control_panel.set_status(&format!(
                    "Loaded {} collisions, {} columns",
                    table.len(),
                    table.column_names().len()
                ));
                self.table = Some(table);
                self.is_loading = false;
                self.control_panel.reload_enabled = true;
            }
            Ok(LoadResult::Error(message)) => {
                error!(error = %message, "collision data failed to load");
                self.control_panel.set_status(&format!("Error: {message}"));
                self.view_panel.set_message(message);
                self.is_loading = false;
                self.load_failed = true;
                self.control_panel.reload_enabled = true;
            }
            Err(std::sync::mpsc::TryRecvError::Empty) => self.load_rx = Some(rx),
            Err(std::sync::mpsc::TryRecvError::Disconnected) => {
                self.is_loading = false;
                self.load_failed = true;
                self.control_panel.reload_enabled = true;
                self.view_panel.set_message("Loader stopped unexpectedly");
            }
        }
    }

    /// Refetch in the background when the cached table has expired.
    fn reload_if_expired(&mut self) {
        if !self.is_loading && self.table.is_some() && self.cache.peek(self.row_limit).is_none() {
            info!(row_limit = %self.row_limit, "cached collision data expired");
            self.start_load();
        }
    }

    /// Rebuild the view when the selection differs from what is shown.
    fn refresh_view(&mut self) {
        if self.is_loading || self.load_failed {
            return;
        }
        let Some(table) = self.table.clone() else {
            return;
        };

        let controls = match self.control_panel.controls() {
            Ok(controls) => controls,
            Err(e) => {
                self.view_panel.set_message(e.to_string());
                return;
            }
        };
        let selection = (self.control_panel.selected, controls);
        if self.shown == Some(selection) {
            return;
        }

        let content = build_view(selection.0, &table, &controls, &self.settings);
        if content.is_empty_selection() {
            debug!(view = content.kind().label(), "filters selected no collisions");
        }
        self.view_panel.set_content(content);
        self.shown = Some(selection);
    }
}

impl<S: CsvSource + 'static> eframe::App for DashboardApp<S> {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Check for background results
        self.check_load_results();

        // Request repaint while loading
        if self.is_loading {
            ctx.request_repaint();
        }

        // Left panel - Navigation and filters
        SidePanel::left("control_panel")
            .min_width(260.0)
            .max_width(320.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    match self.control_panel.show(ui) {
                        ControlPanelAction::Reload => self.handle_reload(),
                        ControlPanelAction::ViewChanged | ControlPanelAction::ControlsChanged => {
                            if self.load_failed {
                                self.view_panel.clear();
                                self.start_load();
                            } else {
                                self.reload_if_expired();
                            }
                        }
                        ControlPanelAction::None => {}
                    }
                });
            });

        self.refresh_view();

        // Central panel - Selected view
        egui::CentralPanel::default().show(ctx, |ui| {
            if self.is_loading {
                ui.centered_and_justified(|ui| {
                    ui.spinner();
                });
            } else {
                self.view_panel.show(ui);
            }
        });
    }
}
