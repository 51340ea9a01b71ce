//! Collision Explorer desktop entry point.

use anyhow::Context;
use collision_explorer::config::DashboardConfig;
use collision_explorer::data::{CollisionCache, HttpCsvSource};
use collision_explorer::gui::DashboardApp;
use collision_explorer::logging;
use collision_explorer::views::ViewSettings;
use eframe::egui;
use std::sync::Arc;
use tracing::info;

fn main() -> anyhow::Result<()> {
    logging::init_tracing();

    let (config, config_path) = DashboardConfig::load()?;
    match &config_path {
        Some(path) => info!(path = %path.display(), "using config file"),
        None => info!("using default configuration"),
    }

    let row_limit = config.row_limit()?;
    let source = HttpCsvSource::new(
        config.data_url.clone(),
        config.fetch_timeout(),
        config.fetch_retries,
    )
    .context("failed to build HTTP client")?;
    let cache = Arc::new(CollisionCache::new(source).with_ttl(config.cache_ttl()));
    let settings = ViewSettings {
        default_center: config.default_center.into(),
        hexagon: config.hexagon,
        preview_rows: config.preview_rows,
    };

    // Configure native options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([1000.0, 700.0])
            .with_title("NYC Motor Vehicle Collisions"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native(
        "NYC Motor Vehicle Collisions",
        options,
        Box::new(move |cc| Ok(Box::new(DashboardApp::new(cc, cache, row_limit, settings)))),
    )
    .map_err(|e| anyhow::anyhow!("dashboard window failed: {e}"))
}
