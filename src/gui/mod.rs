//! GUI module - User interface components

mod app;
mod control_panel;
mod view_panel;

pub use app::DashboardApp;
pub use control_panel::{ControlPanel, ControlPanelAction};
pub use view_panel::ViewPanel;
