//! Charts module - Map and chart rendering

pub mod hexagon;
mod plotter;

pub use hexagon::{HexBin, HexagonLayer};
pub use plotter::ChartPlotter;
