//! Collision Explorer - NYC Motor Vehicle Collisions Dashboard
//!
//! Loads the city's collision records once and explores them through five
//! filtered views: overview, injuries map, collisions by time, dangerous
//! streets and raw data.

pub mod charts;
pub mod config;
pub mod data;
pub mod gui;
pub mod logging;
pub mod stats;
pub mod views;
