#![allow(clippy::bool_comparison)]

pub mod alarm;
pub mod application;
pub mod client;
pub mod dashboard;
pub mod display;
pub mod monitor;
pub mod row;

pub use alarm::AlarmState;
pub use client::{FetchError, PanelClient, SnapshotSource, StatusLookup};
pub use dashboard::Dashboard;
pub use display::DisplayState;
pub use monitor::{MonitorConfig, MonitorHandle, MonitorLoop, MonitorView};
