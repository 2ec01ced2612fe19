//! HTTP API handlers for georisk-ra

pub mod health;
pub mod risk_report;
pub mod ui;

pub use health::health_routes;
pub use risk_report::report_routes;
pub use ui::ui_routes;
