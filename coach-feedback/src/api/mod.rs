//! HTTP API handlers for coach-feedback

pub mod analyze;
pub mod health;
pub mod stats;

pub use analyze::analyze_routes;
pub use health::health_routes;
pub use stats::stats_routes;
