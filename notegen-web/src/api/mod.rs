//! HTTP API handlers for notegen-web

pub mod form;
pub mod health;
pub mod notes;
pub mod settings;
pub mod ui;

pub use health::health_routes;
pub use notes::{note_routes, run_one, upload};
pub use settings::settings_routes;
pub use ui::{serve_app_js, serve_index};
