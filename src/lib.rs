pub mod app_state;
pub mod client;
pub mod config;
pub mod database;
pub mod models;
pub mod panel;
pub mod routes;
pub mod security;

pub use app_state::AppState;
pub use config::{Config, PanelConfig};
