//! HTTP surface of the linkhop URL shortener.

pub mod app;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod handlers;
pub mod model;
pub mod state;

pub use app::App;
pub use config::{AppConfig, Cli};
pub use state::AppState;
