mod health;
mod links;
mod stats;

pub use health::health_handler;
pub use links::{create_link_handler, delete_link_handler, redirect_handler};
pub use stats::{link_stats_handler, list_stats_handler};
