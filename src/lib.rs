//! Roadside assistance marketplace: customers post breakdown requests,
//! garages claim and work them through to completion.

pub mod api;
pub mod app;
pub mod app_state;
pub mod client;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod middleware;
pub mod services;
pub mod utils;

pub use app::build_app;
pub use app_state::AppState;
pub use config::Config;
