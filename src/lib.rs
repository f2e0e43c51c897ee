pub mod api;
pub mod app;
pub mod climate;
pub mod config;
pub mod dpclim_client;
pub mod fetch_error;
pub mod recent_searches;
pub mod services;
pub mod utils;
