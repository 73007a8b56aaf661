pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod listing;
pub mod resources;
pub mod state;
pub mod store;
pub mod validation;
