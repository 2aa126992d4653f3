pub mod web_ui;
pub mod cli;
pub mod utils;
pub mod entities;
pub mod config;
pub mod store;
pub mod error;
