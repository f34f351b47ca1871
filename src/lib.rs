pub mod api;
pub mod commands;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod holders;
pub mod models;
pub mod monitor;
pub mod notifier;
pub mod parser;
pub mod store;
