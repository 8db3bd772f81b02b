pub mod config;
pub mod error;
pub mod history;
pub mod infra;
pub mod output;
pub mod parser;
pub mod scoring;
pub mod services;
pub mod status;
pub mod types;
pub mod weather;
