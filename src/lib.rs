//! textanchor CLI library
//!
//! Exposes the command implementations and configuration for integration testing

pub mod cli;
pub mod config;

pub use config::Config;
