pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod release;
pub mod version;
