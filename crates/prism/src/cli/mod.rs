//! Command handlers.

pub mod config;
pub mod help;
pub mod render;
pub mod serve;
