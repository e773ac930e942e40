//! config/mod.rs
pub mod app_config;
pub mod report_layout;
