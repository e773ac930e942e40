//! lib.rs
//! Servicio que genera el PowerPoint del P&L a partir de un Excel.

pub mod app;
pub mod batch;
pub mod config;
pub mod handlers;
pub mod logger;
pub mod models;
pub mod services;
pub mod utils;

#[cfg(test)]
mod tests;
