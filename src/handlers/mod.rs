//! handlers/mod.rs
//! Handlers HTTP: formulario y subida, historial de operaciones, health.
pub mod health_handler;
pub mod operation_handler;
pub mod report_handler;
