//! services/mod.rs
//! Capas de negocio: lectura de Excel, tablas, PowerPoint, pipeline e historial.

pub mod excel_service;
pub mod ooxml;
pub mod operation_service;
pub mod ppt_service;
pub mod report_service;
pub mod table_service;
