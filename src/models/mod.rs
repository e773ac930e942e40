//! models/mod.rs
//! Módulo raíz para modelos/estructuras compartidas.

pub mod operation_model;
pub mod report_model;
