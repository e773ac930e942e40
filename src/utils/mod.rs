//! utils/mod.rs
//! Funciones puras: referencias de celdas, calendario fiscal y formato de valores.

pub mod cell_ref;
pub mod fiscal;
pub mod format;
