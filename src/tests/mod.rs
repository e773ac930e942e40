//! tests/mod.rs
//! Pruebas unitarias y de integración del servicio.


mod operation_tests;
mod report_tests;
mod table_tests;
mod utils_tests;
