//! logger.rs
//! Configuración del logger usando env_logger.

/// Nivel por defecto si no hay `RUST_LOG`; sqlx registra cada consulta en info
const DEFAULT_FILTER: &str = "info,sqlx=warn";

pub fn init_logger() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_FILTER.to_string());

    // try_init: en tests se puede llamar más de una vez
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter))
        .format_timestamp_secs()
        .try_init();
}
