use dotenv::dotenv;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;

use ppt_report_service::app;
use ppt_report_service::batch;
use ppt_report_service::config::app_config::AppConfig;
use ppt_report_service::logger::init_logger;
use ppt_report_service::services::operation_service::OperationService;
use ppt_report_service::services::report_service::ReportService;

async fn setup_database(config: &AppConfig) -> Pool<Sqlite> {
    // 1) Crear carpeta de datos
    std::fs::create_dir_all(&config.data_dir).expect("No se pudo crear directorio de datos");

    log::info!("Conectando a SQLite en {}", config.database_url);

    // 2) Conectarnos con SQLx (crea el archivo si no existe)
    let options = SqliteConnectOptions::from_str(&config.database_url)
        .expect("DATABASE_URL inválida")
        .create_if_missing(true);

    SqlitePoolOptions::new()
        .connect_with(options)
        .await
        .expect("No se pudo conectar a la base de datos SQLite.")
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok(); // Cargar .env al inicio
    init_logger();

    let config = AppConfig::from_env().expect("Configuración inválida");

    // Conectarnos a la DB
    let db_pool = setup_database(&config).await;

    // OperationService
    let operation_service = OperationService::new(db_pool.clone());
    if let Err(e) = operation_service.run_migrations().await {
        panic!("Fallo en migraciones de 'operations': {:?}", e);
    }

    // ReportService
    let report_service = ReportService::new(&config).expect("No se pudo inicializar ReportService");

    if std::env::args().nth(1).as_deref() == Some("batch") {
        return match batch::run(&config, &report_service, &operation_service).await {
            Ok(output) => {
                log::info!("Reporte batch generado en {:?}", output);
                Ok(())
            }
            Err(e) => {
                log::error!("Modo batch terminó con error: {:#}", e);
                std::process::exit(1)
            }
        };
    }

    // Levantar servidor
    app::build_server(config, report_service, operation_service)?.await
}
