//! app.rs
//! Rutas de la aplicación. Cada worker HTTP la configura al arrancar.
use crate::config::app_config::AppConfig;
use crate::handlers::{health_handler, operation_handler, report_handler};
use crate::services::operation_service::OperationService;
use crate::services::report_service::ReportService;
use actix_web::dev::Server;
use actix_web::{middleware, web, App, HttpServer};

/// Servidor HTTP en `BIND_HOST:PORT` con un número fijo de workers.
pub fn build_server(
    config: AppConfig,
    report_service: ReportService,
    operation_service: OperationService,
) -> std::io::Result<Server> {
    let bind = (config.bind_host.clone(), config.port);
    let workers = config.workers.max(1);
    log::info!("Levantando servidor en {}:{} con {} workers", bind.0, bind.1, workers);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(web::Data::new(report_service.clone()))
            .app_data(web::Data::new(operation_service.clone()))
            .app_data(web::Data::new(config.clone()))
            .configure(init_app)
    })
    .workers(workers)
    .bind(bind)?
    .run();

    Ok(server)
}

pub fn init_app(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(report_handler::index_endpoint))
        .route("/upload", web::post().to(report_handler::upload_endpoint))
        .route("/health", web::get().to(health_handler::health_endpoint))
        .service(
            web::scope("/api")
                .service(
                    web::scope("/operations")
                        .route(
                            "",
                            web::get().to(operation_handler::list_operations_endpoint),
                        )
                        .route(
                            "/{id}",
                            web::get().to(operation_handler::get_operation_endpoint),
                        ),
                )
                .service(
                    web::scope("/reports").route(
                        "/{file_name}",
                        web::get().to(report_handler::serve_report_endpoint),
                    ),
                ),
        );
}
