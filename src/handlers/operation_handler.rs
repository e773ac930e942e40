//! handlers/operation_handler.rs
//! Historial de generaciones (sólo lectura).
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use crate::models::operation_model::OperationStatus;
use crate::services::operation_service::OperationService;

#[derive(Deserialize)]
pub struct OperationsQuery {
    page: Option<u64>,
    page_size: Option<u64>,
    /// "pending", "done" o "failed"
    status: Option<OperationStatus>,
}

fn internal_error(e: anyhow::Error) -> HttpResponse {
    log::error!("Error consultando operaciones: {:?}", e);
    HttpResponse::InternalServerError().json(json!({
        "error": "Internal server error",
        "details": format!("{:#}", e)
    }))
}

/// GET /api/operations?page=1&page_size=10&status=failed
pub async fn list_operations_endpoint(
    op_service: web::Data<OperationService>,
    query: web::Query<OperationsQuery>,
) -> HttpResponse {
    let page = query.page.unwrap_or(1);
    let page_size = query.page_size.unwrap_or(10);

    match op_service.list_operations(page, page_size, query.status).await {
        Ok(list) => HttpResponse::Ok().json(list),
        Err(e) => internal_error(e),
    }
}

/// GET /api/operations/{id}
pub async fn get_operation_endpoint(
    op_service: web::Data<OperationService>,
    path: web::Path<String>,
) -> HttpResponse {
    let op_id = path.into_inner();

    match op_service.get_operation(&op_id).await {
        Ok(Some(op_record)) => HttpResponse::Ok().json(op_record),
        Ok(None) => HttpResponse::NotFound().json(json!({
            "error": "Operation not found",
            "details": format!("No operation with id {}", op_id)
        })),
        Err(e) => internal_error(e),
    }
}
