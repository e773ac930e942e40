//! models/operation_model.rs
//! Historial de generaciones de reportes (tabla `operations`).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationStatus {
    Pending,
    Done,
    Failed,
}

impl OperationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationStatus::Pending => "pending",
            OperationStatus::Done => "done",
            OperationStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OperationRecord {
    pub id: String,
    pub operation_type: String,
    pub status: String, // "pending", "done", "failed"
    pub source_file: Option<String>,
    pub output_file: Option<String>,
    pub error_message: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub metadata: Option<String>, // JSON adicional
}

/// Request para crear una operación
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOperationRequest {
    // "upload_report", "batch_report"
    pub operation_type: String,
    pub source_file: Option<String>,
    pub metadata: Option<String>,
}

/// Para listar operaciones con paginación
#[derive(Debug, Clone, Serialize)]
pub struct ListOperationsResponse {
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
    pub items: Vec<OperationRecord>,
}
