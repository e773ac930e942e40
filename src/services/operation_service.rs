use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{Pool, Sqlite};
use uuid::Uuid;

use crate::models::operation_model::{
    CreateOperationRequest, ListOperationsResponse, OperationRecord, OperationStatus,
};

/// Máximo de elementos por página en el listado
const MAX_PAGE_SIZE: u64 = 100;

#[derive(Clone, Debug)]
pub struct OperationService {
    db_pool: Pool<Sqlite>,
}

impl OperationService {
    pub fn new(db_pool: Pool<Sqlite>) -> Self {
        OperationService { db_pool }
    }

    /// Corre migraciones con sqlx
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.db_pool)
            .await
            .context("Fallo en migraciones de 'operations'")?;
        Ok(())
    }

    /// Crea la operación en DB con estado "pending" y devuelve su id
    pub async fn create_operation(&self, req: CreateOperationRequest) -> Result<String> {
        let op_id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO operations (
                id, operation_type, status, source_file, output_file,
                error_message, created_at, updated_at, metadata
            )
            VALUES (?1, ?2, ?3, ?4, NULL, NULL, ?5, ?5, ?6)
            "#,
        )
        .bind(&op_id)
        .bind(&req.operation_type)
        .bind(OperationStatus::Pending.as_str())
        .bind(&req.source_file)
        .bind(&now)
        .bind(&req.metadata)
        .execute(&self.db_pool)
        .await
        .context("Fallo al insertar operation")?;

        Ok(op_id)
    }

    pub async fn mark_operation_done(
        &self,
        op_id: &str,
        output_file: &str,
        metadata: Option<String>,
    ) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            r#"
            UPDATE operations
            SET status = ?2,
                output_file = ?3,
                metadata = COALESCE(?4, metadata),
                updated_at = ?5
            WHERE id = ?1
            "#,
        )
        .bind(op_id)
        .bind(OperationStatus::Done.as_str())
        .bind(output_file)
        .bind(metadata)
        .bind(now)
        .execute(&self.db_pool)
        .await
        .context("Fallo al actualizar operación")?;

        Ok(())
    }

    pub async fn mark_operation_failed(&self, op_id: &str, error: String) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            r#"
            UPDATE operations
            SET status = ?2,
                error_message = ?3,
                updated_at = ?4
            WHERE id = ?1
            "#,
        )
        .bind(op_id)
        .bind(OperationStatus::Failed.as_str())
        .bind(error)
        .bind(now)
        .execute(&self.db_pool)
        .await
        .context("Failed to update operation status")?;

        Ok(())
    }

    /// Obtiene la info de una operación
    pub async fn get_operation(&self, op_id: &str) -> Result<Option<OperationRecord>> {
        let record = sqlx::query_as::<_, OperationRecord>(
            r#"
            SELECT
                id, operation_type, status, source_file, output_file,
                error_message, created_at, updated_at, metadata
            FROM operations
            WHERE id = ?1
            "#,
        )
        .bind(op_id)
        .fetch_optional(&self.db_pool)
        .await
        .context("Error consultando operación")?;

        Ok(record)
    }

    /// Lista operaciones con paginación (más recientes primero),
    /// opcionalmente filtradas por estado
    pub async fn list_operations(
        &self,
        page: u64,
        page_size: u64,
        status: Option<OperationStatus>,
    ) -> Result<ListOperationsResponse> {
        let page = page.max(1);
        let page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        let offset = i64::try_from(page.saturating_sub(1).saturating_mul(page_size))
            .unwrap_or(i64::MAX);
        let status = status.map(|s| s.as_str());

        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM operations WHERE (?1 IS NULL OR status = ?1)")
                .bind(status)
                .fetch_one(&self.db_pool)
                .await
                .context("Error contando operaciones")?;

        let items = sqlx::query_as::<_, OperationRecord>(
            r#"
            SELECT
                id, operation_type, status, source_file, output_file,
                error_message, created_at, updated_at, metadata
            FROM operations
            WHERE (?1 IS NULL OR status = ?1)
            ORDER BY created_at DESC
            LIMIT ?2 OFFSET ?3
            "#,
        )
        .bind(status)
        .bind(page_size as i64)
        .bind(offset)
        .fetch_all(&self.db_pool)
        .await
        .context("Error listando operaciones")?;

        Ok(ListOperationsResponse {
            total: total as u64,
            page,
            page_size,
            items,
        })
    }
}
