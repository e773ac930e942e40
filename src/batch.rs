//! batch.rs
//! Modo batch: busca el Excel del mes en disco, genera el reporte y lo deja en `OUTPUT_DIR`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use chrono::{Local, NaiveDate};
use serde_json::json;

use crate::config::app_config::AppConfig;
use crate::models::operation_model::CreateOperationRequest;
use crate::services::operation_service::OperationService;
use crate::services::report_service::ReportService;
use crate::utils::fiscal::source_file_prefix;

const SOURCE_EXTENSION: &str = "xlsm";
const PREPROCESSED_FILE_NAME: &str = "preprocessed_data.xlsx";

/// Excel fuente `{YYYYMM}*.xlsm` dentro de `dir`. Si hay varios se usa el primero por nombre.
pub fn find_source_file(dir: &Path, today: NaiveDate, month_offset: u32) -> Result<PathBuf> {
    let prefix = source_file_prefix(today, month_offset)?;
    log::info!("Buscando Excel fuente '{}*.{}' en {:?}", prefix, SOURCE_EXTENSION, dir);

    let mut matches: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("No se pudo leer el directorio {:?}", dir))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                return false;
            };
            name != PREPROCESSED_FILE_NAME
                && name.starts_with(&prefix)
                && path
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case(SOURCE_EXTENSION))
        })
        .collect();
    matches.sort();

    match matches.len() {
        0 => Err(anyhow!(
            "No se encontró Excel fuente '{}*.{}' en {:?}",
            prefix,
            SOURCE_EXTENSION,
            dir
        )),
        1 => Ok(matches.remove(0)),
        n => {
            log::warn!(
                "Se encontraron {} archivos '{}*.{}': {:?}. Se usa el primero.",
                n,
                prefix,
                SOURCE_EXTENSION,
                matches
            );
            Ok(matches.remove(0))
        }
    }
}

/// Ejecuta el pipeline completo sobre el Excel del mes y devuelve la ruta del PowerPoint.
/// Cualquier fallo posterior al registro deja la operación como `failed`.
pub async fn run(
    config: &AppConfig,
    report_service: &ReportService,
    op_service: &OperationService,
) -> Result<PathBuf> {
    let today = Local::now().date_naive();
    let source = match find_source_file(&config.batch_source_dir, today, config.source_month_offset) {
        Ok(path) => path,
        Err(e) => {
            log::error!("CRITICAL: {:#}", e);
            return Err(e);
        }
    };
    log::info!("Usando Excel fuente: {:?}", source);

    let op_id = op_service
        .create_operation(CreateOperationRequest {
            operation_type: "batch_report".to_string(),
            source_file: Some(source.to_string_lossy().into_owned()),
            metadata: None,
        })
        .await
        .context("No se pudo registrar la operación batch")?;

    match generate_to_disk(config, report_service, &source).await {
        Ok((output, sheets_used)) => {
            let metadata = json!({ "sheets_used": sheets_used }).to_string();
            op_service
                .mark_operation_done(&op_id, &output.to_string_lossy(), Some(metadata))
                .await
                .with_context(|| format!("No se pudo cerrar la operación {}", op_id))?;
            Ok(output)
        }
        Err(e) => {
            log::error!("CRITICAL: Error generando el reporte batch: {:#}", e);
            if let Err(mark_err) = op_service
                .mark_operation_failed(&op_id, format!("{:#}", e))
                .await
            {
                log::error!("No se pudo marcar la operación {} como fallida: {:?}", op_id, mark_err);
            }
            Err(e)
        }
    }
}

async fn generate_to_disk(
    config: &AppConfig,
    report_service: &ReportService,
    source: &Path,
) -> Result<(PathBuf, Vec<String>)> {
    let report = report_service.generate_from_file(source).await?;

    fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("No se pudo crear el directorio {:?}", config.output_dir))?;
    let output = config.output_dir.join(&report.file_name);
    fs::write(&output, &report.bytes)
        .with_context(|| format!("No se pudo escribir el reporte en {:?}", output))?;
    log::info!("PowerPoint final guardado en {:?}", output);

    Ok((output, report.sheets_used))
}
