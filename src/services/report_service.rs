use crate::config::app_config::AppConfig;
use crate::models::report_model::GeneratedReport;
use crate::services::{excel_service, ppt_service, table_service};
use crate::utils::fiscal::{find_dynamic_sheets, order_sheets, report_file_name, FiscalPeriod};
use anyhow::{anyhow, Context, Result};
use chrono::{Local, NaiveDate};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::{Duration, Instant},
};
use tempfile::TempDir;
use tokio::{
    sync::{OwnedSemaphorePermit, Semaphore},
    time::timeout,
};
use uuid::Uuid;

/// Prefijo de carpeta temporal por generación
const TEMP_DIR_PREFIX: &str = "report_service_";
/// Nombre del libro preprocesado dentro de la carpeta temporal
const PREPROCESSED_FILE_NAME: &str = "preprocessed_data.xlsx";
/// Nombre interno del PowerPoint generado (el nombre visible va aparte)
const OUTPUT_FILE_NAME: &str = "report.pptx";
/// Tiempo máximo esperando turno
const PERMIT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug)]
struct ReportSettings {
    template_path: PathBuf,
    temp_dir: PathBuf,
    reports_dir: Option<PathBuf>,
    title_suffix: String,
    generation_timeout: Duration,
}

#[derive(Clone)]
pub struct ReportService {
    semaphore: Arc<Semaphore>,
    settings: Arc<ReportSettings>,
}

impl ReportService {
    pub fn new(config: &AppConfig) -> Result<Self> {
        // Verifica que la plantilla exista antes de aceptar peticiones
        if !config.ppt_template_path.is_file() {
            return Err(anyhow!(
                "No se encontró la plantilla PowerPoint en {:?}",
                config.ppt_template_path
            ));
        }

        let temp_dir = config.temp_dir();
        fs::create_dir_all(&temp_dir)
            .with_context(|| format!("No se pudo crear el directorio temporal {:?}", temp_dir))?;
        log::info!("Directorio temporal de la aplicación: {:?}", temp_dir);

        let reports_dir = if config.store_reports {
            let dir = config.reports_dir();
            fs::create_dir_all(&dir)
                .with_context(|| format!("No se pudo crear el directorio de reportes {:?}", dir))?;
            Some(dir)
        } else {
            None
        };

        Ok(Self {
            semaphore: Arc::new(Semaphore::new(config.max_concurrent_reports.max(1))),
            settings: Arc::new(ReportSettings {
                template_path: config.ppt_template_path.clone(),
                temp_dir,
                reports_dir,
                title_suffix: config.report_title_suffix.clone(),
                generation_timeout: Duration::from_secs(config.report_timeout_secs),
            }),
        })
    }

    pub fn reports_dir(&self) -> Option<&Path> {
        self.settings.reports_dir.as_deref()
    }

    /// Genera el PowerPoint a partir de un Excel subido (bytes en memoria).
    pub async fn generate_from_upload(
        &self,
        upload_name: &str,
        data: Vec<u8>,
    ) -> Result<GeneratedReport> {
        let start = Instant::now();
        let permit = self.acquire_permit().await?;

        let work_dir = self.create_work_dir()?;
        let source = work_dir
            .path()
            .join(format!("upload_{}", sanitize_file_name(upload_name)));
        tokio::fs::write(&source, &data)
            .await
            .with_context(|| format!("Error guardando el Excel subido en {:?}", source))?;
        log::info!("Excel subido guardado en {:?}", source);

        let mut report = self.run_blocking(source, work_dir, permit).await?;
        report.stored_as = self.store_copy(&report)?;

        log::info!("Reporte generado en {:.2} segundos.", start.elapsed().as_secs_f32());
        Ok(report)
    }

    /// Genera el PowerPoint a partir de un Excel ya presente en disco.
    pub async fn generate_from_file(&self, source: &Path) -> Result<GeneratedReport> {
        let start = Instant::now();
        let permit = self.acquire_permit().await?;

        let work_dir = self.create_work_dir()?;
        let mut report = self
            .run_blocking(source.to_path_buf(), work_dir, permit)
            .await?;
        report.stored_as = self.store_copy(&report)?;

        log::info!("Reporte generado en {:.2} segundos.", start.elapsed().as_secs_f32());
        Ok(report)
    }

    /// Turnos disponibles para generar (los ocupa también una tarea que superó el timeout).
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }

    async fn acquire_permit(&self) -> Result<OwnedSemaphorePermit> {
        timeout(PERMIT_TIMEOUT, Arc::clone(&self.semaphore).acquire_owned())
            .await
            .context("Timeout esperando permiso en ReportService")?
            .map_err(|_| anyhow!("No se pudo adquirir el semaphore"))
    }

    fn create_work_dir(&self) -> Result<TempDir> {
        tempfile::Builder::new()
            .prefix(TEMP_DIR_PREFIX)
            .tempdir_in(&self.settings.temp_dir)
            .with_context(|| {
                format!(
                    "No se pudo crear carpeta temporal en {:?}",
                    self.settings.temp_dir
                )
            })
    }

    /// Corre el pipeline (zip + XML, todo bloqueante) fuera del runtime async.
    /// La carpeta temporal y el permiso se liberan al terminar la tarea, aunque
    /// el llamador ya se haya rendido por timeout.
    async fn run_blocking(
        &self,
        source: PathBuf,
        work_dir: TempDir,
        permit: OwnedSemaphorePermit,
    ) -> Result<GeneratedReport> {
        let settings = Arc::clone(&self.settings);
        let today = Local::now().date_naive();

        let task = tokio::task::spawn_blocking(move || {
            let result = run_pipeline(
                &source,
                work_dir.path(),
                &settings.template_path,
                &settings.title_suffix,
                today,
            );
            drop(work_dir);
            drop(permit);
            result
        });

        timeout(self.settings.generation_timeout, task)
            .await
            .context("Timeout generando el reporte")?
            .context("La tarea de generación terminó de forma inesperada")?
    }

    fn store_copy(&self, report: &GeneratedReport) -> Result<Option<String>> {
        let Some(dir) = self.reports_dir() else {
            return Ok(None);
        };

        // "<uuid>_<nombre>.pptx"
        let unique_name = format!("{}_{}", Uuid::new_v4(), sanitize_file_name(&report.file_name));
        let local_path = dir.join(&unique_name);
        fs::write(&local_path, &report.bytes)
            .with_context(|| format!("No se pudo guardar el reporte en {:?}", local_path))?;

        log::info!(
            "Reporte guardado localmente en {:?} ({} bytes)",
            local_path,
            report.bytes.len()
        );
        Ok(Some(unique_name))
    }
}

/// Pipeline completo: preprocesa el Excel, extrae tablas y rellena la plantilla.
pub fn run_pipeline(
    source: &Path,
    work_dir: &Path,
    template: &Path,
    title_suffix: &str,
    today: NaiveDate,
) -> Result<GeneratedReport> {
    let period = FiscalPeriod::from_date(today);
    log::info!(
        "Periodo fiscal actual: {} {} (mes del trimestre: {})",
        period.quarter_label(),
        period.fiscal_month_label(),
        period.month_in_quarter_label()
    );

    // 1) Preprocesado
    let preprocessed = work_dir.join(PREPROCESSED_FILE_NAME);
    excel_service::preprocess(source, &preprocessed, &period)?;
    log::info!("Preprocesado del Excel completado.");

    // 2) Tablas
    let workbook = excel_service::load_workbook(&preprocessed)?;
    let sheet_names = workbook.sheet_names();
    log::info!("Hojas del Excel preprocesado: {:?}", sheet_names);

    let file_name = report_file_name(&period, title_suffix);
    log::info!("Nombre del PowerPoint final: '{}'.", file_name);

    let identified = find_dynamic_sheets(&sheet_names, &period);
    log::info!("Hojas identificadas para el PowerPoint: {:?}", identified);
    let ordered = order_sheets(&identified);
    log::info!("Hojas ordenadas para el PowerPoint: {:?}", ordered);

    log::info!("Cargando tablas del Excel preprocesado...");
    let tables = table_service::assign_prefixes(table_service::load_tables(&workbook, &ordered));
    log::info!("Tablas cargadas ({} tablas).", tables.tables.len());

    // 3) PowerPoint
    log::info!("Actualizando la presentación PowerPoint...");
    let output = work_dir.join(OUTPUT_FILE_NAME);
    let stats = ppt_service::update_ppt(template, &output, &tables, today)?;
    log::info!(
        "PowerPoint actualizado: {} diapositivas, {} placeholders, {} párrafos de fecha, {} barras actualizadas, {} barras eliminadas",
        stats.slides,
        stats.placeholders_replaced,
        stats.date_tags_replaced,
        stats.bars_updated,
        stats.bars_removed
    );

    let bytes = fs::read(&output)
        .with_context(|| format!("Error leyendo PowerPoint final en {:?}", output))?;

    Ok(GeneratedReport {
        file_name,
        bytes,
        sheets_used: ordered,
        stored_as: None,
    })
}

/// Deja sólo el nombre base con caracteres seguros (sin rutas).
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or("");
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | ' ' | '&') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim().trim_start_matches('.').to_string();

    if cleaned.is_empty() {
        "upload.xlsx".to_string()
    } else {
        cleaned
    }
}
