//! config/app_config.rs
//! Configuración del servicio leída de variables de entorno (y `.env` si existe).

use std::path::PathBuf;

use serde::Deserialize;

/// Configuración global, con valores por defecto para cada variable.
///
/// Los nombres de campo se mapean a variables en mayúsculas
/// (`ppt_template_path` -> `PPT_TEMPLATE_PATH`).
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_host")]
    pub bind_host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Workers HTTP fijos, no se escalan en caliente
    #[serde(default = "default_workers")]
    pub workers: usize,

    #[serde(default = "default_template_path")]
    pub ppt_template_path: PathBuf,
    /// Carpeta de trabajo (temporales, base de datos, reportes guardados)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_database_url")]
    pub database_url: String,

    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: usize,
    #[serde(default = "default_max_concurrent_reports")]
    pub max_concurrent_reports: usize,
    #[serde(default = "default_report_timeout_secs")]
    pub report_timeout_secs: u64,

    #[serde(default = "default_title_suffix")]
    pub report_title_suffix: String,
    /// Meses a sumar a la fecha actual para el prefijo YYYYMM del Excel fuente
    #[serde(default = "default_source_month_offset")]
    pub source_month_offset: u32,
    /// Guarda una copia de cada reporte en `<data_dir>/reports`
    #[serde(default)]
    pub store_reports: bool,

    #[serde(default = "default_batch_source_dir")]
    pub batch_source_dir: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_workers() -> usize {
    4
}

fn default_template_path() -> PathBuf {
    PathBuf::from("FINAL_PowerPoint_Template.pptx")
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_database_url() -> String {
    "sqlite:data/operations.db".to_string()
}

fn default_max_upload_mb() -> usize {
    50
}

fn default_max_concurrent_reports() -> usize {
    4
}

fn default_report_timeout_secs() -> u64 {
    300
}

fn default_title_suffix() -> String {
    "P&L Review_Cisco Highly Confidential _WD-1 DRAFT".to_string()
}

fn default_source_month_offset() -> u32 {
    5
}

fn default_batch_source_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            bind_host: default_host(),
            port: default_port(),
            workers: default_workers(),
            ppt_template_path: default_template_path(),
            data_dir: default_data_dir(),
            database_url: default_database_url(),
            max_upload_mb: default_max_upload_mb(),
            max_concurrent_reports: default_max_concurrent_reports(),
            report_timeout_secs: default_report_timeout_secs(),
            report_title_suffix: default_title_suffix(),
            source_month_offset: default_source_month_offset(),
            store_reports: false,
            batch_source_dir: default_batch_source_dir(),
            output_dir: default_output_dir(),
        }
    }
}

impl AppConfig {
    /// Carga `.env` (si existe) y luego las variables de entorno.
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenv::dotenv().ok();
        envy::from_env::<AppConfig>()
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }

    pub fn temp_dir(&self) -> PathBuf {
        self.data_dir.join("tmp")
    }

    pub fn reports_dir(&self) -> PathBuf {
        self.data_dir.join("reports")
    }
}
