//! handlers/report_handler.rs
//! Formulario de subida, generación del PowerPoint y descarga de reportes guardados.

use actix_files::NamedFile;
use actix_multipart::Multipart;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{web, HttpRequest, HttpResponse};
use bytes::BytesMut;
use futures_util::TryStreamExt;
use log::error;
use quick_xml::escape::escape;
use serde_json::json;

use crate::config::app_config::AppConfig;
use crate::models::operation_model::CreateOperationRequest;
use crate::services::operation_service::OperationService;
use crate::services::report_service::{sanitize_file_name, ReportService};

/// Campo del formulario con el Excel
pub const UPLOAD_FIELD: &str = "excel_file";

pub const PPTX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation";

const UPLOAD_FORM_HTML: &str = r#"<!doctype html>
<title>Excel to PowerPoint Automation</title>
<h1>Upload Excel File</h1>
<form method=post enctype=multipart/form-data action="/upload">
  <input type=file name=excel_file>
  <input type=submit value=Upload>
</form>
"#;

/// Página del formulario, con un mensaje opcional (escapado).
pub fn render_upload_form(message: Option<&str>) -> String {
    match message {
        Some(msg) => format!("{}<p>{}</p>\n", UPLOAD_FORM_HTML, escape(msg)),
        None => UPLOAD_FORM_HTML.to_string(),
    }
}

fn form_response(mut builder: actix_web::HttpResponseBuilder, message: &str) -> HttpResponse {
    builder
        .content_type("text/html; charset=utf-8")
        .body(render_upload_form(Some(message)))
}

/// GET /
pub async fn index_endpoint() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(render_upload_form(None))
}

struct Upload {
    file_name: String,
    data: Vec<u8>,
}

enum UploadError {
    Missing,
    TooLarge,
    Malformed(String),
}

/// Lee el multipart y devuelve el archivo del campo `excel_file`.
async fn read_upload(mut payload: Multipart, max_bytes: usize) -> Result<Upload, UploadError> {
    let mut upload = None;

    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| UploadError::Malformed(e.to_string()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let file_name = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .unwrap_or_default()
            .to_string();

        let mut data = BytesMut::new();
        while let Some(chunk) = field
            .try_next()
            .await
            .map_err(|e| UploadError::Malformed(e.to_string()))?
        {
            if data.len() + chunk.len() > max_bytes {
                return Err(UploadError::TooLarge);
            }
            data.extend_from_slice(&chunk);
        }

        upload = Some(Upload {
            file_name,
            data: data.to_vec(),
        });
    }

    upload.ok_or(UploadError::Missing)
}

/// POST /upload
/// Recibe el Excel (multipart, campo `excel_file`) y devuelve el PowerPoint generado.
pub async fn upload_endpoint(
    report_service: web::Data<ReportService>,
    op_service: web::Data<OperationService>,
    config: web::Data<AppConfig>,
    payload: Multipart,
) -> HttpResponse {
    log::info!("Petición de subida de archivo recibida.");

    let upload = match read_upload(payload, config.max_upload_bytes()).await {
        Ok(upload) => upload,
        Err(UploadError::Missing) => {
            error!("La petición no trae la parte del archivo.");
            return form_response(HttpResponse::BadRequest(), "No file selected!");
        }
        Err(UploadError::TooLarge) => {
            error!("El archivo subido supera {} MB.", config.max_upload_mb);
            return form_response(
                HttpResponse::PayloadTooLarge(),
                &format!("File too large (max {} MB).", config.max_upload_mb),
            );
        }
        Err(UploadError::Malformed(e)) => {
            error!("Petición multipart mal formada: {}", e);
            return form_response(HttpResponse::BadRequest(), "No file selected!");
        }
    };

    // El navegador manda un archivo vacío sin nombre si no se eligió nada
    if upload.file_name.is_empty() {
        error!("Archivo sin nombre.");
        return form_response(HttpResponse::BadRequest(), "No selected file!");
    }

    // El historial no debe impedir la generación
    let op_id = match op_service
        .create_operation(CreateOperationRequest {
            operation_type: "upload_report".to_string(),
            source_file: Some(upload.file_name.clone()),
            metadata: Some(json!({ "size_bytes": upload.data.len() }).to_string()),
        })
        .await
    {
        Ok(id) => Some(id),
        Err(e) => {
            error!("No se pudo registrar la operación: {:?}", e);
            None
        }
    };

    match report_service
        .generate_from_upload(&upload.file_name, upload.data)
        .await
    {
        Ok(report) => {
            if let Some(op_id) = &op_id {
                let metadata = json!({
                    "sheets_used": report.sheets_used,
                    "stored_as": report.stored_as,
                })
                .to_string();
                if let Err(e) = op_service
                    .mark_operation_done(op_id, &report.file_name, Some(metadata))
                    .await
                {
                    error!("No se pudo actualizar la operación {}: {:?}", op_id, e);
                }
            }

            let mut response = HttpResponse::Ok();
            response
                .content_type(PPTX_CONTENT_TYPE)
                .append_header(("Content-Disposition", attachment_header(&report.file_name)))
                .append_header(("Cache-Control", "no-store"));
            if let Some(op_id) = &op_id {
                response.append_header(("X-Operation-Id", op_id.as_str()));
            }
            response.body(report.bytes)
        }
        Err(e) => {
            error!("Error generando el PowerPoint: {:?}", e);
            if let Some(op_id) = &op_id {
                if let Err(mark_err) = op_service
                    .mark_operation_failed(op_id, format!("{:#}", e))
                    .await
                {
                    error!("No se pudo actualizar la operación {}: {:?}", op_id, mark_err);
                }
            }
            form_response(
                HttpResponse::InternalServerError(),
                &format!("An error occurred: {:#}", e),
            )
        }
    }
}

/// GET /api/reports/{file_name}
/// Sirve un reporte guardado en disco (sólo con `STORE_REPORTS=true`).
pub async fn serve_report_endpoint(
    req: HttpRequest,
    report_service: web::Data<ReportService>,
    path: web::Path<String>,
) -> HttpResponse {
    let file_name = path.into_inner();

    let Some(dir) = report_service.reports_dir() else {
        return HttpResponse::NotFound().json(json!({
            "error": "Report storage is disabled"
        }));
    };

    if file_name != sanitize_file_name(&file_name) || file_name.contains("..") {
        return HttpResponse::BadRequest().json(json!({
            "error": "Invalid report name"
        }));
    }

    match NamedFile::open(dir.join(&file_name)) {
        Ok(file) => file
            .set_content_disposition(ContentDisposition {
                disposition: DispositionType::Attachment,
                parameters: vec![DispositionParam::Filename(file_name)],
            })
            .into_response(&req),
        Err(_) => HttpResponse::NotFound().json(json!({
            "error": "Report not found"
        })),
    }
}

/// `attachment; filename="..."; filename*=UTF-8''...`
pub fn attachment_header(file_name: &str) -> String {
    let ascii_fallback: String = file_name
        .chars()
        .map(|c| if c.is_ascii() && c != '"' && c != '\\' { c } else { '_' })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        ascii_fallback,
        urlencoding::encode(file_name)
    )
}
