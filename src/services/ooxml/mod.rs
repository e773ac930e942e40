//! services/ooxml/mod.rs
//! Piezas comunes para leer/escribir documentos Office Open XML (xlsx, pptx).

pub mod package;
pub mod xml;

/// Namespace principal de SpreadsheetML
pub const NS_SPREADSHEET: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
/// Namespace de relaciones de documento (atributos `r:id`)
pub const NS_DOC_RELATIONSHIPS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
/// Namespace de las partes `.rels`
pub const NS_PACKAGE_RELATIONSHIPS: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships";
pub const NS_CONTENT_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

/// Resuelve el `Target` de una relación a una ruta absoluta dentro del paquete.
/// `base_dir` es el directorio de la parte origen (p.ej. "xl").
pub fn resolve_target(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}
