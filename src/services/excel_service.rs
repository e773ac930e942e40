//! services/excel_service.rs
//! Lectura de libros xlsx/xlsm directamente desde su XML, preprocesado
//! (copia de las hojas del periodo fiscal a un libro limpio) y escritura.

use std::path::Path;

use anyhow::{anyhow, Context, Result};

use crate::models::report_model::{CellValue, SheetData, Workbook};
use crate::services::ooxml::{
    self, package::OoxmlPackage, xml::XmlDocument, xml::XmlElement, NS_CONTENT_TYPES,
    NS_DOC_RELATIONSHIPS, NS_PACKAGE_RELATIONSHIPS, NS_SPREADSHEET,
};
use crate::utils::cell_ref::{cell_name, coordinate_to_tuple};
use crate::utils::fiscal::{find_dynamic_sheets, FiscalPeriod};

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";
const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";

/// Errores de Excel que se tratan como 0
const EXCEL_ERROR_STRINGS: &[&str] = &[
    "#DIV/0!", "#N/A", "#NAME?", "#NULL!", "#NUM!", "#REF!", "#VALUE!",
];

const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
const REL_WORKSHEET: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
const CT_WORKBOOK: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml";
const CT_WORKSHEET: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml";
const CT_RELATIONSHIPS: &str = "application/vnd.openxmlformats-package.relationships+xml";

#[derive(Debug, Clone)]
struct SheetRef {
    name: String,
    part: String,
}

/// Libro abierto en memoria, con la lista de hojas y los shared strings ya resueltos.
pub struct ExcelReader {
    package: OoxmlPackage,
    sheets: Vec<SheetRef>,
    shared_strings: Vec<String>,
}

impl ExcelReader {
    pub fn open(path: &Path) -> Result<Self> {
        let package = OoxmlPackage::open(path)?;
        Self::from_package(package).with_context(|| format!("Libro Excel inválido: {:?}", path))
    }

    pub fn from_package(package: OoxmlPackage) -> Result<Self> {
        let sheets = read_sheet_refs(&package)?;
        let shared_strings = read_shared_strings(&package);
        Ok(Self {
            package,
            sheets,
            shared_strings,
        })
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }

    /// Lee valores, filas ocultas y columnas ocultas de una hoja.
    pub fn read_sheet(&self, name: &str) -> Result<SheetData> {
        let sheet_ref = self
            .sheets
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| anyhow!("Sheet '{}' not found in workbook.xml.", name))?;

        let doc = self.package.xml(&sheet_ref.part)?;
        let mut sheet = SheetData::new(name);

        for row_el in doc.root.descendants("row") {
            let Some(row_attr) = row_el.attr("r") else {
                continue;
            };
            let row_num: u32 = match row_attr.parse() {
                Ok(n) => n,
                Err(_) => {
                    log::warn!(
                        "Número de fila inválido '{}' en hoja '{}'. Se omite la fila.",
                        row_attr,
                        name
                    );
                    continue;
                }
            };

            if is_true(row_el.attr("hidden")) {
                sheet.hidden_rows.insert(row_num);
            }

            for cell_el in row_el.descendants("c") {
                let Some(cell_ref) = cell_el.attr("r") else {
                    continue;
                };
                let col_num = match coordinate_to_tuple(cell_ref) {
                    Ok((_, col)) => col,
                    Err(_) => {
                        log::warn!(
                            "Referencia de celda inválida '{}' en hoja '{}'. Se omite la celda.",
                            cell_ref,
                            name
                        );
                        continue;
                    }
                };

                if let Some(value) = self.cell_value(cell_el, cell_ref, name) {
                    sheet.cells.insert((row_num, col_num), value);
                }
            }
        }

        for col_el in doc.root.descendants("col") {
            if !is_true(col_el.attr("hidden")) {
                continue;
            }
            let min = col_el.attr("min").and_then(|v| v.parse::<u32>().ok());
            let max = col_el.attr("max").and_then(|v| v.parse::<u32>().ok());
            match (min, max) {
                (Some(min), Some(max)) if min <= max => sheet.hidden_cols.extend(min..=max),
                _ => log::warn!("Definición de columna oculta inválida en hoja '{}'", name),
            }
        }

        Ok(sheet)
    }

    /// Lee todas las hojas del libro.
    pub fn read_all(&self) -> Result<Workbook> {
        let sheets = self
            .sheets
            .iter()
            .map(|s| self.read_sheet(&s.name))
            .collect::<Result<Vec<_>>>()?;
        Ok(Workbook { sheets })
    }

    fn cell_value(&self, cell: &XmlElement, cell_ref: &str, sheet: &str) -> Option<CellValue> {
        let cell_type = cell.attr("t").unwrap_or("n");

        if cell_type == "inlineStr" {
            return cell.child("is").map(|is| CellValue::Text(rich_text(is)));
        }

        let raw = cell.child("v").map(|v| v.text())?;
        if raw.is_empty() {
            return None;
        }

        if EXCEL_ERROR_STRINGS.contains(&raw.as_str()) {
            return Some(CellValue::Number(0.0));
        }

        match cell_type {
            "s" => match raw.parse::<usize>() {
                Ok(idx) => match self.shared_strings.get(idx) {
                    Some(s) => Some(CellValue::Text(s.clone())),
                    None => {
                        log::warn!(
                            "Índice de shared string {} fuera de rango en celda {} de la hoja {}.",
                            idx,
                            cell_ref,
                            sheet
                        );
                        None
                    }
                },
                Err(_) => {
                    log::warn!(
                        "Índice de shared string inválido '{}' en celda {}.",
                        raw,
                        cell_ref
                    );
                    None
                }
            },
            "b" => match raw.parse::<i64>() {
                Ok(n) => Some(CellValue::Bool(n != 0)),
                Err(_) => Some(CellValue::Text(raw)),
            },
            "n" => match raw.parse::<f64>() {
                Ok(n) => Some(CellValue::Number(n)),
                Err(_) => Some(CellValue::Text(raw)),
            },
            _ => Some(CellValue::Text(raw)),
        }
    }
}

/// Carga un libro completo desde disco.
pub fn load_workbook(path: &Path) -> Result<Workbook> {
    ExcelReader::open(path)?.read_all()
}

/// Copia a `target` las hojas del periodo fiscal presentes en `source`,
/// conservando valores, filas ocultas y columnas ocultas.
/// Devuelve los nombres de las hojas escritas.
pub fn preprocess(source: &Path, target: &Path, period: &FiscalPeriod) -> Result<Vec<String>> {
    log::info!(
        "Preprocesando Excel: origen = {:?}, destino = {:?}",
        source,
        target
    );

    let reader = ExcelReader::open(source)?;
    let required = find_dynamic_sheets(&reader.sheet_names(), period);
    log::info!("Hojas a preprocesar: {:?}", required);

    if required.len() < 4 {
        log::warn!("No se encontraron todas las hojas esperadas para el preprocesado.");
    }

    let mut out = Workbook::default();
    for name in &required {
        log::info!("Preprocesando hoja: {}", name);
        let mut sheet = match reader.read_sheet(name) {
            Ok(sheet) => sheet,
            Err(e) => {
                log::error!("Error preprocesando la hoja '{}': {:?}", name, e);
                continue;
            }
        };

        if sheet.cells.is_empty() && sheet.hidden_rows.is_empty() {
            log::warn!(
                "La hoja '{}' está vacía o no se pudo procesar. Se omite.",
                name
            );
            continue;
        }

        let max_row = sheet.max_row();
        sheet.hidden_rows.retain(|r| *r <= max_row);
        out.sheets.push(sheet);
    }

    save_workbook(&out, target)?;
    log::info!("Excel preprocesado guardado en {:?}", target);

    Ok(out.sheet_names())
}

pub fn save_workbook(workbook: &Workbook, path: &Path) -> Result<()> {
    write_workbook(workbook)?
        .save(path)
        .with_context(|| format!("Error saving target workbook {:?}", path))
}

/// Construye un paquete xlsx mínimo (strings como inline strings).
pub fn write_workbook(workbook: &Workbook) -> Result<OoxmlPackage> {
    let mut package = OoxmlPackage::new();

    let mut types = XmlElement::new("Types")
        .with_attr("xmlns", NS_CONTENT_TYPES)
        .with_child(
            XmlElement::new("Default")
                .with_attr("Extension", "rels")
                .with_attr("ContentType", CT_RELATIONSHIPS),
        )
        .with_child(
            XmlElement::new("Default")
                .with_attr("Extension", "xml")
                .with_attr("ContentType", "application/xml"),
        )
        .with_child(
            XmlElement::new("Override")
                .with_attr("PartName", format!("/{}", WORKBOOK_PART))
                .with_attr("ContentType", CT_WORKBOOK),
        );

    let mut sheets_el = XmlElement::new("sheets");
    let mut workbook_rels = XmlElement::new("Relationships").with_attr("xmlns", NS_PACKAGE_RELATIONSHIPS);
    let mut worksheets = Vec::with_capacity(workbook.sheets.len());

    for (i, sheet) in workbook.sheets.iter().enumerate() {
        let n = i + 1;
        let part = format!("xl/worksheets/sheet{}.xml", n);

        types = types.with_child(
            XmlElement::new("Override")
                .with_attr("PartName", format!("/{}", part))
                .with_attr("ContentType", CT_WORKSHEET),
        );
        sheets_el = sheets_el.with_child(
            XmlElement::new("sheet")
                .with_attr("name", sheet.name.as_str())
                .with_attr("sheetId", n.to_string())
                .with_attr("r:id", format!("rId{}", n)),
        );
        workbook_rels = workbook_rels.with_child(
            XmlElement::new("Relationship")
                .with_attr("Id", format!("rId{}", n))
                .with_attr("Type", REL_WORKSHEET)
                .with_attr("Target", format!("worksheets/sheet{}.xml", n)),
        );
        worksheets.push((part, worksheet_xml(sheet)));
    }

    let package_rels = XmlElement::new("Relationships")
        .with_attr("xmlns", NS_PACKAGE_RELATIONSHIPS)
        .with_child(
            XmlElement::new("Relationship")
                .with_attr("Id", "rId1")
                .with_attr("Type", REL_OFFICE_DOCUMENT)
                .with_attr("Target", WORKBOOK_PART),
        );

    let workbook_el = XmlElement::new("workbook")
        .with_attr("xmlns", NS_SPREADSHEET)
        .with_attr("xmlns:r", NS_DOC_RELATIONSHIPS)
        .with_child(sheets_el);

    package.set_xml("[Content_Types].xml", &XmlDocument::new(types));
    package.set_xml("_rels/.rels", &XmlDocument::new(package_rels));
    package.set_xml(WORKBOOK_PART, &XmlDocument::new(workbook_el));
    package.set_xml(WORKBOOK_RELS_PART, &XmlDocument::new(workbook_rels));
    for (part, doc) in worksheets {
        package.set_xml(&part, &doc);
    }

    Ok(package)
}

fn worksheet_xml(sheet: &SheetData) -> XmlDocument {
    let mut root = XmlElement::new("worksheet").with_attr("xmlns", NS_SPREADSHEET);

    // <cols> debe ir antes de <sheetData>
    let hidden_ranges = contiguous_ranges(sheet.hidden_cols.iter().copied());
    if !hidden_ranges.is_empty() {
        let mut cols = XmlElement::new("cols");
        for (min, max) in hidden_ranges {
            cols = cols.with_child(
                XmlElement::new("col")
                    .with_attr("min", min.to_string())
                    .with_attr("max", max.to_string())
                    .with_attr("hidden", "1"),
            );
        }
        root = root.with_child(cols);
    }

    let mut rows: std::collections::BTreeMap<u32, XmlElement> = std::collections::BTreeMap::new();
    for ((row, col), value) in &sheet.cells {
        let row_el = rows
            .entry(*row)
            .or_insert_with(|| XmlElement::new("row").with_attr("r", row.to_string()));
        if let Some(cell) = cell_xml(*row, *col, value) {
            row_el.children.push(ooxml::xml::XmlNode::Element(cell));
        }
    }
    for row in &sheet.hidden_rows {
        let row_el = rows
            .entry(*row)
            .or_insert_with(|| XmlElement::new("row").with_attr("r", row.to_string()));
        row_el.set_attr("hidden", "1");
    }

    let mut sheet_data = XmlElement::new("sheetData");
    for (_, row_el) in rows {
        sheet_data = sheet_data.with_child(row_el);
    }
    root = root.with_child(sheet_data);

    XmlDocument::new(root)
}

fn cell_xml(row: u32, col: u32, value: &CellValue) -> Option<XmlElement> {
    let cell = XmlElement::new("c").with_attr("r", cell_name(row, col));
    let cell = match value {
        CellValue::Empty => return None,
        CellValue::Number(n) => cell.with_child(XmlElement::new("v").with_text(n.to_string())),
        CellValue::Bool(b) => cell
            .with_attr("t", "b")
            .with_child(XmlElement::new("v").with_text(if *b { "1" } else { "0" })),
        CellValue::Text(s) => cell.with_attr("t", "inlineStr").with_child(
            XmlElement::new("is").with_child(
                XmlElement::new("t")
                    .with_attr("xml:space", "preserve")
                    .with_text(s.as_str()),
            ),
        ),
    };
    Some(cell)
}

fn contiguous_ranges(values: impl Iterator<Item = u32>) -> Vec<(u32, u32)> {
    let mut ranges: Vec<(u32, u32)> = Vec::new();
    for v in values {
        match ranges.last_mut() {
            Some((_, max)) if *max + 1 == v => *max = v,
            _ => ranges.push((v, v)),
        }
    }
    ranges
}

fn read_sheet_refs(package: &OoxmlPackage) -> Result<Vec<SheetRef>> {
    let workbook = package.xml(WORKBOOK_PART)?;
    let rels = package.xml(WORKBOOK_RELS_PART)?;

    let mut sheets = Vec::new();
    for sheet_el in workbook.root.descendants("sheet") {
        let name = sheet_el
            .attr("name")
            .ok_or_else(|| anyhow!("Hoja sin atributo name en workbook.xml"))?;
        let rid = sheet_el
            .attr_local("id")
            .ok_or_else(|| anyhow!("Hoja '{}' sin r:id en workbook.xml", name))?;

        let target = rels
            .root
            .children_named("Relationship")
            .find(|r| r.attr("Id") == Some(rid))
            .and_then(|r| r.attr("Target"))
            .ok_or_else(|| anyhow!("Relationship {} not in workbook.xml.rels.", rid))?;

        let part = if target.starts_with("xl/") {
            target.to_string()
        } else {
            ooxml::resolve_target("xl", target)
        };

        sheets.push(SheetRef {
            name: name.to_string(),
            part,
        });
    }

    Ok(sheets)
}

fn read_shared_strings(package: &OoxmlPackage) -> Vec<String> {
    if !package.has_part(SHARED_STRINGS_PART) {
        log::warn!("El libro no tiene sharedStrings.xml.");
        return Vec::new();
    }

    match package.xml(SHARED_STRINGS_PART) {
        Ok(doc) => doc.root.children_named("si").map(rich_text).collect(),
        Err(e) => {
            log::error!("Error cargando shared strings: {:?}", e);
            Vec::new()
        }
    }
}

/// Texto de un `<si>`/`<is>`: su `<t>` directo o la concatenación de los runs.
fn rich_text(el: &XmlElement) -> String {
    match el.child("t") {
        Some(t) => t.text(),
        None => el
            .children_named("r")
            .filter_map(|r| r.child("t"))
            .map(|t| t.text())
            .collect(),
    }
}

fn is_true(value: Option<&str>) -> bool {
    matches!(value, Some("1") | Some("true"))
}
