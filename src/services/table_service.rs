//! services/table_service.rs
//! Extracción de las regiones fijas de cada hoja como tablas y asignación de
//! prefijos de placeholder.

use crate::config::report_layout::{regions_for_sheet, PREFIX_ORDER};
use crate::models::report_model::{CellValue, SheetData, Table, TableSet, Workbook};
use crate::utils::cell_ref::CellRange;

/// Tablas de una hoja, en el orden de sus regiones
pub type SheetTables = (String, Vec<Table>);

/// Rectángulo de la hoja sin las filas ni columnas ocultas.
/// Las celdas vacías se devuelven como texto vacío.
pub fn extract_table(sheet: &SheetData, range: &CellRange) -> Table {
    let rows = (range.first_row..=range.last_row)
        .filter(|r| !sheet.hidden_rows.contains(r))
        .map(|r| {
            (range.first_col..=range.last_col)
                .filter(|c| !sheet.hidden_cols.contains(c))
                .map(|c| match sheet.cell(r, c) {
                    CellValue::Empty => CellValue::Text(String::new()),
                    other => other.clone(),
                })
                .collect()
        })
        .collect();

    Table { rows }
}

/// Carga las tablas de las hojas ordenadas. Las hojas que no están en el libro
/// o sin regiones definidas se omiten.
pub fn load_tables(workbook: &Workbook, ordered_sheets: &[String]) -> Vec<SheetTables> {
    let mut all_tables = Vec::new();

    for sheet_name in ordered_sheets {
        let Some(sheet) = workbook.sheet(sheet_name) else {
            log::warn!("Hoja '{}' no encontrada al cargar tablas. Se omite.", sheet_name);
            continue;
        };
        let Some(regions) = regions_for_sheet(sheet_name) else {
            log::warn!("Sin regiones definidas para la hoja '{}'", sheet_name);
            continue;
        };

        let mut tables = Vec::with_capacity(regions.len());
        for (start, end) in regions {
            match CellRange::parse(start, end) {
                Ok(range) => tables.push(extract_table(sheet, &range)),
                Err(e) => log::error!(
                    "Error leyendo el rango {}:{} de la hoja '{}': {:?}",
                    start,
                    end,
                    sheet_name,
                    e
                ),
            }
        }

        all_tables.push((sheet_name.clone(), tables));
    }

    all_tables
}

/// Aplana las tablas y les asigna prefijos según `PREFIX_ORDER`.
/// Las tablas sobrantes se descartan.
pub fn assign_prefixes(sheets: Vec<SheetTables>) -> TableSet {
    let mut set = TableSet::default();

    for (sheet_name, tables) in sheets {
        for table in tables {
            match PREFIX_ORDER.get(set.tables.len()) {
                Some(prefix) => {
                    set.prefixes.insert(prefix.to_string(), set.tables.len());
                    set.tables.push(table);
                }
                None => log::warn!(
                    "Hay más tablas que prefijos de placeholder. Se omite una tabla de la hoja {}.",
                    sheet_name
                ),
            }
        }
    }

    set
}
