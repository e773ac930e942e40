//! models/report_model.rs
//! Estructuras de datos del flujo Excel -> PowerPoint.

use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Valor de una celda ya resuelto (sin fórmulas).
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Number(f64),
    Text(String),
    Bool(bool),
}

impl CellValue {
    /// Valor numérico; los booleanos cuentan como 1/0.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }
}

/// Hoja leída de un libro: valores por (fila, columna) y filas/columnas ocultas.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetData {
    pub name: String,
    pub cells: BTreeMap<(u32, u32), CellValue>,
    pub hidden_rows: BTreeSet<u32>,
    pub hidden_cols: BTreeSet<u32>,
}

impl SheetData {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn cell(&self, row: u32, col: u32) -> &CellValue {
        self.cells.get(&(row, col)).unwrap_or(&CellValue::Empty)
    }

    pub fn set(&mut self, row: u32, col: u32, value: CellValue) {
        if value.is_empty() {
            self.cells.remove(&(row, col));
        } else {
            self.cells.insert((row, col), value);
        }
    }

    pub fn max_row(&self) -> u32 {
        self.cells.keys().map(|(r, _)| *r).max().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    pub sheets: Vec<SheetData>,
}

impl Workbook {
    pub fn sheet(&self, name: &str) -> Option<&SheetData> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }
}

/// Bloque rectangular extraído de una hoja (sin filas/columnas ocultas).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub rows: Vec<Vec<CellValue>>,
}

impl Table {
    pub fn nrows(&self) -> usize {
        self.rows.len()
    }

    pub fn ncols(&self) -> usize {
        self.rows.first().map(|r| r.len()).unwrap_or(0)
    }

    /// Celda `number` (1-based) recorriendo la tabla por filas.
    pub fn cell(&self, number: usize) -> Option<&CellValue> {
        let ncols = self.ncols();
        if number == 0 || ncols == 0 {
            return None;
        }
        let index = number - 1;
        let (row, col) = (index / ncols, index % ncols);
        self.rows.get(row).and_then(|r| r.get(col))
    }
}

/// Tablas de todas las hojas, aplanadas, con su prefijo de placeholder asignado.
#[derive(Debug, Clone, Default)]
pub struct TableSet {
    pub tables: Vec<Table>,
    pub prefixes: HashMap<String, usize>,
}

impl TableSet {
    pub fn table_for(&self, prefix: &str) -> Option<&Table> {
        self.prefixes.get(prefix).and_then(|i| self.tables.get(*i))
    }

    /// Valor para un placeholder `{{<prefix><number>}}`
    pub fn lookup(&self, prefix: &str, number: usize) -> Option<&CellValue> {
        self.table_for(prefix).and_then(|t| t.cell(number))
    }
}

/// Resultado de una generación.
#[derive(Debug, Clone)]
pub struct GeneratedReport {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub sheets_used: Vec<String>,
    /// Nombre del archivo guardado en disco (si `STORE_REPORTS` está activo)
    pub stored_as: Option<String>,
}
