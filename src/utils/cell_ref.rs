//! utils/cell_ref.rs
//! Conversión entre referencias de celda estilo Excel ("AB12") y coordenadas (fila, columna).

use anyhow::{anyhow, Result};

/// Convierte "A1" / "ab10" en (fila, columna), ambas 1-based.
pub fn coordinate_to_tuple(cell_ref: &str) -> Result<(u32, u32)> {
    let split = cell_ref
        .find(|c: char| c.is_ascii_digit())
        .ok_or_else(|| anyhow!("Invalid cell reference: {}", cell_ref))?;
    let (letters, digits) = cell_ref.split_at(split);

    if letters.is_empty()
        || !letters.chars().all(|c| c.is_ascii_alphabetic())
        || !digits.chars().all(|c| c.is_ascii_digit())
    {
        return Err(anyhow!("Invalid cell reference: {}", cell_ref));
    }

    let mut col: u32 = 0;
    for c in letters.chars() {
        let value = (c.to_ascii_uppercase() as u32) - ('A' as u32) + 1;
        col = col
            .checked_mul(26)
            .and_then(|v| v.checked_add(value))
            .ok_or_else(|| anyhow!("Invalid cell reference: {}", cell_ref))?;
    }

    let row: u32 = digits
        .parse()
        .map_err(|_| anyhow!("Invalid cell reference: {}", cell_ref))?;

    Ok((row, col))
}

/// Letra(s) de columna para un índice 1-based (28 -> "AB").
pub fn column_letter(mut col: u32) -> String {
    let mut letters = Vec::new();
    while col > 0 {
        let rem = (col - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        col = (col - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Referencia completa ("C7") a partir de coordenadas.
pub fn cell_name(row: u32, col: u32) -> String {
    format!("{}{}", column_letter(col), row)
}

/// Rango rectangular inclusivo de celdas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub first_row: u32,
    pub first_col: u32,
    pub last_row: u32,
    pub last_col: u32,
}

impl CellRange {
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        let (first_row, first_col) = coordinate_to_tuple(start)?;
        let (last_row, last_col) = coordinate_to_tuple(end)?;
        if last_row < first_row || last_col < first_col {
            return Err(anyhow!("Rango invertido: {}:{}", start, end));
        }
        Ok(Self {
            first_row,
            first_col,
            last_row,
            last_col,
        })
    }
}
