//! utils/fiscal.rs
//! Calendario fiscal (el año fiscal empieza en agosto) y descubrimiento de hojas
//! según el periodo fiscal vigente.

use anyhow::{anyhow, Result};
use chrono::{Datelike, Months, NaiveDate};
use regex::RegexBuilder;

use crate::config::report_layout::SHEET_BASES;

/// Primer mes del año fiscal (agosto)
const FISCAL_START_MONTH: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FiscalPeriod {
    pub fiscal_year: i32,
    pub quarter: u32,
    /// Mes fiscal global (1..=12)
    pub fiscal_month: u32,
    /// Mes dentro del trimestre (1..=3)
    pub month_in_quarter: u32,
}

impl FiscalPeriod {
    pub fn from_date(date: NaiveDate) -> Self {
        let fiscal_year = if date.month() >= FISCAL_START_MONTH {
            date.year() + 1
        } else {
            date.year()
        };

        let fiscal_month = (date.month() + 12 - FISCAL_START_MONTH) % 12 + 1;
        let quarter = (fiscal_month - 1) / 3 + 1;
        let month_in_quarter = (fiscal_month - 1) % 3 + 1;

        Self {
            fiscal_year,
            quarter,
            fiscal_month,
            month_in_quarter,
        }
    }

    pub fn quarter_label(&self) -> String {
        format!("Q{}", self.quarter)
    }

    pub fn fiscal_month_label(&self) -> String {
        format!("M{}", self.fiscal_month)
    }

    pub fn month_in_quarter_label(&self) -> String {
        format!("M{}", self.month_in_quarter)
    }

    /// Dos últimos dígitos del año fiscal ("26" para FY2026)
    pub fn short_year(&self) -> String {
        format!("{:02}", self.fiscal_year.rem_euclid(100))
    }
}

/// Busca, para cada patrón requerido, la primera hoja cuyo nombre coincide
/// (sin distinguir mayúsculas). El orden del resultado es el de los patrones.
pub fn find_dynamic_sheets(sheet_names: &[String], period: &FiscalPeriod) -> Vec<String> {
    let q = regex::escape(&period.quarter_label());
    let miq = regex::escape(&period.month_in_quarter_label());

    let required_patterns = [
        "^Margins Scenarios$".to_string(),
        format!("^{} .*Exec View$", miq),
        format!("^{} {} .*Comparisons$", q, miq),
        format!("^{} Commit$", q),
    ];

    let mut matched = Vec::new();
    for pattern in &required_patterns {
        let re = match RegexBuilder::new(pattern).case_insensitive(true).build() {
            Ok(re) => re,
            Err(e) => {
                log::error!("Patrón de hoja inválido '{}': {}", pattern, e);
                continue;
            }
        };

        match sheet_names.iter().find(|name| re.is_match(name)) {
            Some(name) => matched.push(name.clone()),
            None => log::warn!("Ninguna hoja coincide con el patrón: {}", pattern),
        }
    }

    matched
}

/// Ordena las hojas identificadas según `SHEET_BASES`
/// (Exec View, Comparisons, Commit, Margins Scenarios).
pub fn order_sheets(identified: &[String]) -> Vec<String> {
    let mut ordered = Vec::new();
    let mut missing = Vec::new();

    for base in SHEET_BASES {
        match identified.iter().find(|sheet| sheet.contains(base)) {
            Some(sheet) => ordered.push(sheet.clone()),
            None => {
                log::warn!("No hay hoja para '{}'. Se omite en el PowerPoint.", base);
                missing.push(base);
            }
        }
    }

    if !missing.is_empty() {
        log::error!(
            "Faltan hojas críticas para el PowerPoint: {}. Revise el Excel fuente.",
            missing.join(", ")
        );
    }

    ordered
}

/// Prefijo "YYYYMM" esperado en el nombre del Excel fuente (mes actual + offset).
pub fn source_file_prefix(today: NaiveDate, month_offset: u32) -> Result<String> {
    let target = today
        .checked_add_months(Months::new(month_offset))
        .ok_or_else(|| anyhow!("Fecha fuera de rango al sumar {} meses", month_offset))?;
    Ok(format!("{}{:02}", target.year(), target.month()))
}

/// Etiquetas de fecha para los placeholders `{{Clave}}` de la presentación.
pub fn date_labels(today: NaiveDate) -> Vec<(&'static str, String)> {
    let period = FiscalPeriod::from_date(today);

    vec![
        ("QuarterLabel", period.quarter_label()),
        ("MonthLabel", period.month_in_quarter_label()),
        ("Date", today.format("%B %-d, %Y").to_string()),
        ("YearLabel", period.fiscal_year.to_string()),
        (
            "Title",
            format!(
                "{} & {} Fcst",
                period.month_in_quarter_label(),
                period.quarter_label()
            ),
        ),
        ("dateLabel", today.format("%m.%d.%y").to_string()),
        ("Month", today.format("%B").to_string()),
    ]
}

/// Nombre del PowerPoint generado, p.ej. "M3 Q1FY27 P&L Review ... DRAFT.pptx"
pub fn report_file_name(period: &FiscalPeriod, title_suffix: &str) -> String {
    format!(
        "{} {}FY{} {}.pptx",
        period.month_in_quarter_label(),
        period.quarter_label(),
        period.short_year(),
        title_suffix
    )
}
