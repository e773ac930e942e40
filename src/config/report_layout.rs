//! config/report_layout.rs
//! Disposición fija del reporte: hojas base, regiones de cada hoja y orden de
//! prefijos de los placeholders de la plantilla.

/// Hojas base en el orden en que se consumen sus tablas
pub const SHEET_BASES: [&str; 4] = ["Exec View", "Comparisons", "Commit", "Margins Scenarios"];

const EXEC_VIEW_REGIONS: &[(&str, &str)] = &[
    ("C3", "E13"), ("F3", "F13"),
    ("C18", "E24"), ("F18", "F24"), ("H18", "H18"), ("H20", "H22"),
    ("C29", "E36"), ("F29", "F36"), ("H29", "H29"), ("H31", "H33"),
    ("K3", "K3"), ("K4", "N13"), ("O3", "O3"), ("R4", "R13"),
    ("S3", "S3"), ("V4", "V13"), ("W3", "W3"), ("W4", "W13"),
];

const COMPARISONS_REGIONS: &[(&str, &str)] = &[
    ("K3", "K3"), ("K4", "N13"), ("S3", "S13"), ("T3", "T3"),
    ("W4", "W13"), ("X3", "X13"), ("AC3", "AC13"), ("AD3", "AD3"),
    ("AG4", "AG13"), ("AH3", "AH13"), ("AM3", "AM13"), ("AN3", "AN3"), ("AQ4", "AQ13"),
    ("AR3", "AR13"),
];

const COMMIT_REGIONS: &[(&str, &str)] = &[
    ("C3", "C3"), ("C4", "F13"), ("G3", "G3"), ("J4", "J13"),
    ("K3", "K3"), ("N4", "N13"), ("O3", "O3"), ("R4", "R13"),
    ("S3", "S3"), ("V4", "V13"),
];

const MARGINS_SCENARIOS_REGIONS: &[(&str, &str)] = &[
    ("B15", "B15"), ("B16", "G19"), ("B20", "G20"), ("B25", "B25"),
    ("B26", "G29"), ("B30", "G30"), ("B32", "B32"), ("B33", "G36"),
    ("B37", "G37"), ("B39", "B39"), ("B40", "G43"), ("B44", "G44"),
    ("B46", "B46"), ("B47", "G50"), ("B51", "G51"), ("I39", "I39"),
    ("I40", "N43"), ("I44", "N44"),
];

/// Prefijos asignados, en orden, a las tablas aplanadas de todas las hojas
pub const PREFIX_ORDER: &[&str] = &[
    "a", "aa", "b", "bb", "c", "cc", "d", "dd", "e", "ee",
    "f", "g", "h", "i", "j", "k", "l", "ff", "m", "n", "o", "p", "q",
    "gg", "r", "s", "t", "hh", "u", "v", "w", "ii", "x", "y", "z", "ab",
    "ac", "ad", "ae", "af", "ag", "ah", "AA", "A", "AB", "BB", "B", "BC", "CC", "C", "CD", "DD",
    "D", "DE", "EE", "E", "EF", "FF", "F", "FG",
];

/// Regiones de una hoja según la hoja base cuyo nombre contiene.
pub fn regions_for_sheet(sheet_name: &str) -> Option<&'static [(&'static str, &'static str)]> {
    let base = SHEET_BASES.iter().find(|base| sheet_name.contains(*base))?;
    Some(match *base {
        "Exec View" => EXEC_VIEW_REGIONS,
        "Comparisons" => COMPARISONS_REGIONS,
        "Commit" => COMMIT_REGIONS,
        _ => MARGINS_SCENARIOS_REGIONS,
    })
}
