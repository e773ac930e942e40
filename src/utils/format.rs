//! utils/format.rs
//! Formato de valores numéricos según la familia del prefijo del placeholder.

use crate::models::report_model::CellValue;

const MILLIONS_PREFIXES: &[&str] = &[
    "a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l", "m", "n", "o", "p", "q", "r", "s",
    "t", "u", "v", "w", "x", "y", "z", "ab", "ac", "ad", "ae", "af", "ag", "ah",
];

const INT_PERCENT_PREFIXES: &[&str] = &["aa", "bb", "cc", "dd", "ee", "ff", "gg", "hh", "ii"];

const DECIMAL_PERCENT_PREFIXES: &[&str] = &["AB", "BC", "CD", "DE", "EF", "FG", "HH", "II"];

const THOUSANDS_PREFIXES: &[&str] = &["A", "B", "C", "D", "E", "F"];

/// Devuelve `(texto, fracción)`. La fracción sólo es distinta de 0 para los
/// prefijos de porcentaje y se usa para dimensionar barras.
pub fn format_value(prefix: &str, value: &CellValue) -> (String, f64) {
    let number = match value {
        CellValue::Text(s) => return (s.clone(), 0.0),
        CellValue::Empty => return (String::new(), 0.0),
        other => match other.as_number() {
            Some(n) if !n.is_nan() => n,
            _ => return (String::new(), 0.0),
        },
    };

    if MILLIONS_PREFIXES.contains(&prefix) {
        let text = if number < 0.0 {
            format!("({:.1})", number.abs() / 1_000_000.0)
        } else {
            format!("{:.1}", number / 1_000_000.0)
        };
        return (text, 0.0);
    }

    if INT_PERCENT_PREFIXES.contains(&prefix) {
        let pct = (number * 100.0).round_ties_even() as i64;
        return (format!("{}%", group_thousands(pct)), number);
    }

    if DECIMAL_PERCENT_PREFIXES.contains(&prefix) {
        return (format!("{:.1}%", number * 100.0), number);
    }

    if THOUSANDS_PREFIXES.contains(&prefix) {
        let thousands = (number.trunc() as i64).div_euclid(1_000);
        return (group_thousands(thousands), 0.0);
    }

    (python_float(number), 0.0)
}

/// Entero con separador de miles ("-1,234,567").
pub fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if value < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// Texto de un float tal como lo escribiría Excel/Python (`1234.0`, `0.25`,
/// `1e-05`, `1e+16`). Notación exponencial fuera de [1e-4, 1e16).
fn python_float(value: f64) -> String {
    if !value.is_finite() {
        return format!("{}", value);
    }

    let magnitude = value.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        let sci = format!("{:e}", value);
        return match sci.split_once('e') {
            Some((mantissa, exp)) => {
                let exp: i32 = exp.parse().unwrap_or(0);
                let sign = if exp < 0 { '-' } else { '+' };
                format!("{}e{}{:02}", mantissa, sign, exp.abs())
            }
            None => sci,
        };
    }

    if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}
