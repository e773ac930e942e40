//! tests/utils_tests.rs
//! Pruebas de referencias de celda, calendario fiscal y formato de valores.

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::models::report_model::CellValue;
    use crate::tests::fixtures::sample_date;
    use crate::utils::cell_ref::{cell_name, column_letter, coordinate_to_tuple, CellRange};
    use crate::utils::fiscal::{
        date_labels, find_dynamic_sheets, order_sheets, report_file_name, source_file_prefix,
        FiscalPeriod,
    };
    use crate::utils::format::{format_value, group_thousands};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_coordinate_to_tuple() {
        assert_eq!(coordinate_to_tuple("A1").unwrap(), (1, 1));
        assert_eq!(coordinate_to_tuple("AB10").unwrap(), (10, 28));
        assert_eq!(coordinate_to_tuple("ar13").unwrap(), (13, 44));

        for bad in ["", "A", "12", "1A", "A-1", "A1B"] {
            let err = coordinate_to_tuple(bad).unwrap_err();
            assert!(err.to_string().contains("Invalid cell reference"), "{}", bad);
        }
    }

    #[test]
    fn test_column_letters() {
        assert_eq!(column_letter(1), "A");
        assert_eq!(column_letter(26), "Z");
        assert_eq!(column_letter(27), "AA");
        assert_eq!(column_letter(28), "AB");
        assert_eq!(column_letter(703), "AAA");
        assert_eq!(cell_name(13, 44), "AR13");
    }

    #[test]
    fn test_cell_range() {
        let range = CellRange::parse("C4", "F13").unwrap();
        assert_eq!((range.first_row, range.first_col), (4, 3));
        assert_eq!((range.last_row, range.last_col), (13, 6));

        assert!(CellRange::parse("F13", "C4").is_err());
    }

    #[test]
    fn test_fiscal_period() {
        let aug = FiscalPeriod::from_date(date(2025, 8, 1));
        assert_eq!(aug.fiscal_year, 2026);
        assert_eq!(aug.fiscal_month_label(), "M1");
        assert_eq!(aug.quarter_label(), "Q1");
        assert_eq!(aug.month_in_quarter_label(), "M1");

        let oct = FiscalPeriod::from_date(sample_date());
        assert_eq!(oct.fiscal_year, 2026);
        assert_eq!(oct.fiscal_month, 3);
        assert_eq!(oct.quarter_label(), "Q1");
        assert_eq!(oct.month_in_quarter_label(), "M3");
        assert_eq!(oct.short_year(), "26");

        let jan = FiscalPeriod::from_date(date(2026, 1, 10));
        assert_eq!(jan.fiscal_year, 2026);
        assert_eq!(jan.fiscal_month, 6);
        assert_eq!(jan.quarter_label(), "Q2");
        assert_eq!(jan.month_in_quarter_label(), "M3");

        let jul = FiscalPeriod::from_date(date(2025, 7, 31));
        assert_eq!(jul.fiscal_year, 2025);
        assert_eq!(jul.fiscal_month_label(), "M12");
        assert_eq!(jul.quarter_label(), "Q4");
    }

    #[test]
    fn test_find_dynamic_sheets_uses_pattern_order() {
        let period = FiscalPeriod::from_date(sample_date());
        let sheets = names(&[
            "Notes",
            "q1 commit",
            "M2 Q1 Exec View",
            "M3 Q1 Exec View",
            "Q1 M3 Fcst Comparisons",
            "Q1 M3 Old Comparisons",
            "Margins Scenarios",
        ]);

        let found = find_dynamic_sheets(&sheets, &period);
        assert_eq!(
            found,
            names(&[
                "Margins Scenarios",
                "M3 Q1 Exec View",
                "Q1 M3 Fcst Comparisons",
                "q1 commit",
            ])
        );
    }

    #[test]
    fn test_find_dynamic_sheets_requires_whole_name() {
        let period = FiscalPeriod::from_date(sample_date());
        let sheets = names(&["Old Margins Scenarios", "Q1 Commit v2", "XM3 Q1 Exec View"]);
        assert!(find_dynamic_sheets(&sheets, &period).is_empty());
    }

    #[test]
    fn test_order_sheets() {
        let identified = names(&[
            "Margins Scenarios",
            "M3 Q1 Exec View",
            "Q1 M3 Fcst Comparisons",
            "Q1 Commit",
        ]);
        assert_eq!(
            order_sheets(&identified),
            names(&[
                "M3 Q1 Exec View",
                "Q1 M3 Fcst Comparisons",
                "Q1 Commit",
                "Margins Scenarios",
            ])
        );

        // Las que faltan simplemente no aparecen
        let partial = names(&["Q1 Commit"]);
        assert_eq!(order_sheets(&partial), names(&["Q1 Commit"]));
    }

    #[test]
    fn test_source_file_prefix() {
        assert_eq!(source_file_prefix(sample_date(), 5).unwrap(), "202603");
        assert_eq!(source_file_prefix(sample_date(), 0).unwrap(), "202510");
        // 31 de agosto + 6 meses cae en el último día de febrero
        assert_eq!(source_file_prefix(date(2025, 8, 31), 6).unwrap(), "202602");
    }

    #[test]
    fn test_date_labels() {
        let labels = date_labels(sample_date());
        let get = |key: &str| {
            labels
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.clone())
                .unwrap()
        };

        assert_eq!(get("QuarterLabel"), "Q1");
        assert_eq!(get("MonthLabel"), "M3");
        assert_eq!(get("Date"), "October 16, 2025");
        assert_eq!(get("YearLabel"), "2026");
        assert_eq!(get("Title"), "M3 & Q1 Fcst");
        assert_eq!(get("dateLabel"), "10.16.25");
        assert_eq!(get("Month"), "October");

        let early = date_labels(date(2026, 2, 3));
        assert!(early.contains(&("Date", "February 3, 2026".to_string())));
    }

    #[test]
    fn test_report_file_name() {
        let period = FiscalPeriod::from_date(sample_date());
        assert_eq!(
            report_file_name(&period, "P&L Review DRAFT"),
            "M3 Q1FY26 P&L Review DRAFT.pptx"
        );
    }

    #[test]
    fn test_format_millions() {
        assert_eq!(format_value("a", &CellValue::Number(1_234_567.0)).0, "1.2");
        assert_eq!(format_value("ah", &CellValue::Number(-2_500_000.0)).0, "(2.5)");
        assert_eq!(format_value("z", &CellValue::Number(0.0)).0, "0.0");
    }

    #[test]
    fn test_format_percentages() {
        // Redondeo al par más cercano
        assert_eq!(
            format_value("aa", &CellValue::Number(0.125)),
            ("12%".to_string(), 0.125)
        );
        assert_eq!(format_value("bb", &CellValue::Number(0.375)).0, "38%");
        assert_eq!(format_value("ii", &CellValue::Number(15.0)).0, "1,500%");

        assert_eq!(
            format_value("AB", &CellValue::Number(0.1234)),
            ("12.3%".to_string(), 0.1234)
        );
        assert_eq!(format_value("II", &CellValue::Number(-0.05)).0, "-5.0%");
    }

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_value("A", &CellValue::Number(1_234_567.0)).0, "1,234");
        assert_eq!(format_value("F", &CellValue::Number(999.9)).0, "0");
        assert_eq!(format_value("C", &CellValue::Number(-1_500.0)).0, "-2");
    }

    #[test]
    fn test_format_other_values() {
        assert_eq!(format_value("AA", &CellValue::Number(3.0)).0, "3.0");
        assert_eq!(format_value("DD", &CellValue::Number(0.25)).0, "0.25");
        assert_eq!(format_value("a", &CellValue::Text("n/a".into())).0, "n/a");
        assert_eq!(format_value("a", &CellValue::Empty), (String::new(), 0.0));
        assert_eq!(format_value("aa", &CellValue::Bool(true)).0, "100%");
    }

    #[test]
    fn test_format_default_uses_exponent_outside_range() {
        assert_eq!(format_value("DD", &CellValue::Number(0.0001)).0, "0.0001");
        assert_eq!(format_value("DD", &CellValue::Number(1e-5)).0, "1e-05");
        assert_eq!(format_value("DD", &CellValue::Number(-1.5e-7)).0, "-1.5e-07");
        assert_eq!(format_value("DD", &CellValue::Number(1e16)).0, "1e+16");
        assert_eq!(format_value("DD", &CellValue::Number(1.2345e20)).0, "1.2345e+20");
        assert_eq!(format_value("DD", &CellValue::Number(1e15)).0, "1000000000000000.0");
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(-1_234_567), "-1,234,567");
    }
}
