//! tests/table_tests.rs
//! Pruebas de extracción de regiones y asignación de prefijos.

#[cfg(test)]
mod tests {
    use crate::config::report_layout::{regions_for_sheet, PREFIX_ORDER};
    use crate::models::report_model::{CellValue, SheetData, Table, Workbook};
    use crate::services::table_service::{assign_prefixes, extract_table, load_tables};
    use crate::tests::fixtures::{num, period_workbook, sample_date, text};
    use crate::utils::cell_ref::CellRange;
    use crate::utils::fiscal::{find_dynamic_sheets, order_sheets, FiscalPeriod};

    fn grid_sheet() -> SheetData {
        let mut sheet = SheetData::new("Grid");
        for row in 1..=3 {
            for col in 1..=3 {
                sheet.set(row, col, num((row * 10 + col) as f64));
            }
        }
        sheet.set(3, 3, CellValue::Empty);
        sheet
    }

    #[test]
    fn test_extract_table_skips_hidden_rows_and_cols() {
        let mut sheet = grid_sheet();
        sheet.hidden_rows.insert(2);
        sheet.hidden_cols.insert(2);

        let table = extract_table(&sheet, &CellRange::parse("A1", "C3").unwrap());
        assert_eq!(
            table.rows,
            vec![vec![num(11.0), num(13.0)], vec![num(31.0), text("")]]
        );
    }

    #[test]
    fn test_extract_table_outside_data_is_blank() {
        let sheet = grid_sheet();
        let table = extract_table(&sheet, &CellRange::parse("C3", "D4").unwrap());
        assert_eq!((table.nrows(), table.ncols()), (2, 2));
        assert!(table.rows.iter().flatten().all(|v| *v == text("")));
    }

    #[test]
    fn test_table_cell_numbering_is_row_major() {
        let table = Table {
            rows: vec![
                vec![num(1.0), num(2.0), num(3.0)],
                vec![num(4.0), num(5.0), num(6.0)],
            ],
        };
        assert_eq!(table.cell(1), Some(&num(1.0)));
        assert_eq!(table.cell(3), Some(&num(3.0)));
        assert_eq!(table.cell(4), Some(&num(4.0)));
        assert_eq!(table.cell(6), Some(&num(6.0)));
        assert_eq!(table.cell(7), None);
        assert_eq!(table.cell(0), None);
        assert_eq!(Table::default().cell(1), None);
    }

    #[test]
    fn test_regions_by_sheet_base() {
        assert_eq!(regions_for_sheet("M3 Q1 Exec View").map(|r| r.len()), Some(18));
        assert_eq!(regions_for_sheet("Q1 M3 Fcst Comparisons").map(|r| r.len()), Some(14));
        assert_eq!(regions_for_sheet("Q1 Commit").map(|r| r.len()), Some(10));
        assert_eq!(regions_for_sheet("Margins Scenarios").map(|r| r.len()), Some(18));
        assert!(regions_for_sheet("Notes").is_none());
        assert_eq!(PREFIX_ORDER.len(), 60);
    }

    #[test]
    fn test_load_tables_for_period_workbook() {
        let period = FiscalPeriod::from_date(sample_date());
        let workbook = period_workbook(&period);
        let ordered = order_sheets(&find_dynamic_sheets(&workbook.sheet_names(), &period));

        let mut with_missing = ordered.clone();
        with_missing.push("Missing Sheet".to_string());
        let sheets = load_tables(&workbook, &with_missing);

        let names: Vec<&str> = sheets.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "M3 Q1 Exec View",
                "Q1 M3 Fcst Comparisons",
                "Q1 Commit",
                "Margins Scenarios"
            ]
        );

        let total: usize = sheets.iter().map(|(_, t)| t.len()).sum();
        assert_eq!(total, PREFIX_ORDER.len());

        // Exec View C3:E13 es la primera tabla
        let (_, exec_tables) = &sheets[0];
        assert_eq!((exec_tables[0].nrows(), exec_tables[0].ncols()), (11, 3));
        assert_eq!(exec_tables[0].cell(1), Some(&num(1_500_000.0)));
        assert_eq!(exec_tables[0].cell(4), Some(&text("Revenue")));

        let set = assign_prefixes(sheets);
        assert_eq!(set.lookup("a", 2), Some(&num(-2_500_000.0)));
        assert_eq!(set.lookup("aa", 1), Some(&num(0.5)));
        // Primera tabla de Comparisons (K3:K3)
        assert_eq!(set.lookup("m", 1), Some(&num(42.0)));
        // Primera tabla de Commit (C3:C3)
        assert_eq!(set.lookup("x", 1), Some(&num(7.0)));
        // Primera tabla de Margins Scenarios (B15:B15)
        assert_eq!(set.lookup("AA", 1), Some(&text("Scenario A")));
        assert_eq!(set.lookup("zz", 1), None);
    }

    #[test]
    fn test_assign_prefixes_drops_extra_tables() {
        let one = Table {
            rows: vec![vec![num(1.0)]],
        };
        let sheets = vec![
            ("First".to_string(), vec![one.clone(); 40]),
            ("Second".to_string(), vec![one.clone(); 25]),
        ];

        let set = assign_prefixes(sheets);
        assert_eq!(set.tables.len(), PREFIX_ORDER.len());
        assert_eq!(set.prefixes.len(), PREFIX_ORDER.len());
        assert_eq!(set.prefixes.get("a"), Some(&0));
        assert_eq!(set.prefixes.get("FG"), Some(&59));
    }

    #[test]
    fn test_load_tables_skips_sheets_without_regions() {
        let workbook = Workbook {
            sheets: vec![SheetData::new("Notes")],
        };
        assert!(load_tables(&workbook, &["Notes".to_string()]).is_empty());
    }
}
