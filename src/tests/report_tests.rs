//! tests/report_tests.rs
//! Pruebas del pipeline completo y de `ReportService`.

#[cfg(test)]
mod tests {
    use actix_rt::test;
    use chrono::Local;

    use crate::config::app_config::AppConfig;
    use crate::services::excel_service::save_workbook;
    use crate::services::ooxml::package::OoxmlPackage;
    use crate::services::report_service::{run_pipeline, sanitize_file_name, ReportService};
    use crate::tests::fixtures::{period_workbook, sample_date, slide_texts, template_package};
    use crate::utils::fiscal::{report_file_name, FiscalPeriod};

    const SLIDE1: &str = "ppt/slides/slide1.xml";

    fn test_config(dir: &std::path::Path) -> AppConfig {
        let template = dir.join("template.pptx");
        template_package().save(&template).unwrap();
        AppConfig {
            ppt_template_path: template,
            data_dir: dir.join("data"),
            report_title_suffix: "Test Review".to_string(),
            ..Default::default()
        }
    }

    #[test]
    async fn test_run_pipeline_fills_template() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());

        let period = FiscalPeriod::from_date(sample_date());
        let source = dir.path().join("202603_source.xlsm");
        save_workbook(&period_workbook(&period), &source).unwrap();

        let work_dir = tempfile::tempdir().unwrap();
        let report = run_pipeline(
            &source,
            work_dir.path(),
            &config.ppt_template_path,
            "Test Review",
            sample_date(),
        )
        .unwrap();

        assert_eq!(report.file_name, "M3 Q1FY26 Test Review.pptx");
        assert_eq!(
            report.sheets_used,
            vec![
                "M3 Q1 Exec View",
                "Q1 M3 Fcst Comparisons",
                "Q1 Commit",
                "Margins Scenarios"
            ]
        );
        assert!(report.stored_as.is_none());

        let package = OoxmlPackage::from_bytes(report.bytes).unwrap();
        assert_eq!(
            slide_texts(&package, SLIDE1),
            vec!["M3 & Q1 Fcst 2026", "1.5 / (2.5)"]
        );
        assert!(work_dir.path().join("preprocessed_data.xlsx").is_file());
    }

    #[test]
    async fn test_run_pipeline_rejects_non_excel() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let source = dir.path().join("notes.txt");
        std::fs::write(&source, "hello").unwrap();

        let result = run_pipeline(
            &source,
            dir.path(),
            &config.ppt_template_path,
            "Test Review",
            sample_date(),
        );
        assert!(result.is_err());
    }

    #[test]
    async fn test_service_requires_template() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            ppt_template_path: dir.path().join("missing.pptx"),
            data_dir: dir.path().join("data"),
            ..Default::default()
        };
        assert!(ReportService::new(&config).is_err());
    }

    #[test]
    async fn test_generate_from_upload_stores_copy() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            store_reports: true,
            ..test_config(dir.path())
        };
        let service = ReportService::new(&config).unwrap();
        assert_eq!(service.reports_dir(), Some(config.reports_dir().as_path()));

        let period = FiscalPeriod::from_date(Local::now().date_naive());
        let bytes = crate::services::excel_service::write_workbook(&period_workbook(&period))
            .unwrap()
            .to_bytes()
            .unwrap();

        let report = service
            .generate_from_upload("../../secret/data.xlsm", bytes)
            .await
            .unwrap();
        assert_eq!(report.file_name, report_file_name(&period, "Test Review"));

        let stored = report.stored_as.clone().unwrap();
        assert!(stored.ends_with(&format!("_{}", report.file_name)));
        let on_disk = std::fs::read(config.reports_dir().join(&stored)).unwrap();
        assert_eq!(on_disk, report.bytes);

        // Las carpetas temporales de cada generación se borran
        let leftovers = std::fs::read_dir(config.temp_dir()).unwrap().count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    async fn test_generate_from_file_without_storage() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let service = ReportService::new(&config).unwrap();
        assert!(service.reports_dir().is_none());

        let source = dir.path().join("source.xlsm");
        let period = FiscalPeriod::from_date(Local::now().date_naive());
        save_workbook(&period_workbook(&period), &source).unwrap();

        let report = service.generate_from_file(&source).await.unwrap();
        assert!(report.stored_as.is_none());
        assert_eq!(report.sheets_used.len(), 4);
        assert!(source.is_file());
    }

    /// Una generación que supera el timeout sigue ocupando su turno hasta terminar.
    #[cfg(unix)]
    #[test]
    async fn test_timed_out_generation_keeps_permit() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            max_concurrent_reports: 1,
            report_timeout_secs: 0,
            ..test_config(dir.path())
        };
        let service = ReportService::new(&config).unwrap();

        // Leer de un FIFO bloquea la tarea hasta que alguien lo abra para escribir
        let fifo = dir.path().join("pending.xlsm");
        let status = std::process::Command::new("mkfifo")
            .arg(&fifo)
            .status()
            .unwrap();
        assert!(status.success());

        let err = service.generate_from_file(&fifo).await.unwrap_err();
        assert!(format!("{:#}", err).contains("Timeout generando el reporte"));
        assert_eq!(service.available_permits(), 0);

        let writer = fifo.clone();
        tokio::task::spawn_blocking(move || std::fs::write(writer, b"not a zip"))
            .await
            .unwrap()
            .unwrap();

        let mut released = false;
        for _ in 0..200 {
            if service.available_permits() == 1 {
                released = true;
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert!(released);
    }

    #[test]
    async fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name(r"C:\Users\me\P&L data.xlsm"), "P&L data.xlsm");
        assert_eq!(sanitize_file_name("a$b?.xlsx"), "a_b_.xlsx");
        assert_eq!(sanitize_file_name("..."), "upload.xlsx");
        assert_eq!(sanitize_file_name(""), "upload.xlsx");
        assert_eq!(sanitize_file_name("informe año.xlsm"), "informe a_o.xlsm");
    }
}
