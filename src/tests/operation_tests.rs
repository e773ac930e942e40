//! tests/operation_tests.rs
//! Pruebas de `OperationService` sobre SQLite en memoria.

#[cfg(test)]
mod tests {
    use actix_rt::test;

    use crate::models::operation_model::{CreateOperationRequest, OperationStatus};
    use crate::tests::fixtures::memory_service;

    fn upload_request(name: &str) -> CreateOperationRequest {
        CreateOperationRequest {
            operation_type: "upload_report".to_string(),
            source_file: Some(name.to_string()),
            metadata: Some(r#"{"size_bytes":10}"#.to_string()),
        }
    }

    #[test]
    async fn test_operation_lifecycle_done() {
        let service = memory_service().await;

        let id = service.create_operation(upload_request("data.xlsm")).await.unwrap();
        let record = service.get_operation(&id).await.unwrap().unwrap();
        assert_eq!(record.status, OperationStatus::Pending.as_str());
        assert_eq!(record.source_file.as_deref(), Some("data.xlsm"));
        assert!(record.output_file.is_none());

        service
            .mark_operation_done(&id, "M3 Q1FY26 Report.pptx", None)
            .await
            .unwrap();
        let record = service.get_operation(&id).await.unwrap().unwrap();
        assert_eq!(record.status, "done");
        assert_eq!(record.output_file.as_deref(), Some("M3 Q1FY26 Report.pptx"));
        // Sin metadata nueva se conserva la anterior
        assert_eq!(record.metadata.as_deref(), Some(r#"{"size_bytes":10}"#));
    }

    #[test]
    async fn test_operation_lifecycle_failed() {
        let service = memory_service().await;

        let id = service.create_operation(upload_request("bad.xlsm")).await.unwrap();
        service
            .mark_operation_failed(&id, "Zip inválido".to_string())
            .await
            .unwrap();

        let record = service.get_operation(&id).await.unwrap().unwrap();
        assert_eq!(record.status, "failed");
        assert_eq!(record.error_message.as_deref(), Some("Zip inválido"));
    }

    #[test]
    async fn test_unknown_operation_is_none() {
        let service = memory_service().await;
        assert!(service.get_operation("does-not-exist").await.unwrap().is_none());
    }

    #[test]
    async fn test_list_operations_pagination() {
        let service = memory_service().await;
        for i in 0..3 {
            service
                .create_operation(upload_request(&format!("file{}.xlsm", i)))
                .await
                .unwrap();
        }

        let first = service.list_operations(1, 2, None).await.unwrap();
        assert_eq!(first.total, 3);
        assert_eq!(first.items.len(), 2);

        let second = service.list_operations(2, 2, None).await.unwrap();
        assert_eq!(second.items.len(), 1);

        // page 0 y page_size 0 se normalizan
        let clamped = service.list_operations(0, 0, None).await.unwrap();
        assert_eq!((clamped.page, clamped.page_size), (1, 1));
        assert_eq!(clamped.items.len(), 1);

        let large = service.list_operations(1, 1000, None).await.unwrap();
        assert_eq!(large.page_size, 100);
        assert_eq!(large.items.len(), 3);
    }

    #[test]
    async fn test_list_operations_huge_page_is_empty() {
        let service = memory_service().await;
        service.create_operation(upload_request("a.xlsm")).await.unwrap();

        let last = service.list_operations(u64::MAX, 10, None).await.unwrap();
        assert_eq!(last.page, u64::MAX);
        assert_eq!(last.total, 1);
        assert!(last.items.is_empty());
    }

    #[test]
    async fn test_list_operations_by_status() {
        let service = memory_service().await;
        let done = service.create_operation(upload_request("ok.xlsm")).await.unwrap();
        let failed = service.create_operation(upload_request("bad.xlsm")).await.unwrap();
        service.create_operation(upload_request("waiting.xlsm")).await.unwrap();

        service.mark_operation_done(&done, "out.pptx", None).await.unwrap();
        service
            .mark_operation_failed(&failed, "boom".to_string())
            .await
            .unwrap();

        let only_failed = service
            .list_operations(1, 10, Some(OperationStatus::Failed))
            .await
            .unwrap();
        assert_eq!(only_failed.total, 1);
        assert_eq!(only_failed.items[0].id, failed);

        let pending = service
            .list_operations(1, 10, Some(OperationStatus::Pending))
            .await
            .unwrap();
        assert_eq!(pending.total, 1);
        assert_eq!(pending.items[0].source_file.as_deref(), Some("waiting.xlsm"));
    }
}
