// ==========================================
// 驾驶舱与导出 集成测试
// ==========================================
// 覆盖: 批次得率、剩余量校验、质检通过率、CSV 导出文件
// ==========================================

mod test_helpers;

use seafood_trace::api::{
    ApiError, NewByProduct, NewFinalProduct, NewProcessingBatch, NewWashingBatch, UNGRADED,
};
use seafood_trace::domain::{BatchLabelPayload, QualitySubject};
use seafood_trace::engine::{YieldValue, MAX_BOX_COUNT};
use seafood_trace::logging;
use seafood_trace::{CheckStatus, DisposalMethod, ProductType, QualityCheckStep};
use std::fs;
use test_helpers::*;

#[tokio::test]
async fn test_lot_yield_and_remainder() {
    logging::init_test();
    let (_tmp, state) = create_test_state().unwrap();
    let actors = seed_actors(&state).await;

    let a = receive(&state, &actors, 60.0).await;
    let b = receive(&state, &actors, 40.0).await;
    let lot = create_lot(&state, &actors, &[&a, &b]).await;
    assert_eq!(lot.total_quantity, 100.0);

    println!("\n=== 测试：加工批次箱号与标签载荷 ===");
    let batch = process(&state, &actors, &lot, 85.0).await;
    assert_eq!(
        batch.box_numbers,
        vec![format!("{}-0001", lot.lot_number), format!("{}-0002", lot.lot_number)]
    );
    let payload: BatchLabelPayload = serde_json::from_str(&batch.qr_payload).unwrap();
    assert_eq!(payload.lot_number, lot.lot_number);
    assert_eq!(payload.grade, "Grade 1");

    println!("\n=== 测试：超出剩余量被拒绝 ===");
    let over = state
        .processing_api
        .record_washing_batch(NewWashingBatch {
            lot_id: lot.id.clone(),
            operator_id: actors.operator.id.clone(),
            quantity: 15.5,
        })
        .await;
    assert!(over.is_err());

    let washing = state
        .processing_api
        .record_washing_batch(NewWashingBatch {
            lot_id: lot.id.clone(),
            operator_id: actors.operator.id.clone(),
            quantity: 15.0,
        })
        .await
        .unwrap();
    assert_eq!(washing.grade, UNGRADED);
    assert_eq!(washing.product_type, ProductType::ShellOn);
    assert_eq!(washing.box_count, 1);

    println!("\n=== 测试：得率 ===");
    let yields = state.dashboard_api.lot_yields().await.unwrap();
    let lot_yield = yields.iter().find(|y| y.lot_id == lot.id).unwrap();
    assert_eq!(lot_yield.processed_quantity, 100.0);
    assert_eq!(lot_yield.yield_value.to_string(), "100.00");
    assert_eq!(state.processing_api.batches_for_lot(&lot.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_yield_is_formatted_with_two_decimals() {
    logging::init_test();
    let (_tmp, state) = create_test_state().unwrap();
    let actors = seed_actors(&state).await;

    let a = receive(&state, &actors, 100.0).await;
    let lot = create_lot(&state, &actors, &[&a]).await;
    process(&state, &actors, &lot, 85.0).await;

    let yields = state.dashboard_api.lot_yields().await.unwrap();
    assert_eq!(yields.len(), 1);
    assert_eq!(yields[0].yield_value, YieldValue::Percent(85.0));
    assert_eq!(yields[0].yield_value.to_string(), "85.00");
}

#[tokio::test]
async fn test_zero_quantity_lot_has_no_yield() {
    logging::init_test();
    let (_tmp, state) = create_test_state().unwrap();
    let actors = seed_actors(&state).await;

    let empty = receive(&state, &actors, 0.0).await;
    let lot = create_lot(&state, &actors, &[&empty]).await;
    assert_eq!(lot.total_quantity, 0.0);

    let yields = state.dashboard_api.lot_yields().await.unwrap();
    assert_eq!(yields[0].yield_value, YieldValue::NotApplicable);
    assert_eq!(yields[0].yield_value.to_string(), "N/A");

    // 剩余量为 0，任何加工都被拒绝
    let grade = first_grade(&state, ProductType::Meat).await;
    let result = state
        .processing_api
        .record_processing_batch(NewProcessingBatch {
            lot_id: lot.id.clone(),
            operator_id: actors.operator.id.clone(),
            product_type: ProductType::Meat,
            grade_id: grade.id,
            quantity: 1.0,
            box_count: 1,
        })
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_grade_must_match_product_type() {
    logging::init_test();
    let (_tmp, state) = create_test_state().unwrap();
    let actors = seed_actors(&state).await;
    let a = receive(&state, &actors, 30.0).await;
    let lot = create_lot(&state, &actors, &[&a]).await;

    let shell_on_grade = first_grade(&state, ProductType::ShellOn).await;
    let result = state
        .processing_api
        .record_processing_batch(NewProcessingBatch {
            lot_id: lot.id.clone(),
            operator_id: actors.operator.id.clone(),
            product_type: ProductType::Meat,
            grade_id: shell_on_grade.id,
            quantity: 10.0,
            box_count: 1,
        })
        .await;
    assert!(matches!(result, Err(ApiError::BusinessRuleViolation(_))));
}

#[tokio::test]
async fn test_summary_and_pass_rate() {
    logging::init_test();
    let (_tmp, state) = create_test_state().unwrap();
    let actors = seed_actors(&state).await;

    let a = receive(&state, &actors, 50.0).await;
    let b = receive(&state, &actors, 30.0).await;
    receive(&state, &actors, 10.0).await;
    let lot = create_lot(&state, &actors, &[&a, &b]).await;

    check_lot(&state, &actors, &lot, QualityCheckStep::RawMaterialReceiving, CheckStatus::Passed).await;
    check_lot(&state, &actors, &lot, QualityCheckStep::RotaryScreenWashing, CheckStatus::Failed).await;
    check_lot(&state, &actors, &lot, QualityCheckStep::RotaryScreenWashing, CheckStatus::Passed).await;

    let summary = state.dashboard_api.summary().await.unwrap();
    assert_eq!(summary.raw_materials, 3);
    assert_eq!(summary.unassigned_raw_materials, 1);
    assert_eq!(summary.lots, 1);
    assert_eq!(summary.active_lots, 1);
    assert_eq!(summary.lots_in_progress, 1);
    assert_eq!(summary.quality.total, 3);
    assert_eq!(summary.quality.passed, 2);
    assert_eq!(summary.quality.failed, 1);
    assert_eq!(summary.quality.pass_rate_display(), "66.7");
}

#[tokio::test]
async fn test_export_writes_csv_files() {
    logging::init_test();
    let (_tmp, state) = create_test_state().unwrap();
    let actors = seed_actors(&state).await;
    let out = tempfile::tempdir().unwrap();

    let a = receive(&state, &actors, 70.0).await;
    let lot = create_lot(&state, &actors, &[&a]).await;
    let batch = process(&state, &actors, &lot, 60.0).await;
    state
        .processing_api
        .record_by_product(NewByProduct {
            processed_batch_id: batch.id.clone(),
            shell_weight: 8.5,
            disposal_method: DisposalMethod::Recycling,
        })
        .await
        .unwrap();

    let grade = first_grade(&state, ProductType::Meat).await;
    let product = state
        .processing_api
        .record_final_product(NewFinalProduct {
            processed_batch_id: batch.id.clone(),
            product_type: ProductType::Meat,
            grade_id: grade.id,
            quantity: 55.0,
            carton_count: 2,
        })
        .await
        .unwrap();
    state
        .quality_api
        .submit_check(submission(
            &actors.quality,
            QualitySubject::FinalProduct { product_id: product.id.clone() },
            QualityCheckStep::Form3ProductIn,
            CheckStatus::Passed,
        ))
        .await
        .unwrap();

    println!("\n=== 测试：驾驶舱导出 ===");
    let paths = state.export_api.export_dashboard(out.path()).await.unwrap();
    assert_eq!(paths.len(), 5);
    for path in &paths {
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.ends_with(".csv"), "文件名: {}", name);
        assert!(path.exists());
    }

    let lots_file = paths
        .iter()
        .find(|p| p.file_name().unwrap().to_string_lossy().starts_with("lots_"))
        .unwrap();
    let content = fs::read_to_string(lots_file).unwrap();
    let mut lines = content.lines();
    assert_eq!(lines.next(), Some("id,lotNumber,createdAt,createdBy,status,totalQuantity"));
    let row = lines.next().unwrap();
    assert!(row.contains(&lot.lot_number));
    assert!(row.ends_with(",active,70"));

    println!("\n=== 测试：库存导出（箱号含逗号需加引号） ===");
    let inventory = state.export_api.export_inventory(out.path()).await.unwrap();
    let content = fs::read_to_string(inventory).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[1].starts_with(&product.id));
    assert!(lines[1].ends_with("\"BOX-0001,BOX-0002\""));
}

#[tokio::test]
async fn test_box_counts_above_limit_are_rejected() {
    logging::init_test();
    let (_tmp, state) = create_test_state().unwrap();
    let actors = seed_actors(&state).await;

    let a = receive(&state, &actors, 300_000.0).await;
    let lot = create_lot(&state, &actors, &[&a]).await;
    let grade = first_grade(&state, ProductType::Meat).await;

    println!("\n=== 测试：加工箱数超过上限 ===");
    let result = state
        .processing_api
        .record_processing_batch(NewProcessingBatch {
            lot_id: lot.id.clone(),
            operator_id: actors.operator.id.clone(),
            product_type: ProductType::Meat,
            grade_id: grade.id.clone(),
            quantity: 10.0,
            box_count: u32::MAX,
        })
        .await;
    assert!(matches!(result, Err(ApiError::InvalidInput(_))));

    println!("\n=== 测试：清洗数量折算箱数超过上限 ===");
    let result = state
        .processing_api
        .record_washing_batch(NewWashingBatch {
            lot_id: lot.id.clone(),
            operator_id: actors.operator.id.clone(),
            quantity: 300_000.0,
        })
        .await;
    assert!(matches!(result, Err(ApiError::InvalidInput(_))));
    assert!(state.processing_api.batches_for_lot(&lot.id).await.unwrap().is_empty());

    println!("\n=== 测试：成品件数超过上限 ===");
    let batch = process(&state, &actors, &lot, 100.0).await;
    let result = state
        .processing_api
        .record_final_product(NewFinalProduct {
            processed_batch_id: batch.id,
            product_type: ProductType::Meat,
            grade_id: grade.id,
            quantity: 90.0,
            carton_count: MAX_BOX_COUNT + 1,
        })
        .await;
    assert!(matches!(result, Err(ApiError::InvalidInput(_))));
    assert!(state.processing_api.list_final_products().await.unwrap().is_empty());
}
