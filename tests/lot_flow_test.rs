// ==========================================
// 原料登记 → 组批 集成测试
// ==========================================
// 覆盖: 组批汇总、原料挂靠、重复组批拒绝、订阅推送、
//       非原子存储下的部分挂靠、阶段推断
// ==========================================

mod test_helpers;

use rusqlite::Connection;
use seafood_trace::api::{ApiError, NewLot, NewWashingBatch};
use seafood_trace::config::ConfigManager;
use seafood_trace::db::init_schema;
use seafood_trace::domain::{Lot, QualitySubject, RawMaterial};
use seafood_trace::logging;
use seafood_trace::repository::document_store::MemoryDocumentStore;
use seafood_trace::{AppState, CheckStatus, LotStatus, ProcessStage, QualityCheckStep};
use std::sync::{Arc, Mutex};
use test_helpers::*;

#[tokio::test]
async fn test_create_lot_sums_and_assigns_materials() {
    logging::init_test();
    let (_tmp, state) = create_test_state().unwrap();
    let actors = seed_actors(&state).await;

    println!("\n=== 测试：两条原料组批 ===");
    let a = receive(&state, &actors, 50.0).await;
    let b = receive(&state, &actors, 30.0).await;
    assert_eq!(state.intake_api.list_unassigned().await.unwrap().len(), 2);

    let creation = state
        .lot_api
        .create_lot(NewLot {
            created_by: actors.supervisor.id.clone(),
            raw_material_ids: vec![a.id.clone(), b.id.clone()],
        })
        .await
        .unwrap();

    let lot = creation.lot;
    assert_eq!(lot.total_quantity, 80.0);
    assert_eq!(lot.status, LotStatus::Active);
    assert_eq!(lot.current_stage, ProcessStage::Processing);
    assert!(lot.lot_number.starts_with("LOT-"));
    assert!(creation.assignment.is_complete());
    assert!(creation.assignment.atomic);
    assert_eq!(creation.assignment.succeeded.len(), 2);

    println!("\n=== 验证：原料已挂靠 ===");
    for id in [&a.id, &b.id] {
        let material: RawMaterial = state.store.require(id).await.unwrap();
        assert_eq!(material.lot_id.as_deref(), Some(lot.id.as_str()));
    }
    assert!(state.intake_api.list_unassigned().await.unwrap().is_empty());

    let stored: Lot = state.lot_api.get_lot(&lot.id).await.unwrap();
    assert_eq!(stored.raw_material_ids, vec![a.id, b.id]);
}

#[tokio::test]
async fn test_assigned_material_cannot_join_second_lot() {
    logging::init_test();
    let (_tmp, state) = create_test_state().unwrap();
    let actors = seed_actors(&state).await;

    let a = receive(&state, &actors, 20.0).await;
    let first = create_lot(&state, &actors, &[&a]).await;

    let result = state
        .lot_api
        .create_lot(NewLot {
            created_by: actors.supervisor.id.clone(),
            raw_material_ids: vec![a.id.clone(), "missing".to_string()],
        })
        .await;

    match result {
        Err(ApiError::MaterialSelectionError { violations, .. }) => {
            let kinds: Vec<&str> = violations.iter().map(|v| v.violation_type.as_str()).collect();
            assert_eq!(kinds, vec!["ALREADY_ASSIGNED", "UNKNOWN_MATERIAL"]);
        }
        other => panic!("期望 MaterialSelectionError，实际: {:?}", other),
    }

    // 拒绝的组批不写入任何批次
    let lots = state.lot_api.list_lots().await.unwrap();
    assert_eq!(lots.len(), 1);
    assert_eq!(lots[0].id, first.id);
}

#[tokio::test]
async fn test_create_lot_requires_existing_creator_and_selection() {
    logging::init_test();
    let (_tmp, state) = create_test_state().unwrap();
    let actors = seed_actors(&state).await;
    let a = receive(&state, &actors, 10.0).await;

    let unknown_creator = state
        .lot_api
        .create_lot(NewLot {
            created_by: "ghost".to_string(),
            raw_material_ids: vec![a.id.clone()],
        })
        .await;
    assert!(matches!(unknown_creator, Err(ApiError::NotFound(_))));

    let empty = state
        .lot_api
        .create_lot(NewLot {
            created_by: actors.supervisor.id.clone(),
            raw_material_ids: vec![],
        })
        .await;
    assert!(matches!(empty, Err(ApiError::InvalidInput(_))));
}

#[tokio::test]
async fn test_raw_material_subscription_receives_new_snapshot() {
    logging::init_test();
    let (_tmp, state) = create_test_state().unwrap();
    let actors = seed_actors(&state).await;

    let mut subscription = state.intake_api.subscribe_raw_materials().await.unwrap();
    assert!(subscription.current().unwrap().is_empty());

    let a = receive(&state, &actors, 12.5).await;
    let snapshot = subscription.changed().await.unwrap();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].id, a.id);

    let b = receive(&state, &actors, 7.5).await;
    let snapshot = subscription.changed().await.unwrap();
    // 最新写入在前
    assert_eq!(snapshot.iter().map(|m| m.id.clone()).collect::<Vec<_>>(), vec![b.id, a.id]);
}

#[tokio::test]
async fn test_memory_store_reports_partial_assignment() {
    logging::init_test();

    let conn = Connection::open_in_memory().unwrap();
    init_schema(&conn).unwrap();
    let config = ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap();
    let state = AppState::with_backend(
        ":memory:".to_string(),
        Arc::new(MemoryDocumentStore::new()),
        Arc::new(config),
    );
    let actors = seed_actors(&state).await;
    let a = receive(&state, &actors, 15.0).await;

    println!("\n=== 测试：非原子存储逐条挂靠 ===");
    let outcome = state
        .store
        .assign_raw_materials("LOT-X", &[a.id.clone(), "missing".to_string()])
        .await
        .unwrap();

    assert!(!outcome.atomic);
    assert!(!outcome.is_complete());
    assert_eq!(outcome.succeeded, vec![a.id.clone()]);
    assert_eq!(outcome.failed.len(), 1);
    assert_eq!(outcome.failed[0].material_id, "missing");

    // 已成功的挂靠不回滚
    let material: RawMaterial = state.store.require(&a.id).await.unwrap();
    assert_eq!(material.lot_id.as_deref(), Some("LOT-X"));
}

#[tokio::test]
async fn test_lot_stage_follows_batches_and_processing_check() {
    logging::init_test();
    let (_tmp, state) = create_test_state().unwrap();
    let actors = seed_actors(&state).await;

    let a = receive(&state, &actors, 100.0).await;
    let lot = create_lot(&state, &actors, &[&a]).await;

    println!("\n=== 无加工批次: processing ===");
    assert_eq!(state.lot_api.current_stage(&lot.id).await.unwrap(), ProcessStage::Processing);

    println!("\n=== 清洗批次: washing ===");
    let washing = state
        .processing_api
        .record_washing_batch(NewWashingBatch {
            lot_id: lot.id.clone(),
            operator_id: actors.operator.id.clone(),
            quantity: 30.0,
        })
        .await
        .unwrap();
    assert_eq!(washing.box_count, 2);
    assert_eq!(state.lot_api.current_stage(&lot.id).await.unwrap(), ProcessStage::Washing);

    println!("\n=== 加工批次: processing ===");
    let batch = process(&state, &actors, &lot, 40.0).await;
    assert_eq!(state.lot_api.current_stage(&lot.id).await.unwrap(), ProcessStage::Processing);

    println!("\n=== 加工质检通过: final-packing ===");
    state
        .quality_api
        .submit_check(submission(
            &actors.quality,
            QualitySubject::ProcessedBatch {
                batch_id: batch.id.clone(),
                lot_id: lot.id.clone(),
            },
            QualityCheckStep::Processing,
            CheckStatus::Passed,
        ))
        .await
        .unwrap();
    assert_eq!(state.lot_api.current_stage(&lot.id).await.unwrap(), ProcessStage::FinalPacking);

    let in_progress = state.lot_api.lots_in_progress().await.unwrap();
    assert_eq!(in_progress.len(), 1);
    assert_eq!(in_progress[0].stage, ProcessStage::FinalPacking);
}
