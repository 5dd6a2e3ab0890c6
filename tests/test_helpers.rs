// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、主数据准备、常用业务动作
// ==========================================

#![allow(dead_code)]

use rusqlite::Connection;
use seafood_trace::api::{
    CheckSubmission, NewLot, NewProcessingBatch, NewRawMaterial, NewSupplier, NewUser,
};
use seafood_trace::db::init_schema;
use seafood_trace::domain::{
    Lot, ProcessedBatch, ProductGrade, QualityCheck, QualitySubject, RawMaterial, Supplier, User,
};
use seafood_trace::{AppState, CheckStatus, ProductType, QualityCheckStep, UserRole};
use std::error::Error;
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().unwrap().to_string();

    let conn = Connection::open(&db_path)?;
    init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 创建基于临时数据库的 AppState
pub fn create_test_state() -> Result<(NamedTempFile, AppState), Box<dyn Error>> {
    let (temp_file, db_path) = create_test_db()?;
    let state = AppState::new(db_path)?;
    Ok((temp_file, state))
}

/// 测试主数据
pub struct Actors {
    pub supervisor: User,
    pub operator: User,
    pub quality: User,
    pub admin: User,
    pub supplier: Supplier,
}

async fn add_user(state: &AppState, name: &str, role: UserRole) -> User {
    state
        .master_data_api
        .add_user(NewUser {
            name: name.to_string(),
            email: format!("{}@plant.test", name.to_lowercase()),
            role,
            contact: None,
        })
        .await
        .unwrap()
}

/// 准备用户、供应商与默认等级
pub async fn seed_actors(state: &AppState) -> Actors {
    state.master_data_api.initialize_default_grades().await.unwrap();

    let supplier = state
        .master_data_api
        .add_supplier(NewSupplier {
            name: "North Bay Fisheries".to_string(),
            contact: "+86-532-0000".to_string(),
        })
        .await
        .unwrap();

    Actors {
        supervisor: add_user(state, "Supervisor", UserRole::Supervisor).await,
        operator: add_user(state, "Operator", UserRole::Operator).await,
        quality: add_user(state, "Inspector", UserRole::Quality).await,
        admin: add_user(state, "Admin", UserRole::Admin).await,
        supplier,
    }
}

/// 登记一条原料
pub async fn receive(state: &AppState, actors: &Actors, quantity: f64) -> RawMaterial {
    state
        .intake_api
        .register_raw_material(NewRawMaterial {
            supplier_id: actors.supplier.id.clone(),
            quantity,
            temperature: 4.0,
            quality_score: 8,
            received_date: None,
        })
        .await
        .unwrap()
}

/// 用给定原料组批
pub async fn create_lot(state: &AppState, actors: &Actors, materials: &[&RawMaterial]) -> Lot {
    let creation = state
        .lot_api
        .create_lot(NewLot {
            created_by: actors.supervisor.id.clone(),
            raw_material_ids: materials.iter().map(|m| m.id.clone()).collect(),
        })
        .await
        .unwrap();
    assert!(creation.assignment.is_complete());
    creation.lot
}

/// 指定产品类型中编码最小的等级（默认等级下为 WH01 / CM01）
pub async fn first_grade(state: &AppState, product_type: ProductType) -> ProductGrade {
    state
        .master_data_api
        .list_grades_for(product_type)
        .await
        .unwrap()
        .into_iter()
        .min_by(|a, b| a.code.cmp(&b.code))
        .unwrap()
}

/// 登记加工批次
pub async fn process(state: &AppState, actors: &Actors, lot: &Lot, quantity: f64) -> ProcessedBatch {
    let grade = first_grade(state, ProductType::Meat).await;
    state
        .processing_api
        .record_processing_batch(NewProcessingBatch {
            lot_id: lot.id.clone(),
            operator_id: actors.operator.id.clone(),
            product_type: ProductType::Meat,
            grade_id: grade.id,
            quantity,
            box_count: 2,
        })
        .await
        .unwrap()
}

/// 构造一条质检提交（温度默认填写）
pub fn submission(
    checker: &User,
    subject: QualitySubject,
    step: QualityCheckStep,
    status: CheckStatus,
) -> CheckSubmission {
    CheckSubmission {
        step,
        subject,
        status,
        checked_by: checker.id.clone(),
        temperature: Some(3.5),
        appearance: Some("normal".to_string()),
        weight: None,
        comments: None,
    }
}

/// 对批次提交一条生产线质检
pub async fn check_lot(
    state: &AppState,
    actors: &Actors,
    lot: &Lot,
    step: QualityCheckStep,
    status: CheckStatus,
) -> QualityCheck {
    let subject = QualitySubject::Lot { lot_id: lot.id.clone() };
    state
        .quality_api
        .submit_check(submission(&actors.quality, subject, step, status))
        .await
        .unwrap()
}
