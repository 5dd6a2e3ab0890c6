// ==========================================
// 主数据 集成测试
// ==========================================

mod test_helpers;

use seafood_trace::api::{ApiError, NewGrade, NewRawMaterial, NewUser};
use seafood_trace::logging;
use seafood_trace::{ProductType, UserRole};
use test_helpers::*;

#[tokio::test]
async fn test_user_codes_and_duplicate_email() {
    logging::init_test();
    let (_tmp, state) = create_test_state().unwrap();
    let actors = seed_actors(&state).await;

    assert_eq!(state.master_data_api.list_users().await.unwrap().len(), 4);
    assert!(actors.operator.code.starts_with("USR"));
    assert_ne!(actors.operator.code, actors.quality.code);

    let duplicate = state
        .master_data_api
        .add_user(NewUser {
            name: "Another".to_string(),
            email: "OPERATOR@plant.test".to_string(),
            role: UserRole::Operator,
            contact: None,
        })
        .await;
    assert!(matches!(duplicate, Err(ApiError::BusinessRuleViolation(_))));

    assert!(actors.supplier.code.starts_with("SUP"));
}

#[tokio::test]
async fn test_default_grades_reset() {
    logging::init_test();
    let (_tmp, state) = create_test_state().unwrap();

    let seeded = state.master_data_api.initialize_default_grades().await.unwrap();
    assert_eq!(seeded.len(), 6);

    println!("\n=== 测试：自定义等级，编码自动生成 ===");
    let custom = state
        .master_data_api
        .add_grade(NewGrade {
            name: "Jumbo".to_string(),
            code: None,
            product_type: ProductType::ShellOn,
            description: "Export size".to_string(),
        })
        .await
        .unwrap();
    assert!(custom.code.starts_with("SHO"));
    assert_eq!(state.master_data_api.list_grades_for(ProductType::ShellOn).await.unwrap().len(), 4);

    let clash = state
        .master_data_api
        .add_grade(NewGrade {
            name: "Clash".to_string(),
            code: Some("CM01".to_string()),
            product_type: ProductType::Meat,
            description: String::new(),
        })
        .await;
    assert!(matches!(clash, Err(ApiError::BusinessRuleViolation(_))));

    println!("\n=== 测试：重置后只剩默认等级 ===");
    state.master_data_api.initialize_default_grades().await.unwrap();
    let grades = state.master_data_api.list_grades().await.unwrap();
    assert_eq!(grades.len(), 6);
    let mut codes: Vec<String> = grades.into_iter().map(|g| g.code).collect();
    codes.sort();
    assert_eq!(codes, vec!["CM01", "CM02", "CM03", "WH01", "WH02", "WH03"]);
}

#[tokio::test]
async fn test_raw_material_requires_known_supplier_and_valid_score() {
    logging::init_test();
    let (_tmp, state) = create_test_state().unwrap();
    let actors = seed_actors(&state).await;

    let unknown = state
        .intake_api
        .register_raw_material(NewRawMaterial {
            supplier_id: "nobody".to_string(),
            quantity: 10.0,
            temperature: 4.0,
            quality_score: 7,
            received_date: None,
        })
        .await;
    assert!(matches!(unknown, Err(ApiError::NotFound(_))));

    let bad_score = state
        .intake_api
        .register_raw_material(NewRawMaterial {
            supplier_id: actors.supplier.id.clone(),
            quantity: 10.0,
            temperature: 4.0,
            quality_score: 11,
            received_date: None,
        })
        .await;
    assert!(bad_score.is_err());

    let negative = state
        .intake_api
        .register_raw_material(NewRawMaterial {
            supplier_id: actors.supplier.id.clone(),
            quantity: -1.0,
            temperature: 4.0,
            quality_score: 7,
            received_date: None,
        })
        .await;
    assert!(negative.is_err());

    assert!(state.intake_api.list_raw_materials().await.unwrap().is_empty());
}
