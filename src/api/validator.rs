// ==========================================
// 海产品加工追溯系统 - 输入校验器
// ==========================================
// 职责: 用例入口的输入校验（写入之前）
// 红线: 校验失败立即返回，绝不写入
// ==========================================

use std::collections::HashSet;

use crate::api::error::{ApiError, ApiResult, ValidationViolation};
use crate::domain::master_data::{ProductGrade, User};
use crate::domain::material::{RawMaterial, MAX_QUALITY_SCORE, MIN_QUALITY_SCORE};
use crate::engine::codes::MAX_BOX_COUNT;
use crate::domain::types::{ProductType, UserRole};

/// 数量比较容差（kg）
const QUANTITY_EPSILON: f64 = 1e-9;

pub struct TraceInputValidator;

impl TraceInputValidator {
    /// 必填文本
    pub fn require_text(field: &str, value: &str) -> ApiResult<()> {
        if value.trim().is_empty() {
            return Err(ApiError::InvalidInput(format!("{}不能为空", field)));
        }
        Ok(())
    }

    /// 非负数量
    pub fn validate_quantity(field: &str, value: f64) -> ApiResult<()> {
        if !value.is_finite() || value < 0.0 {
            return Err(ApiError::InvalidInput(format!(
                "{}必须为非负数值: {}",
                field, value
            )));
        }
        Ok(())
    }

    /// 正数量（加工/包装产出）
    pub fn validate_positive_quantity(field: &str, value: f64) -> ApiResult<()> {
        Self::validate_quantity(field, value)?;
        if value <= 0.0 {
            return Err(ApiError::InvalidInput(format!("{}必须大于 0", field)));
        }
        Ok(())
    }

    /// 感官评分 1-10
    pub fn validate_quality_score(score: u8) -> ApiResult<()> {
        if !(MIN_QUALITY_SCORE..=MAX_QUALITY_SCORE).contains(&score) {
            return Err(ApiError::InvalidInput(format!(
                "质量评分超出范围 {}-{}: {}",
                MIN_QUALITY_SCORE, MAX_QUALITY_SCORE, score
            )));
        }
        Ok(())
    }

    /// 箱数/件数: 1..=MAX_BOX_COUNT
    pub fn validate_count(field: &str, count: u32) -> ApiResult<()> {
        if count < 1 {
            return Err(ApiError::InvalidInput(format!("{}至少为 1", field)));
        }
        if count > MAX_BOX_COUNT {
            return Err(ApiError::InvalidInput(format!(
                "{}超过上限 {}: {}",
                field, MAX_BOX_COUNT, count
            )));
        }
        Ok(())
    }

    /// 加工数量不得超过批次剩余量
    pub fn validate_within_remainder(quantity: f64, remainder: f64) -> ApiResult<()> {
        if quantity > remainder + QUANTITY_EPSILON {
            return Err(ApiError::BusinessRuleViolation(format!(
                "加工数量 {} kg 超过批次剩余量 {:.2} kg",
                quantity, remainder
            )));
        }
        Ok(())
    }

    /// 等级必须与产品类型一致
    pub fn validate_grade(grade: &ProductGrade, product_type: ProductType) -> ApiResult<()> {
        if grade.product_type != product_type {
            return Err(ApiError::BusinessRuleViolation(format!(
                "等级 {} 属于 {}，与产品类型 {} 不符",
                grade.code, grade.product_type, product_type
            )));
        }
        Ok(())
    }

    /// 角色校验
    pub fn require_role(user: &User, required: UserRole) -> ApiResult<()> {
        if user.role != required {
            tracing::warn!(user_id = %user.id, role = %user.role, required = %required, "权限不足");
            return Err(ApiError::PermissionDenied {
                user_id: user.id.clone(),
                required,
            });
        }
        Ok(())
    }

    /// 组批原料选择校验
    ///
    /// # 规则
    /// - 选择不能为空
    /// - 每个 id 必须存在、未组批、不重复
    ///
    /// # 返回
    /// - Ok(Vec<RawMaterial>): 按选择顺序返回原料
    /// - Err(MaterialSelectionError): 附逐条违规原因
    pub fn validate_lot_selection(
        selected: &[String],
        materials: &[RawMaterial],
    ) -> ApiResult<Vec<RawMaterial>> {
        if selected.is_empty() {
            return Err(ApiError::InvalidInput("请至少选择一个原料".to_string()));
        }

        let mut violations = Vec::new();
        let mut seen = HashSet::new();
        let mut chosen = Vec::with_capacity(selected.len());

        for material_id in selected {
            if !seen.insert(material_id.as_str()) {
                violations.push(ValidationViolation {
                    violation_type: "DUPLICATE".to_string(),
                    material_id: material_id.clone(),
                    reason: "原料重复选择".to_string(),
                });
                continue;
            }
            match materials.iter().find(|m| &m.id == material_id) {
                None => violations.push(ValidationViolation {
                    violation_type: "UNKNOWN_MATERIAL".to_string(),
                    material_id: material_id.clone(),
                    reason: "原料不存在".to_string(),
                }),
                Some(m) if !m.is_unassigned() => violations.push(ValidationViolation {
                    violation_type: "ALREADY_ASSIGNED".to_string(),
                    material_id: material_id.clone(),
                    reason: format!("原料已属于批次 {}", m.lot_id.as_deref().unwrap_or_default()),
                }),
                Some(m) => chosen.push(m.clone()),
            }
        }

        if !violations.is_empty() {
            return Err(ApiError::MaterialSelectionError {
                reason: format!("{}个原料不可组批", violations.len()),
                violations,
            });
        }
        Ok(chosen)
    }
}
