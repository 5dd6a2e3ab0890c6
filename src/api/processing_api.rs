// ==========================================
// 海产品加工追溯系统 - 加工与包装 API
// ==========================================
// 职责: 清洗批次、加工批次、副产品、成品（终包装）登记
// 红线: 加工数量不得超过批次剩余量（总量 - 已登记批次数量）
// ==========================================

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::TraceInputValidator;
use crate::config::trace_config_trait::TraceConfigReader;
use crate::domain::batch::{ByProduct, ProcessedBatch};
use crate::domain::lot::Lot;
use crate::domain::master_data::{ProductGrade, User};
use crate::domain::product::{BatchLabelPayload, FinalProduct, ProductLabelPayload};
use crate::domain::types::{DisposalMethod, ProcessStage, ProductType, RecordStatus};
use crate::engine::codes::{CodeGenerator, FINAL_BOX_PREFIX, MAX_BOX_COUNT};
use crate::engine::yield_calc::YieldCalculator;
use crate::repository::entity_store::EntityStore;

/// 清洗批次的等级标记
pub const UNGRADED: &str = "ungraded";

/// 加工批次登记请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProcessingBatch {
    pub lot_id: String,
    pub operator_id: String,
    pub product_type: ProductType,
    pub grade_id: String,
    pub quantity: f64,
    pub box_count: u32,
}

/// 清洗批次登记请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewWashingBatch {
    pub lot_id: String,
    pub operator_id: String,
    pub quantity: f64,
}

/// 副产品登记请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewByProduct {
    pub processed_batch_id: String,
    pub shell_weight: f64,
    pub disposal_method: DisposalMethod,
}

/// 成品登记请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFinalProduct {
    pub processed_batch_id: String,
    pub product_type: ProductType,
    pub grade_id: String,
    pub quantity: f64,
    pub carton_count: u32,
}

pub struct ProcessingApi {
    store: Arc<EntityStore>,
    config: Arc<dyn TraceConfigReader>,
}

impl ProcessingApi {
    pub fn new(store: Arc<EntityStore>, config: Arc<dyn TraceConfigReader>) -> Self {
        Self { store, config }
    }

    /// 读取 active 批次并返回剩余可加工量
    async fn active_lot_with_remainder(&self, lot_id: &str) -> ApiResult<(Lot, f64)> {
        let lot: Lot = self.store.require(lot_id).await?;
        if !lot.is_active() {
            return Err(ApiError::BusinessRuleViolation(format!(
                "批次 {} 状态为 {}，不可继续登记加工",
                lot.lot_number, lot.status
            )));
        }
        let batches = self.store.list::<ProcessedBatch>().await?;
        let remainder = YieldCalculator::lot_remainder(&lot, &batches);
        Ok((lot, remainder))
    }

    async fn require_grade(&self, grade_id: &str, product_type: ProductType) -> ApiResult<ProductGrade> {
        let grade: ProductGrade = self.store.require(grade_id).await?;
        TraceInputValidator::validate_grade(&grade, product_type)?;
        Ok(grade)
    }

    #[allow(clippy::too_many_arguments)]
    async fn write_batch(
        &self,
        lot: &Lot,
        operator_id: String,
        product_type: ProductType,
        grade: String,
        grade_label: &str,
        quantity: f64,
        box_count: u32,
        stage: ProcessStage,
    ) -> ApiResult<ProcessedBatch> {
        let width = self.config.get_box_number_width().await?;
        let id = CodeGenerator::new_record_id();
        let process_date = Utc::now();
        let box_numbers = CodeGenerator::box_numbers(&lot.lot_number, box_count, width);

        let payload = BatchLabelPayload {
            id: id.clone(),
            lot_number: lot.lot_number.clone(),
            product_type,
            grade: grade_label.to_string(),
            quantity,
            date: process_date,
            box_numbers: box_numbers.clone(),
        };

        let batch = ProcessedBatch {
            id,
            lot_id: lot.id.clone(),
            operator_id,
            product_type,
            grade,
            quantity,
            box_count,
            process_date,
            status: RecordStatus::Pending,
            stage,
            box_numbers,
            qr_payload: serde_json::to_string(&payload).map_err(|e| ApiError::InternalError(e.to_string()))?,
        };
        self.store.add(&batch).await?;

        info!(
            batch_id = %batch.id,
            lot_number = %lot.lot_number,
            stage = %batch.stage,
            quantity = batch.quantity,
            box_count = batch.box_count,
            "加工批次已登记"
        );
        Ok(batch)
    }

    /// 登记加工批次（stage = processing）
    ///
    /// # 校验
    /// - 批次 active
    /// - 等级存在且与产品类型一致
    /// - 数量 > 0 且不超过剩余量
    /// - 箱数 1..=MAX_BOX_COUNT
    pub async fn record_processing_batch(&self, input: NewProcessingBatch) -> ApiResult<ProcessedBatch> {
        TraceInputValidator::validate_positive_quantity("加工数量", input.quantity)?;
        TraceInputValidator::validate_count("箱数", input.box_count)?;
        self.store.require::<User>(&input.operator_id).await?;

        let (lot, remainder) = self.active_lot_with_remainder(&input.lot_id).await?;
        let grade = self.require_grade(&input.grade_id, input.product_type).await?;
        TraceInputValidator::validate_within_remainder(input.quantity, remainder)?;

        self.write_batch(
            &lot,
            input.operator_id,
            input.product_type,
            grade.id,
            &grade.name,
            input.quantity,
            input.box_count,
            ProcessStage::Processing,
        )
        .await
    }

    /// 登记清洗批次（stage = washing，带壳，未分级）
    ///
    /// 箱数 = ceil(数量 / 每箱重量)，至少 1 箱
    pub async fn record_washing_batch(&self, input: NewWashingBatch) -> ApiResult<ProcessedBatch> {
        TraceInputValidator::validate_positive_quantity("清洗数量", input.quantity)?;
        self.store.require::<User>(&input.operator_id).await?;

        let (lot, remainder) = self.active_lot_with_remainder(&input.lot_id).await?;
        TraceInputValidator::validate_within_remainder(input.quantity, remainder)?;

        let kg_per_box = self.config.get_washing_kg_per_box().await?;
        let box_count = washing_box_count(input.quantity, kg_per_box)?;

        self.write_batch(
            &lot,
            input.operator_id,
            ProductType::ShellOn,
            UNGRADED.to_string(),
            UNGRADED,
            input.quantity,
            box_count,
            ProcessStage::Washing,
        )
        .await
    }

    /// 登记副产品（壳重）
    pub async fn record_by_product(&self, input: NewByProduct) -> ApiResult<ByProduct> {
        TraceInputValidator::validate_quantity("壳重", input.shell_weight)?;
        self.store.require::<ProcessedBatch>(&input.processed_batch_id).await?;

        let by_product = ByProduct {
            id: CodeGenerator::new_record_id(),
            processed_batch_id: input.processed_batch_id,
            shell_weight: input.shell_weight,
            disposal_method: input.disposal_method,
            date: Utc::now(),
        };
        self.store.add(&by_product).await?;

        info!(
            by_product_id = %by_product.id,
            batch_id = %by_product.processed_batch_id,
            shell_weight = by_product.shell_weight,
            disposal = %by_product.disposal_method,
            "副产品已登记"
        );
        Ok(by_product)
    }

    /// 登记成品（终包装，箱号 BOX-0001 ...）
    pub async fn record_final_product(&self, input: NewFinalProduct) -> ApiResult<FinalProduct> {
        TraceInputValidator::validate_positive_quantity("成品数量", input.quantity)?;
        TraceInputValidator::validate_count("箱数", input.carton_count)?;
        self.store.require::<ProcessedBatch>(&input.processed_batch_id).await?;
        let grade = self.require_grade(&input.grade_id, input.product_type).await?;

        let width = self.config.get_box_number_width().await?;
        let id = CodeGenerator::new_record_id();
        let packing_date = Utc::now();
        let box_numbers = CodeGenerator::box_numbers(FINAL_BOX_PREFIX, input.carton_count, width);

        let payload = product_label(&id, &input, &grade, &box_numbers, packing_date);
        let product = FinalProduct {
            id,
            processed_batch_id: input.processed_batch_id,
            product_type: input.product_type,
            grade: grade.id,
            quantity: input.quantity,
            carton_count: input.carton_count,
            packing_date,
            status: RecordStatus::Pending,
            box_numbers,
            qr_payload: serde_json::to_string(&payload).map_err(|e| ApiError::InternalError(e.to_string()))?,
        };
        self.store.add(&product).await?;

        info!(
            product_id = %product.id,
            batch_id = %product.processed_batch_id,
            cartons = product.carton_count,
            "成品已登记"
        );
        Ok(product)
    }

    pub async fn list_batches(&self) -> ApiResult<Vec<ProcessedBatch>> {
        Ok(self.store.list().await?)
    }

    /// 某批次下的加工批次
    pub async fn batches_for_lot(&self, lot_id: &str) -> ApiResult<Vec<ProcessedBatch>> {
        let batches = self.store.list::<ProcessedBatch>().await?;
        Ok(batches.into_iter().filter(|b| b.lot_id == lot_id).collect())
    }

    pub async fn list_by_products(&self) -> ApiResult<Vec<ByProduct>> {
        Ok(self.store.list().await?)
    }

    pub async fn list_final_products(&self) -> ApiResult<Vec<FinalProduct>> {
        Ok(self.store.list().await?)
    }
}

/// 清洗箱数 = ceil(数量 / 每箱重量)，至少 1 箱，不超过 MAX_BOX_COUNT
fn washing_box_count(quantity: f64, kg_per_box: f64) -> ApiResult<u32> {
    if !(kg_per_box.is_finite() && kg_per_box > 0.0) {
        return Err(ApiError::InvalidInput(format!("每箱重量配置无效: {}", kg_per_box)));
    }
    let boxes = (quantity / kg_per_box).ceil().max(1.0);
    if !boxes.is_finite() || boxes > f64::from(MAX_BOX_COUNT) {
        return Err(ApiError::InvalidInput(format!(
            "清洗数量 {} kg 需要 {} 箱，超过上限 {}",
            quantity, boxes, MAX_BOX_COUNT
        )));
    }
    Ok(boxes as u32)
}

fn product_label(
    id: &str,
    input: &NewFinalProduct,
    grade: &ProductGrade,
    box_numbers: &[String],
    packing_date: DateTime<Utc>,
) -> ProductLabelPayload {
    ProductLabelPayload {
        id: id.to_string(),
        batch_id: input.processed_batch_id.clone(),
        product_type: input.product_type,
        grade: grade.name.clone(),
        quantity: input.quantity,
        cartons: input.carton_count,
        box_numbers: box_numbers.to_vec(),
        packing_date,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_washing_box_count_rounds_up() {
        assert_eq!(washing_box_count(50.0, 25.0).unwrap(), 2);
        assert_eq!(washing_box_count(51.0, 25.0).unwrap(), 3);
        assert_eq!(washing_box_count(0.5, 25.0).unwrap(), 1);
    }

    #[test]
    fn test_washing_box_count_rejects_oversized_batch() {
        let limit = f64::from(MAX_BOX_COUNT) * 25.0;
        assert_eq!(washing_box_count(limit, 25.0).unwrap(), MAX_BOX_COUNT);
        assert!(matches!(washing_box_count(limit + 1.0, 25.0), Err(ApiError::InvalidInput(_))));
        assert!(matches!(washing_box_count(1.0e12, 25.0), Err(ApiError::InvalidInput(_))));
    }

    #[test]
    fn test_washing_box_count_rejects_invalid_box_weight() {
        assert!(matches!(washing_box_count(10.0, 0.0), Err(ApiError::InvalidInput(_))));
        assert!(matches!(washing_box_count(10.0, -5.0), Err(ApiError::InvalidInput(_))));
    }
}
