// ==========================================
// 海产品加工追溯系统 - 加工批次 / 副产品领域模型
// ==========================================

use crate::domain::record::{require_non_empty, require_non_negative, Collection, Record};
use crate::domain::types::{DisposalMethod, ProcessStage, ProductType, RecordStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// ProcessedBatch - 加工批次
// ==========================================
// 一条记录 = 一道工序对批次（部分）原料的产出
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedBatch {
    pub id: String,
    pub lot_id: String,
    pub operator_id: String,
    pub product_type: ProductType,
    pub grade: String,                // 等级 id（清洗工序为 "ungraded"）
    pub quantity: f64,                // kg
    pub box_count: u32,
    pub process_date: DateTime<Utc>,
    pub status: RecordStatus,
    pub stage: ProcessStage,          // 产出该批次的工序
    pub box_numbers: Vec<String>,     // {lot_number}-0001 ...
    pub qr_payload: String,           // 下游扫码载荷（JSON）
}

impl Record for ProcessedBatch {
    const COLLECTION: Collection = Collection::ProcessedBatches;

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> Result<(), String> {
        require_non_empty("id", &self.id)?;
        require_non_empty("lot_id", &self.lot_id)?;
        require_non_empty("operator_id", &self.operator_id)?;
        require_non_negative("quantity", self.quantity)?;
        if self.box_count < 1 {
            return Err("box_count 至少为 1".to_string());
        }
        if self.box_numbers.len() != self.box_count as usize {
            return Err(format!(
                "box_numbers 数量({})与 box_count({})不一致",
                self.box_numbers.len(),
                self.box_count
            ));
        }
        Ok(())
    }
}

// ==========================================
// ByProduct - 副产品（壳重）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ByProduct {
    pub id: String,
    pub processed_batch_id: String,
    pub shell_weight: f64, // kg
    pub disposal_method: DisposalMethod,
    pub date: DateTime<Utc>,
}

impl Record for ByProduct {
    const COLLECTION: Collection = Collection::ByProducts;

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> Result<(), String> {
        require_non_empty("id", &self.id)?;
        require_non_empty("processed_batch_id", &self.processed_batch_id)?;
        require_non_negative("shell_weight", self.shell_weight)
    }
}
