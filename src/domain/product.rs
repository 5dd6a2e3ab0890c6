// ==========================================
// 海产品加工追溯系统 - 成品领域模型
// ==========================================

use crate::domain::record::{require_non_empty, require_non_negative, Collection, Record};
use crate::domain::types::{ProductType, RecordStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// FinalProduct - 终包装成品
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalProduct {
    pub id: String,
    pub processed_batch_id: String,
    pub product_type: ProductType,
    pub grade: String,
    pub quantity: f64,
    pub carton_count: u32,
    pub packing_date: DateTime<Utc>,
    pub status: RecordStatus,
    pub box_numbers: Vec<String>, // BOX-0001 ...
    pub qr_payload: String,
}

impl Record for FinalProduct {
    const COLLECTION: Collection = Collection::FinalProducts;

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> Result<(), String> {
        require_non_empty("id", &self.id)?;
        require_non_empty("processed_batch_id", &self.processed_batch_id)?;
        require_non_negative("quantity", self.quantity)?;
        if self.carton_count < 1 {
            return Err("carton_count 至少为 1".to_string());
        }
        Ok(())
    }
}

// ==========================================
// 扫码载荷
// ==========================================
// 序列化后写入 qr_payload 字段，标签渲染不在本系统范围内

/// 加工批次扫码载荷
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchLabelPayload {
    pub id: String,
    pub lot_number: String,
    pub product_type: ProductType,
    pub grade: String, // 等级名称
    pub quantity: f64,
    pub date: DateTime<Utc>,
    pub box_numbers: Vec<String>,
}

/// 成品扫码载荷
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductLabelPayload {
    pub id: String,
    pub batch_id: String,
    pub product_type: ProductType,
    pub grade: String,
    pub quantity: f64,
    pub cartons: u32,
    pub box_numbers: Vec<String>,
    pub packing_date: DateTime<Utc>,
}
