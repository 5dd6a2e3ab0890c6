// ==========================================
// 海产品加工追溯系统 - 生产批次（Lot）领域模型
// ==========================================
// 不变量: total_quantity = 组批时所选原料重量之和（之后不再重算）
// ==========================================

use crate::domain::record::{require_non_empty, require_non_negative, Collection, Record};
use crate::domain::types::{LotStatus, ProcessStage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// Lot - 生产批次
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lot {
    pub id: String,
    pub lot_number: String,           // 可读批次号 LOT-yyyyMMddHHmm-XXXX
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub raw_material_ids: Vec<String>,
    pub status: LotStatus,
    pub total_quantity: f64,          // kg，组批时快照
    pub current_stage: ProcessStage,  // 建批时为 processing，展示用以解析器结果为准
}

impl Lot {
    pub fn is_active(&self) -> bool {
        self.status == LotStatus::Active
    }
}

impl Record for Lot {
    const COLLECTION: Collection = Collection::Lots;

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> Result<(), String> {
        require_non_empty("id", &self.id)?;
        require_non_empty("lot_number", &self.lot_number)?;
        require_non_empty("created_by", &self.created_by)?;
        require_non_negative("total_quantity", self.total_quantity)?;
        let mut seen = std::collections::HashSet::new();
        for id in &self.raw_material_ids {
            if !seen.insert(id.as_str()) {
                return Err(format!("raw_material_ids 重复: {}", id));
            }
        }
        Ok(())
    }
}
