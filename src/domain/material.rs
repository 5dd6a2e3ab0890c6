// ==========================================
// 海产品加工追溯系统 - 原料领域模型
// ==========================================
// 红线: 原料只允许两类变更（挂靠批次、质检改状态）；永不删除
// ==========================================

use crate::domain::record::{require_non_empty, require_non_negative, Collection, Record};
use crate::domain::types::RecordStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 原料质量评分下限
pub const MIN_QUALITY_SCORE: u8 = 1;
/// 原料质量评分上限
pub const MAX_QUALITY_SCORE: u8 = 10;

// ==========================================
// RawMaterial - 原料入库记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMaterial {
    pub id: String,
    pub supplier_id: String,
    pub quantity: f64,                // 重量（kg）
    pub temperature: f64,             // 到货温度（℃）
    pub quality_score: u8,            // 感官评分 1-10
    pub received_date: DateTime<Utc>,
    pub lot_id: Option<String>,       // 所属批次（未组批为 None）
    pub status: RecordStatus,
}

impl RawMaterial {
    /// 是否尚未组批
    pub fn is_unassigned(&self) -> bool {
        self.lot_id.as_deref().map_or(true, |id| id.is_empty())
    }
}

impl Record for RawMaterial {
    const COLLECTION: Collection = Collection::RawMaterials;

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> Result<(), String> {
        require_non_empty("id", &self.id)?;
        require_non_empty("supplier_id", &self.supplier_id)?;
        require_non_negative("quantity", self.quantity)?;
        if !self.temperature.is_finite() {
            return Err("temperature 必须为有效数值".to_string());
        }
        if !(MIN_QUALITY_SCORE..=MAX_QUALITY_SCORE).contains(&self.quality_score) {
            return Err(format!(
                "quality_score 超出范围 {}-{}: {}",
                MIN_QUALITY_SCORE, MAX_QUALITY_SCORE, self.quality_score
            ));
        }
        Ok(())
    }
}
