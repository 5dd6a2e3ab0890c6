// ==========================================
// 海产品加工追溯系统 - 质检领域模型
// ==========================================
// 红线: 质检记录只追加；同一 (对象, 步骤) 以最新一条为准
// 例外: 管理员更正（仅允许修改结论/备注类字段）
// ==========================================

use crate::domain::record::{require_non_empty, Collection, Record};
use crate::domain::types::{CheckStatus, QualityCheckStep};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// QualitySubject - 质检对象
// ==========================================
// Lot: 生产线/阶段质检，不改写任何实体状态
// 其他: 质检结论会回写到对应实体（passed → approved, failed → rejected）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QualitySubject {
    Lot { lot_id: String },
    RawMaterial { raw_material_id: String },
    ProcessedBatch { batch_id: String, lot_id: String },
    FinalProduct { product_id: String },
}

impl QualitySubject {
    /// 对象主标识
    pub fn subject_id(&self) -> &str {
        match self {
            QualitySubject::Lot { lot_id } => lot_id,
            QualitySubject::RawMaterial { raw_material_id } => raw_material_id,
            QualitySubject::ProcessedBatch { batch_id, .. } => batch_id,
            QualitySubject::FinalProduct { product_id } => product_id,
        }
    }

    /// 关联批次（Lot 或加工批次所属 Lot）
    pub fn lot_id(&self) -> Option<&str> {
        match self {
            QualitySubject::Lot { lot_id } => Some(lot_id),
            QualitySubject::ProcessedBatch { lot_id, .. } => Some(lot_id),
            _ => None,
        }
    }

    /// 是否指向给定标识（对象本身或其所属批次）
    pub fn references(&self, id: &str) -> bool {
        self.subject_id() == id || self.lot_id() == Some(id)
    }
}

// ==========================================
// QualityCheck - 质检记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityCheck {
    pub id: String,
    pub step: QualityCheckStep,
    pub subject: QualitySubject,
    pub status: CheckStatus,
    pub checked_at: DateTime<Utc>,
    pub checked_by: String,
    pub temperature: Option<f64>,
    pub appearance: Option<String>,
    pub weight: Option<f64>,
    pub comments: Option<String>,
}

impl Record for QualityCheck {
    const COLLECTION: Collection = Collection::QualityChecks;

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> Result<(), String> {
        require_non_empty("id", &self.id)?;
        require_non_empty("checked_by", &self.checked_by)?;
        require_non_empty("subject", self.subject.subject_id())?;
        if let Some(t) = self.temperature {
            if !t.is_finite() {
                return Err("temperature 必须为有效数值".to_string());
            }
        }
        if let Some(w) = self.weight {
            if !w.is_finite() || w < 0.0 {
                return Err(format!("weight 必须为非负数值: {}", w));
            }
        }
        Ok(())
    }
}

// ==========================================
// QualityCheckCorrection - 管理员更正
// ==========================================
// 只有 Some 的字段会被写入（部分更新）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityCheckCorrection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<CheckStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appearance: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
}

impl QualityCheckCorrection {
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.temperature.is_none()
            && self.appearance.is_none()
            && self.weight.is_none()
            && self.comments.is_none()
    }
}
