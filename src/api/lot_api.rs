// ==========================================
// 海产品加工追溯系统 - 组批 API
// ==========================================
// 职责: 由未组批原料创建批次（Lot）、批次阶段查询
// 流程: 选择校验 → 合计重量 → 生成批次号 → 写入批次 → 逐条挂靠原料
// ==========================================

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::TraceInputValidator;
use crate::config::trace_config_trait::TraceConfigReader;
use crate::domain::batch::ProcessedBatch;
use crate::domain::lot::Lot;
use crate::domain::master_data::User;
use crate::domain::material::RawMaterial;
use crate::domain::quality::QualityCheck;
use crate::domain::types::{LotStatus, ProcessStage};
use crate::engine::codes::CodeGenerator;
use crate::engine::stage_resolver::{LotInProgress, StageTransitionResolver};
use crate::repository::entity_store::{AssignmentOutcome, EntityStore};

/// 组批请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLot {
    pub created_by: String,
    pub raw_material_ids: Vec<String>,
}

/// 组批结果（批次 + 原料挂靠结果）
#[derive(Debug, Clone, Serialize)]
pub struct LotCreation {
    pub lot: Lot,
    pub assignment: AssignmentOutcome,
}

pub struct LotApi {
    store: Arc<EntityStore>,
    config: Arc<dyn TraceConfigReader>,
}

impl LotApi {
    pub fn new(store: Arc<EntityStore>, config: Arc<dyn TraceConfigReader>) -> Self {
        Self { store, config }
    }

    /// 创建批次
    ///
    /// # 返回
    /// - Ok(LotCreation): 批次已写入；assignment 记录每个原料的挂靠结果
    /// - Err: 选择校验失败或批次写入失败（此时未挂靠任何原料）
    pub async fn create_lot(&self, input: NewLot) -> ApiResult<LotCreation> {
        TraceInputValidator::require_text("创建人", &input.created_by)?;
        self.store.require::<User>(&input.created_by).await?;

        let materials = self.store.list::<RawMaterial>().await?;
        let chosen = TraceInputValidator::validate_lot_selection(&input.raw_material_ids, &materials)?;
        let total_quantity: f64 = chosen.iter().map(|m| m.quantity).sum();

        let prefix = self.config.get_lot_number_prefix().await?;
        let now = Utc::now();
        let taken: HashSet<String> = self
            .store
            .list::<Lot>()
            .await?
            .into_iter()
            .map(|l| l.lot_number)
            .collect();
        let lot_number = CodeGenerator::generate_unique(&taken, || CodeGenerator::lot_number(&prefix, now))
            .ok_or_else(|| ApiError::InternalError("批次号生成多次冲突，请重试".to_string()))?;

        let raw_material_ids: Vec<String> = chosen.into_iter().map(|m| m.id).collect();
        let lot = Lot {
            id: CodeGenerator::new_record_id(),
            lot_number,
            created_at: now,
            created_by: input.created_by,
            raw_material_ids: raw_material_ids.clone(),
            status: LotStatus::Active,
            total_quantity,
            current_stage: ProcessStage::Processing,
        };
        self.store.add(&lot).await?;

        let assignment = self.store.assign_raw_materials(&lot.id, &raw_material_ids).await?;
        if assignment.is_complete() {
            info!(
                lot_id = %lot.id,
                lot_number = %lot.lot_number,
                total_quantity = lot.total_quantity,
                materials = raw_material_ids.len(),
                "批次已创建"
            );
        } else {
            warn!(
                lot_id = %lot.id,
                lot_number = %lot.lot_number,
                failed = assignment.failed.len(),
                "批次已创建，但部分原料挂靠失败"
            );
        }

        Ok(LotCreation { lot, assignment })
    }

    pub async fn list_lots(&self) -> ApiResult<Vec<Lot>> {
        Ok(self.store.list().await?)
    }

    pub async fn get_lot(&self, lot_id: &str) -> ApiResult<Lot> {
        Ok(self.store.require(lot_id).await?)
    }

    /// 状态为 active 的批次
    pub async fn active_lots(&self) -> ApiResult<Vec<Lot>> {
        let lots = self.store.list::<Lot>().await?;
        Ok(lots.into_iter().filter(Lot::is_active).collect())
    }

    /// 批次当前阶段（每次读取重新推断）
    pub async fn current_stage(&self, lot_id: &str) -> ApiResult<ProcessStage> {
        self.store.require::<Lot>(lot_id).await?;
        let batches = self.store.list::<ProcessedBatch>().await?;
        let checks = self.store.list::<QualityCheck>().await?;
        Ok(StageTransitionResolver::current_stage(lot_id, &batches, &checks))
    }

    /// 在制批次
    pub async fn lots_in_progress(&self) -> ApiResult<Vec<LotInProgress>> {
        let lots = self.store.list::<Lot>().await?;
        let batches = self.store.list::<ProcessedBatch>().await?;
        let checks = self.store.list::<QualityCheck>().await?;
        Ok(StageTransitionResolver::lots_in_progress(&lots, &batches, &checks))
    }
}
