// ==========================================
// 海产品加工追溯系统 - Stage Transition Resolver
// ==========================================
// 职责: 由加工批次历史 + 质检历史推断批次（Lot）当前生产阶段
// 红线: 无状态、无副作用；只做 processing → final-packing 一步前瞻
// ==========================================
// 规则:
// 1. 无加工批次 → processing（尚未开始）
// 2. 取最近创建的加工批次的 stage 作为默认结论
// 3. 若该 stage = processing 且存在 (lot, processing) 的 Passed 质检 → final-packing
// 4. 其他阶段原样返回；不会自动推进到 completed
// ==========================================

use crate::domain::batch::ProcessedBatch;
use crate::domain::lot::Lot;
use crate::domain::quality::QualityCheck;
use crate::domain::types::{CheckStatus, ProcessStage, QualityCheckStep};
use serde::Serialize;

/// 在制批次视图
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LotInProgress {
    pub lot: Lot,
    pub stage: ProcessStage,
}

pub struct StageTransitionResolver;

impl StageTransitionResolver {
    /// 最近创建的加工批次
    ///
    /// # 规则
    /// - process_date 最大者
    /// - process_date 相同: 取集合中靠前者（集合按写入时间倒序）
    pub fn latest_batch<'a>(lot_id: &str, batches: &'a [ProcessedBatch]) -> Option<&'a ProcessedBatch> {
        batches
            .iter()
            .filter(|b| b.lot_id == lot_id)
            .fold(None, |latest: Option<&ProcessedBatch>, b| match latest {
                Some(best) if best.process_date >= b.process_date => Some(best),
                _ => Some(b),
            })
    }

    /// 批次当前阶段
    pub fn current_stage(lot_id: &str, batches: &[ProcessedBatch], checks: &[QualityCheck]) -> ProcessStage {
        let Some(latest) = Self::latest_batch(lot_id, batches) else {
            return ProcessStage::Processing;
        };

        if latest.stage == ProcessStage::Processing {
            let processing_passed = checks.iter().any(|c| {
                c.step == QualityCheckStep::Processing
                    && c.status == CheckStatus::Passed
                    && c.subject.lot_id() == Some(lot_id)
            });
            if processing_passed {
                return ProcessStage::FinalPacking;
            }
        }

        latest.stage
    }

    /// 在制批次：状态 active 且已挂靠原料，排除阶段为 completed 的批次
    pub fn lots_in_progress(
        lots: &[Lot],
        batches: &[ProcessedBatch],
        checks: &[QualityCheck],
    ) -> Vec<LotInProgress> {
        lots.iter()
            .filter(|lot| lot.is_active() && !lot.raw_material_ids.is_empty())
            .map(|lot| LotInProgress {
                lot: lot.clone(),
                stage: Self::current_stage(&lot.id, batches, checks),
            })
            .filter(|entry| entry.stage != ProcessStage::Completed)
            .collect()
    }
}
