// ==========================================
// 海产品加工追溯系统 - 驾驶舱 API
// ==========================================
// 职责: 得率、质检通过率、各集合计数、库存视图
// 红线: 每次读取重新计算，不缓存
// ==========================================

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::api::error::ApiResult;
use crate::domain::batch::ProcessedBatch;
use crate::domain::lot::Lot;
use crate::domain::material::RawMaterial;
use crate::domain::product::FinalProduct;
use crate::domain::quality::QualityCheck;
use crate::domain::types::RecordStatus;
use crate::engine::stage_resolver::StageTransitionResolver;
use crate::engine::yield_calc::{LotYield, QualityStats, YieldCalculator};
use crate::repository::entity_store::EntityStore;

/// 驾驶舱汇总
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub raw_materials: usize,
    pub unassigned_raw_materials: usize,
    pub lots: usize,
    pub active_lots: usize,
    pub lots_in_progress: usize,
    pub processed_batches: usize,
    pub final_products: usize,
    pub pending_products: usize,
    pub inventory_products: usize,
    pub quality: QualityStats,
}

pub struct DashboardApi {
    store: Arc<EntityStore>,
}

impl DashboardApi {
    pub fn new(store: Arc<EntityStore>) -> Self {
        Self { store }
    }

    /// 各批次得率
    pub async fn lot_yields(&self) -> ApiResult<Vec<LotYield>> {
        let lots = self.store.list::<Lot>().await?;
        let batches = self.store.list::<ProcessedBatch>().await?;
        Ok(YieldCalculator::lot_yields(&lots, &batches))
    }

    pub async fn quality_stats(&self) -> ApiResult<QualityStats> {
        let checks = self.store.list::<QualityCheck>().await?;
        Ok(YieldCalculator::quality_stats(&checks))
    }

    /// 库存 = 已放行成品
    pub async fn inventory(&self) -> ApiResult<Vec<FinalProduct>> {
        let products = self.store.list::<FinalProduct>().await?;
        Ok(filter_by_status(products, RecordStatus::Approved))
    }

    /// 待检成品
    pub async fn pending_products(&self) -> ApiResult<Vec<FinalProduct>> {
        let products = self.store.list::<FinalProduct>().await?;
        Ok(filter_by_status(products, RecordStatus::Pending))
    }

    pub async fn summary(&self) -> ApiResult<DashboardSummary> {
        let materials = self.store.list::<RawMaterial>().await?;
        let lots = self.store.list::<Lot>().await?;
        let batches = self.store.list::<ProcessedBatch>().await?;
        let products = self.store.list::<FinalProduct>().await?;
        let checks = self.store.list::<QualityCheck>().await?;

        let summary = DashboardSummary {
            raw_materials: materials.len(),
            unassigned_raw_materials: materials.iter().filter(|m| m.is_unassigned()).count(),
            lots: lots.len(),
            active_lots: lots.iter().filter(|l| l.is_active()).count(),
            lots_in_progress: StageTransitionResolver::lots_in_progress(&lots, &batches, &checks).len(),
            processed_batches: batches.len(),
            final_products: products.len(),
            pending_products: products.iter().filter(|p| p.status == RecordStatus::Pending).count(),
            inventory_products: products.iter().filter(|p| p.status == RecordStatus::Approved).count(),
            quality: YieldCalculator::quality_stats(&checks),
        };
        debug!(?summary, "驾驶舱汇总已计算");
        Ok(summary)
    }
}

fn filter_by_status(products: Vec<FinalProduct>, status: RecordStatus) -> Vec<FinalProduct> {
    products.into_iter().filter(|p| p.status == status).collect()
}
