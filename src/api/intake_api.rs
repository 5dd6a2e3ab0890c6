// ==========================================
// 海产品加工追溯系统 - 原料入厂 API
// ==========================================
// 职责: 原料登记、未组批原料视图
// ==========================================

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::error::ApiResult;
use crate::api::validator::TraceInputValidator;
use crate::domain::master_data::Supplier;
use crate::domain::material::RawMaterial;
use crate::domain::types::RecordStatus;
use crate::engine::codes::CodeGenerator;
use crate::repository::entity_store::{EntityStore, Subscription};

/// 原料登记请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRawMaterial {
    pub supplier_id: String,
    pub quantity: f64,
    pub temperature: f64,
    pub quality_score: u8,
    pub received_date: Option<DateTime<Utc>>, // 为空时取当前时间
}

pub struct IntakeApi {
    store: Arc<EntityStore>,
}

impl IntakeApi {
    pub fn new(store: Arc<EntityStore>) -> Self {
        Self { store }
    }

    /// 登记原料（状态 pending，未组批）
    ///
    /// # 校验
    /// - 数量 ≥ 0
    /// - 评分 1-10
    /// - 供应商存在
    pub async fn register_raw_material(&self, input: NewRawMaterial) -> ApiResult<RawMaterial> {
        TraceInputValidator::require_text("供应商", &input.supplier_id)?;
        TraceInputValidator::validate_quantity("数量", input.quantity)?;
        TraceInputValidator::validate_quality_score(input.quality_score)?;
        self.store.require::<Supplier>(&input.supplier_id).await?;

        let material = RawMaterial {
            id: CodeGenerator::new_record_id(),
            supplier_id: input.supplier_id,
            quantity: input.quantity,
            temperature: input.temperature,
            quality_score: input.quality_score,
            received_date: input.received_date.unwrap_or_else(Utc::now),
            lot_id: None,
            status: RecordStatus::Pending,
        };
        self.store.add(&material).await?;

        info!(
            material_id = %material.id,
            supplier_id = %material.supplier_id,
            quantity = material.quantity,
            "原料已登记"
        );
        Ok(material)
    }

    /// 全部原料（写入时间倒序）
    pub async fn list_raw_materials(&self) -> ApiResult<Vec<RawMaterial>> {
        Ok(self.store.list().await?)
    }

    /// 未组批原料
    pub async fn list_unassigned(&self) -> ApiResult<Vec<RawMaterial>> {
        let materials = self.store.list::<RawMaterial>().await?;
        Ok(Self::unassigned(materials))
    }

    /// 从快照中筛选未组批原料（订阅方复用）
    pub fn unassigned(materials: Vec<RawMaterial>) -> Vec<RawMaterial> {
        materials.into_iter().filter(RawMaterial::is_unassigned).collect()
    }

    /// 订阅原料集合
    pub async fn subscribe_raw_materials(&self) -> ApiResult<Subscription<RawMaterial>> {
        Ok(self.store.subscribe().await?)
    }
}
