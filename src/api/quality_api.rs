// ==========================================
// 海产品加工追溯系统 - 质检 API
// ==========================================
// 职责: 质检提交（权限 → 门控 → 写入 + 状态回写）、看板、管理员更正
// 红线: 门控在任何写入之前执行；被拒绝的提交不落库
// ==========================================
// 步骤分类:
// - 流水线步骤: 按 engine::steps 顺序门控（生产线对象为 Lot，终包装对象为成品）
// - 阶段级步骤: 实体放行质检，不做顺序门控
// ==========================================

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
use crate::domain::product::FinalProduct;
use crate::domain::quality::{QualityCheck, QualityCheckCorrection, QualitySubject};
use crate::domain::types::{CheckStatus, QualityCheckStep, RecordStatus, StepStatus, UserRole};
use crate::engine::codes::CodeGenerator;
use crate::engine::quality_gate::{QualityGateEngine, StepBoardRow};
use crate::engine::steps::Pipeline;
use crate::repository::entity_store::EntityStore;

/// 质检提交
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckSubmission {
    pub step: QualityCheckStep,
    pub subject: QualitySubject,
    pub status: CheckStatus,
    pub checked_by: String,
    pub temperature: Option<f64>,
    pub appearance: Option<String>,
    pub weight: Option<f64>,
    pub comments: Option<String>,
}

pub struct QualityApi {
    store: Arc<EntityStore>,
    config: Arc<dyn TraceConfigReader>,
}

impl QualityApi {
    pub fn new(store: Arc<EntityStore>, config: Arc<dyn TraceConfigReader>) -> Self {
        Self { store, config }
    }

    /// 校验质检对象存在且与流水线匹配
    async fn require_subject(&self, subject: &QualitySubject, pipeline: Option<Pipeline>) -> ApiResult<()> {
        match (pipeline, subject) {
            (Some(Pipeline::Production), QualitySubject::Lot { .. }) => {}
            (Some(Pipeline::FinalPacking), QualitySubject::FinalProduct { .. }) => {}
            (None, _) => {}
            (Some(p), other) => {
                return Err(ApiError::InvalidInput(format!(
                    "{} 流水线不接受该质检对象: {}",
                    p,
                    other.subject_id()
                )))
            }
        }

        match subject {
            QualitySubject::Lot { lot_id } => {
                self.store.require::<Lot>(lot_id).await?;
            }
            QualitySubject::RawMaterial { raw_material_id } => {
                self.store.require::<RawMaterial>(raw_material_id).await?;
            }
            QualitySubject::ProcessedBatch { batch_id, lot_id } => {
                let batch: ProcessedBatch = self.store.require(batch_id).await?;
                if &batch.lot_id != lot_id {
                    return Err(ApiError::InvalidInput(format!(
                        "加工批次 {} 不属于批次 {}",
                        batch_id, lot_id
                    )));
                }
            }
            QualitySubject::FinalProduct { product_id } => {
                self.store.require::<FinalProduct>(product_id).await?;
            }
        }
        Ok(())
    }

    async fn require_checker(&self, user_id: &str) -> ApiResult<User> {
        let user: User = self.store.require(user_id).await?;
        if self.config.get_enforce_quality_role().await? {
            TraceInputValidator::require_role(&user, UserRole::Quality)?;
        }
        Ok(user)
    }

    async fn require_admin(&self, user_id: &str) -> ApiResult<User> {
        let user: User = self.store.require(user_id).await?;
        TraceInputValidator::require_role(&user, UserRole::Admin)?;
        Ok(user)
    }

    /// 提交质检
    ///
    /// # 流程
    /// 1. 质检员权限
    /// 2. 对象存在、与流水线匹配；必填温度
    /// 3. 流水线步骤: 前序步骤必须 Passed
    /// 4. 写入质检并回写被检实体状态
    pub async fn submit_check(&self, submission: CheckSubmission) -> ApiResult<QualityCheck> {
        let checker = self.require_checker(&submission.checked_by).await?;

        let pipeline = Pipeline::of_step(submission.step);
        self.require_subject(&submission.subject, pipeline).await?;
        if submission.step.requires_temperature() && submission.temperature.is_none() {
            return Err(ApiError::InvalidInput(format!(
                "步骤 {} 需要填写温度",
                submission.step
            )));
        }

        if let Some(pipeline) = pipeline {
            let checks = self.store.list::<QualityCheck>().await?;
            let subject_id = submission.subject.subject_id();
            let decision = QualityGateEngine::evaluate(&checks, subject_id, pipeline, submission.step)
                .ok_or_else(|| ApiError::UnrecognizedStep(submission.step.to_string()))?;

            if !decision.allowed {
                warn!(subject = subject_id, step = %submission.step, reason = %decision.reason, "质检门控拒绝");
                return Err(match (decision.blocking_step, decision.blocking_status) {
                    (Some(blocking_step), Some(blocking_status)) => ApiError::QualityGateBlocked {
                        step: submission.step,
                        blocking_step,
                        blocking_status,
                    },
                    _ => ApiError::BusinessRuleViolation(decision.reason),
                });
            }
        }

        let check = QualityCheck {
            id: CodeGenerator::new_record_id(),
            step: submission.step,
            subject: submission.subject,
            status: submission.status,
            checked_at: Utc::now(),
            checked_by: checker.id,
            temperature: submission.temperature,
            appearance: submission.appearance,
            weight: submission.weight,
            comments: submission.comments,
        };
        self.store.record_quality_check(&check).await?;

        info!(
            check_id = %check.id,
            step = %check.step,
            subject = check.subject.subject_id(),
            status = %check.status,
            "质检已提交"
        );
        Ok(check)
    }

    /// 步骤状态
    pub async fn step_status(&self, subject_id: &str, step: QualityCheckStep) -> ApiResult<StepStatus> {
        let checks = self.store.list::<QualityCheck>().await?;
        Ok(QualityGateEngine::step_status(&checks, subject_id, step))
    }

    /// 按步骤下标判定是否可执行
    ///
    /// # 返回
    /// - Err(UnrecognizedStep): 下标超出流水线范围
    pub async fn can_perform_step(&self, subject_id: &str, pipeline: Pipeline, step_index: usize) -> ApiResult<bool> {
        let ordered = pipeline.ordered_steps();
        if step_index >= ordered.len() {
            return Err(ApiError::UnrecognizedStep(format!(
                "{} 流水线没有第 {} 步",
                pipeline, step_index
            )));
        }
        let checks = self.store.list::<QualityCheck>().await?;
        Ok(QualityGateEngine::can_perform_step(&checks, subject_id, step_index, &ordered))
    }

    /// 流水线看板
    pub async fn pipeline_board(&self, subject_id: &str, pipeline: Pipeline) -> ApiResult<Vec<StepBoardRow>> {
        let checks = self.store.list::<QualityCheck>().await?;
        Ok(QualityGateEngine::pipeline_board(&checks, subject_id, pipeline))
    }

    /// 某对象（或其所属批次）的全部质检（写入时间倒序）
    pub async fn checks_for(&self, subject_id: &str) -> ApiResult<Vec<QualityCheck>> {
        let checks = self.store.list::<QualityCheck>().await?;
        Ok(checks
            .into_iter()
            .filter(|c| c.subject.references(subject_id))
            .collect())
    }

    pub async fn list_checks(&self) -> ApiResult<Vec<QualityCheck>> {
        Ok(self.store.list().await?)
    }

    /// 管理员更正质检记录
    pub async fn correct_check(
        &self,
        admin_id: &str,
        check_id: &str,
        correction: QualityCheckCorrection,
    ) -> ApiResult<QualityCheck> {
        let admin = self.require_admin(admin_id).await?;
        let corrected = self.store.correct_quality_check(check_id, &correction).await?;
        info!(check_id, admin_id = %admin.id, status = %corrected.status, "质检记录已由管理员更正");
        Ok(corrected)
    }

    /// 管理员直接设置实体审核状态
    pub async fn override_status(
        &self,
        admin_id: &str,
        subject: &QualitySubject,
        status: RecordStatus,
    ) -> ApiResult<()> {
        let admin = self.require_admin(admin_id).await?;
        self.require_subject(subject, None).await?;
        self.store.update_status(subject, status).await?;
        info!(subject = subject.subject_id(), admin_id = %admin.id, status = %status, "实体状态已由管理员设置");
        Ok(())
    }
}
