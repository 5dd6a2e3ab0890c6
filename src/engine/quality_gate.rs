// ==========================================
// 海产品加工追溯系统 - Quality Gate Engine
// ==========================================
// 职责: 计算步骤状态、判定下一步是否解锁
// 红线: 无状态、无副作用、无 I/O 操作（输入为完整质检集合）
// ==========================================
// 规则:
// 1. step_status: 取 (对象, 步骤) 最新一条质检；无记录 → Pending
// 2. can_perform_step: 第 0 步恒可执行；其余步骤要求前一步 Passed
// 3. 前一步 Failed 会阻断后续所有步骤，直到补录一条 Passed
// ==========================================

use crate::domain::quality::QualityCheck;
use crate::domain::types::{QualityCheckStep, StepStatus};
use crate::engine::steps::Pipeline;
use serde::Serialize;

/// 门控判定结果（附可解释原因）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GateDecision {
    pub step: QualityCheckStep,
    pub step_index: usize,
    pub allowed: bool,
    pub blocking_step: Option<QualityCheckStep>, // 未通过的前一步
    pub blocking_status: Option<StepStatus>,
    pub reason: String,
}

/// 流水线看板行
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepBoardRow {
    pub step: QualityCheckStep,
    pub label: &'static str,
    pub status: StepStatus,
    pub can_perform: bool,
}

// ==========================================
// QualityGateEngine - 纯函数工具类
// ==========================================
pub struct QualityGateEngine;

impl QualityGateEngine {
    /// 查找 (对象, 步骤) 的最新质检
    ///
    /// # 规则
    /// - 最新 = checked_at 最大
    /// - checked_at 相同: 取集合中靠前者（集合按写入时间倒序）
    pub fn latest_check<'a>(
        checks: &'a [QualityCheck],
        subject_id: &str,
        step: QualityCheckStep,
    ) -> Option<&'a QualityCheck> {
        checks
            .iter()
            .filter(|c| c.step == step && c.subject.references(subject_id))
            .fold(None, |latest: Option<&QualityCheck>, c| match latest {
                Some(best) if best.checked_at >= c.checked_at => Some(best),
                _ => Some(c),
            })
    }

    /// 步骤状态
    pub fn step_status(checks: &[QualityCheck], subject_id: &str, step: QualityCheckStep) -> StepStatus {
        Self::latest_check(checks, subject_id, step)
            .map(|c| c.status.into())
            .unwrap_or(StepStatus::Pending)
    }

    /// 判定步骤是否可执行
    ///
    /// # 参数
    /// - step_index: 步骤在 ordered_steps 中的下标
    /// - ordered_steps: 有序步骤
    ///
    /// # 返回
    /// - step_index = 0 → true
    /// - step_index 越界 → false
    /// - 否则 → 前一步最新结论为 Passed
    pub fn can_perform_step(
        checks: &[QualityCheck],
        subject_id: &str,
        step_index: usize,
        ordered_steps: &[QualityCheckStep],
    ) -> bool {
        if step_index == 0 {
            return true;
        }
        if step_index >= ordered_steps.len() {
            return false;
        }
        let previous = ordered_steps[step_index - 1];
        Self::step_status(checks, subject_id, previous) == StepStatus::Passed
    }

    /// 针对流水线中的具体步骤做门控判定
    ///
    /// # 返回
    /// - None: 步骤不属于该流水线
    pub fn evaluate(
        checks: &[QualityCheck],
        subject_id: &str,
        pipeline: Pipeline,
        step: QualityCheckStep,
    ) -> Option<GateDecision> {
        let step_index = pipeline.position(step)?;
        let ordered = pipeline.ordered_steps();
        let allowed = Self::can_perform_step(checks, subject_id, step_index, &ordered);

        let (blocking_step, blocking_status, reason) = if allowed {
            (None, None, format!("步骤 {} 可执行", step))
        } else {
            let previous = ordered[step_index - 1];
            let status = Self::step_status(checks, subject_id, previous);
            (
                Some(previous),
                Some(status),
                format!("前序步骤 {} 状态为 {}，需先通过质检", previous, status),
            )
        };

        Some(GateDecision {
            step,
            step_index,
            allowed,
            blocking_step,
            blocking_status,
            reason,
        })
    }

    /// 流水线看板（每步状态 + 是否可执行）
    pub fn pipeline_board(checks: &[QualityCheck], subject_id: &str, pipeline: Pipeline) -> Vec<StepBoardRow> {
        let ordered = pipeline.ordered_steps();
        pipeline
            .steps()
            .iter()
            .enumerate()
            .map(|(index, s)| StepBoardRow {
                step: s.step,
                label: s.label,
                status: Self::step_status(checks, subject_id, s.step),
                can_perform: Self::can_perform_step(checks, subject_id, index, &ordered),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::quality::QualitySubject;
    use crate::domain::types::CheckStatus;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap()
    }

    fn lot_check(id: &str, lot: &str, step: QualityCheckStep, status: CheckStatus, minutes: i64) -> QualityCheck {
        QualityCheck {
            id: id.to_string(),
            step,
            subject: QualitySubject::Lot { lot_id: lot.to_string() },
            status,
            checked_at: base_time() + Duration::minutes(minutes),
            checked_by: "qc-1".to_string(),
            temperature: None,
            appearance: None,
            weight: None,
            comments: None,
        }
    }

    fn production() -> Vec<QualityCheckStep> {
        Pipeline::Production.ordered_steps()
    }

    // ==========================================
    // 测试 1: 步骤状态
    // ==========================================

    #[test]
    fn test_step_without_checks_is_pending() {
        let status = QualityGateEngine::step_status(&[], "L1", QualityCheckStep::Depuration);
        assert_eq!(status, StepStatus::Pending);
    }

    #[test]
    fn test_later_pass_overrides_earlier_fail() {
        // 集合按写入倒序：新记录在前
        let checks = vec![
            lot_check("c2", "L1", QualityCheckStep::Depuration, CheckStatus::Passed, 30),
            lot_check("c1", "L1", QualityCheckStep::Depuration, CheckStatus::Failed, 10),
        ];
        assert_eq!(
            QualityGateEngine::step_status(&checks, "L1", QualityCheckStep::Depuration),
            StepStatus::Passed
        );

        // 输入顺序不影响结果
        let reversed: Vec<_> = checks.into_iter().rev().collect();
        assert_eq!(
            QualityGateEngine::step_status(&reversed, "L1", QualityCheckStep::Depuration),
            StepStatus::Passed
        );
    }

    #[test]
    fn test_same_timestamp_prefers_newest_write() {
        let checks = vec![
            lot_check("newer", "L1", QualityCheckStep::Grading, CheckStatus::Failed, 5),
            lot_check("older", "L1", QualityCheckStep::Grading, CheckStatus::Passed, 5),
        ];
        let latest = QualityGateEngine::latest_check(&checks, "L1", QualityCheckStep::Grading).unwrap();
        assert_eq!(latest.id, "newer");
    }

    #[test]
    fn test_step_status_is_stable_under_repeated_reads() {
        let checks = vec![lot_check("c1", "L1", QualityCheckStep::Cooking, CheckStatus::Failed, 0)];
        let first = QualityGateEngine::step_status(&checks, "L1", QualityCheckStep::Cooking);
        for _ in 0..5 {
            assert_eq!(QualityGateEngine::step_status(&checks, "L1", QualityCheckStep::Cooking), first);
        }
    }

    #[test]
    fn test_checks_of_other_lots_are_ignored() {
        let checks = vec![lot_check("c1", "L2", QualityCheckStep::Depuration, CheckStatus::Passed, 0)];
        assert_eq!(
            QualityGateEngine::step_status(&checks, "L1", QualityCheckStep::Depuration),
            StepStatus::Pending
        );
    }

    // ==========================================
    // 测试 2: 顺序门控
    // ==========================================

    #[test]
    fn test_first_step_always_allowed() {
        let steps = production();
        let checks = vec![lot_check(
            "c1",
            "L1",
            QualityCheckStep::RawMaterialReceiving,
            CheckStatus::Failed,
            0,
        )];
        assert!(QualityGateEngine::can_perform_step(&[], "L1", 0, &steps));
        assert!(QualityGateEngine::can_perform_step(&checks, "L1", 0, &steps));
        assert!(QualityGateEngine::can_perform_step(&[], "L1", 0, &[]));
    }

    #[test]
    fn test_step_requires_passed_predecessor() {
        let steps = production();
        assert!(!QualityGateEngine::can_perform_step(&[], "L1", 1, &steps));

        let passed = vec![lot_check(
            "c1",
            "L1",
            QualityCheckStep::RawMaterialReceiving,
            CheckStatus::Passed,
            0,
        )];
        assert!(QualityGateEngine::can_perform_step(&passed, "L1", 1, &steps));
        // 只看紧邻的前一步
        assert!(!QualityGateEngine::can_perform_step(&passed, "L1", 2, &steps));
    }

    #[test]
    fn test_failed_predecessor_blocks_until_corrected() {
        let steps = production();
        let mut checks = vec![lot_check(
            "c1",
            "L1",
            QualityCheckStep::RawMaterialReceiving,
            CheckStatus::Failed,
            0,
        )];
        assert!(!QualityGateEngine::can_perform_step(&checks, "L1", 1, &steps));

        checks.insert(
            0,
            lot_check("c2", "L1", QualityCheckStep::RawMaterialReceiving, CheckStatus::Passed, 20),
        );
        assert!(QualityGateEngine::can_perform_step(&checks, "L1", 1, &steps));
    }

    #[test]
    fn test_out_of_range_index_is_not_allowed() {
        let steps = production();
        assert!(!QualityGateEngine::can_perform_step(&[], "L1", steps.len(), &steps));
    }

    #[test]
    fn test_evaluate_reports_blocking_step() {
        let checks = vec![lot_check("c1", "L1", QualityCheckStep::Depuration, CheckStatus::Failed, 0)];
        let decision = QualityGateEngine::evaluate(
            &checks,
            "L1",
            Pipeline::Production,
            QualityCheckStep::PressureWasher,
        )
        .unwrap();
        assert!(!decision.allowed);
        assert_eq!(decision.step_index, 3);
        assert_eq!(decision.blocking_step, Some(QualityCheckStep::Depuration));
        assert_eq!(decision.blocking_status, Some(StepStatus::Failed));
    }

    #[test]
    fn test_evaluate_rejects_step_from_other_pipeline() {
        let decision = QualityGateEngine::evaluate(
            &[],
            "P1",
            Pipeline::FinalPacking,
            QualityCheckStep::Cooking,
        );
        assert!(decision.is_none());
    }

    #[test]
    fn test_pipelines_are_gated_independently() {
        let checks = vec![lot_check(
            "c1",
            "L1",
            QualityCheckStep::RawMaterialReceiving,
            CheckStatus::Passed,
            0,
        )];
        let board = QualityGateEngine::pipeline_board(&checks, "L1", Pipeline::FinalPacking);
        assert_eq!(board.len(), 2);
        assert!(board[0].can_perform);
        assert!(!board[1].can_perform);
        assert!(board.iter().all(|row| row.status == StepStatus::Pending));
    }

    #[test]
    fn test_pipeline_board_tracks_progress() {
        let checks = vec![
            lot_check("c2", "L1", QualityCheckStep::RotaryScreenWashing, CheckStatus::Failed, 10),
            lot_check("c1", "L1", QualityCheckStep::RawMaterialReceiving, CheckStatus::Passed, 0),
        ];
        let board = QualityGateEngine::pipeline_board(&checks, "L1", Pipeline::Production);
        assert_eq!(board[0].status, StepStatus::Passed);
        assert_eq!(board[1].status, StepStatus::Failed);
        assert!(board[1].can_perform);
        assert!(!board[2].can_perform);
    }
}
