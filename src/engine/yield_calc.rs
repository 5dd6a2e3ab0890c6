// ==========================================
// 海产品加工追溯系统 - Yield/Aggregation Calculator
// ==========================================
// 职责: 批次得率、质检通过率、批次剩余可加工量
// 红线: 每次读取重新计算，不缓存；不产生 Inf/NaN
// ==========================================

use crate::domain::batch::ProcessedBatch;
use crate::domain::lot::Lot;
use crate::domain::quality::QualityCheck;
use crate::domain::types::CheckStatus;
use serde::Serialize;
use std::fmt;

// ==========================================
// YieldValue - 得率
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum YieldValue {
    Percent(f64),
    NotApplicable, // 批次总量为 0
}

impl fmt::Display for YieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            YieldValue::Percent(p) => write!(f, "{:.2}", p),
            YieldValue::NotApplicable => write!(f, "N/A"),
        }
    }
}

/// 单批次得率
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LotYield {
    pub lot_id: String,
    pub lot_number: String,
    pub total_quantity: f64,
    pub processed_quantity: f64,
    pub yield_value: YieldValue,
}

// ==========================================
// QualityStats - 质检统计
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QualityStats {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub pass_rate: f64, // 百分比
}

impl QualityStats {
    /// 通过率展示值（一位小数）
    pub fn pass_rate_display(&self) -> String {
        format!("{:.1}", self.pass_rate)
    }
}

pub struct YieldCalculator;

impl YieldCalculator {
    /// 批次下所有加工批次的数量合计
    pub fn processed_quantity(lot_id: &str, batches: &[ProcessedBatch]) -> f64 {
        batches
            .iter()
            .filter(|b| b.lot_id == lot_id)
            .map(|b| b.quantity)
            .sum()
    }

    /// 批次剩余可加工量（总量 - 已加工量，不小于 0）
    pub fn lot_remainder(lot: &Lot, batches: &[ProcessedBatch]) -> f64 {
        (lot.total_quantity - Self::processed_quantity(&lot.id, batches)).max(0.0)
    }

    /// 单批次得率 = Σ加工数量 / 批次总量 × 100
    pub fn lot_yield(lot: &Lot, batches: &[ProcessedBatch]) -> LotYield {
        let processed_quantity = Self::processed_quantity(&lot.id, batches);
        let yield_value = if lot.total_quantity > 0.0 {
            YieldValue::Percent(processed_quantity / lot.total_quantity * 100.0)
        } else {
            YieldValue::NotApplicable
        };

        LotYield {
            lot_id: lot.id.clone(),
            lot_number: lot.lot_number.clone(),
            total_quantity: lot.total_quantity,
            processed_quantity,
            yield_value,
        }
    }

    /// 所有批次得率（保持批次集合顺序）
    pub fn lot_yields(lots: &[Lot], batches: &[ProcessedBatch]) -> Vec<LotYield> {
        lots.iter().map(|lot| Self::lot_yield(lot, batches)).collect()
    }

    /// 通过率 = passed / total × 100；total = 0 → 0
    pub fn pass_rate(passed: usize, total: usize) -> f64 {
        if total == 0 {
            return 0.0;
        }
        passed as f64 / total as f64 * 100.0
    }

    /// 质检统计
    pub fn quality_stats(checks: &[QualityCheck]) -> QualityStats {
        let total = checks.len();
        let passed = checks.iter().filter(|c| c.status == CheckStatus::Passed).count();
        QualityStats {
            total,
            passed,
            failed: total - passed,
            pass_rate: Self::pass_rate(passed, total),
        }
    }
}
