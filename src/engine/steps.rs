// ==========================================
// 海产品加工追溯系统 - 质检流水线定义
// ==========================================
// 两条独立流水线，各自按顺序门控:
// - 生产线: 原料接收 → 滚筒清洗 → 净化 → 高压清洗 → 活体分拣 → 分级 → 蒸煮 → 取肉 → 终检放行
// - 终包装线: 成品入库 → 质量参数（微生物）
// ==========================================

use crate::domain::types::QualityCheckStep;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 流水线步骤（标识 + 展示名）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PipelineStep {
    pub step: QualityCheckStep,
    pub label: &'static str,
}

/// 生产线步骤（顺序即门控顺序）
pub const PRODUCTION_STEPS: [PipelineStep; 9] = [
    PipelineStep { step: QualityCheckStep::RawMaterialReceiving, label: "Raw Material Receiving" },
    PipelineStep { step: QualityCheckStep::RotaryScreenWashing, label: "Rotary Screen Washing" },
    PipelineStep { step: QualityCheckStep::Depuration, label: "Depuration" },
    PipelineStep { step: QualityCheckStep::PressureWasher, label: "Pressure Washer" },
    PipelineStep { step: QualityCheckStep::LiveSeparation, label: "Live Separation" },
    PipelineStep { step: QualityCheckStep::Grading, label: "Grading" },
    PipelineStep { step: QualityCheckStep::Cooking, label: "Cooking" },
    PipelineStep { step: QualityCheckStep::MeatSeparation, label: "Meat Separation" },
    PipelineStep { step: QualityCheckStep::FinalQcRelease, label: "Final QC Release" },
];

/// 终包装线步骤
pub const FINAL_PACKING_STEPS: [PipelineStep; 2] = [
    PipelineStep { step: QualityCheckStep::Form3ProductIn, label: "Final Packing - Product IN" },
    PipelineStep { step: QualityCheckStep::Form3Microbiology, label: "Final Packing - Quality Parameters" },
];

// ==========================================
// Pipeline - 流水线
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Pipeline {
    Production,   // 对象: Lot
    FinalPacking, // 对象: FinalProduct
}

impl Pipeline {
    pub fn steps(&self) -> &'static [PipelineStep] {
        match self {
            Pipeline::Production => &PRODUCTION_STEPS,
            Pipeline::FinalPacking => &FINAL_PACKING_STEPS,
        }
    }

    /// 有序步骤标识
    pub fn ordered_steps(&self) -> Vec<QualityCheckStep> {
        self.steps().iter().map(|s| s.step).collect()
    }

    /// 步骤在流水线中的位置
    pub fn position(&self, step: QualityCheckStep) -> Option<usize> {
        self.steps().iter().position(|s| s.step == step)
    }

    /// 步骤所属流水线（阶段级步骤不属于任何流水线）
    pub fn of_step(step: QualityCheckStep) -> Option<Pipeline> {
        [Pipeline::Production, Pipeline::FinalPacking]
            .into_iter()
            .find(|p| p.position(step).is_some())
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pipeline::Production => write!(f, "production"),
            Pipeline::FinalPacking => write!(f, "final-packing"),
        }
    }
}
