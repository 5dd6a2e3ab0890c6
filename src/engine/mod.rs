// ==========================================
// 海产品加工追溯系统 - 引擎层
// ==========================================
// 职责: 质检门控、阶段推断、得率统计、编码生成
// 红线: Engine 不拼 SQL、不做 I/O；输入为完整集合快照
// 红线: 门控判定必须输出 reason
// ==========================================

pub mod codes;
pub mod quality_gate;
pub mod stage_resolver;
pub mod steps;
pub mod yield_calc;

// 重导出核心引擎
pub use codes::{CodeGenerator, FINAL_BOX_PREFIX, MAX_BOX_COUNT, MAX_CODE_ATTEMPTS};
pub use quality_gate::{GateDecision, QualityGateEngine, StepBoardRow};
pub use stage_resolver::{LotInProgress, StageTransitionResolver};
pub use steps::{Pipeline, PipelineStep, FINAL_PACKING_STEPS, PRODUCTION_STEPS};
pub use yield_calc::{LotYield, QualityStats, YieldCalculator, YieldValue};
