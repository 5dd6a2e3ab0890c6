// ==========================================
// 海产品加工追溯系统 - API 层
// ==========================================
// 职责: 业务用例入口（校验 → 门控 → 写入），供上层界面调用
// ==========================================

pub mod error;
pub mod dashboard_api;
pub mod export_api;
pub mod intake_api;
pub mod lot_api;
pub mod master_data_api;
pub mod processing_api;
pub mod quality_api;
pub mod validator;

// 重导出核心类型
pub use error::{ApiError, ApiResult, ValidationViolation};
pub use dashboard_api::{DashboardApi, DashboardSummary};
pub use export_api::ExportApi;
pub use intake_api::{IntakeApi, NewRawMaterial};
pub use lot_api::{LotApi, LotCreation, NewLot};
pub use master_data_api::{MasterDataApi, NewGrade, NewSupplier, NewUser};
pub use processing_api::{
    NewByProduct, NewFinalProduct, NewProcessingBatch, NewWashingBatch, ProcessingApi, UNGRADED,
};
pub use quality_api::{CheckSubmission, QualityApi};
pub use validator::TraceInputValidator;
