// ==========================================
// 海产品加工追溯系统 - 领域模型层
// ==========================================
// 职责: 定义各集合的静态记录类型与状态枚举
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod batch;
pub mod lot;
pub mod master_data;
pub mod material;
pub mod product;
pub mod quality;
pub mod record;
pub mod types;

// 重导出核心类型
pub use batch::{ByProduct, ProcessedBatch};
pub use lot::Lot;
pub use master_data::{ProductGrade, Supplier, User};
pub use material::RawMaterial;
pub use product::{BatchLabelPayload, FinalProduct, ProductLabelPayload};
pub use quality::{QualityCheck, QualityCheckCorrection, QualitySubject};
pub use record::{Collection, Record};
pub use types::{
    CheckStatus, DisposalMethod, LotStatus, ProcessStage, ProductType, QualityCheckStep,
    RecordStatus, StepStatus, UserRole,
};
