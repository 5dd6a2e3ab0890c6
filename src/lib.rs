// ==========================================
// 海产品加工追溯系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 原料 → 批次 → 加工批次 → 成品 全链路追溯，质检逐步门控
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 文档存储与 Entity Store
pub mod repository;

// 引擎层 - 业务规则（纯函数）
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务用例
pub mod api;

// 应用层 - 上下文装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    CheckStatus, DisposalMethod, LotStatus, ProcessStage, ProductType, QualityCheckStep,
    RecordStatus, StepStatus, UserRole,
};

// 领域实体
pub use domain::{
    ByProduct, FinalProduct, Lot, ProcessedBatch, ProductGrade, QualityCheck, QualitySubject,
    RawMaterial, Supplier, User,
};

// 引擎
pub use engine::{
    CodeGenerator, Pipeline, QualityGateEngine, StageTransitionResolver, YieldCalculator,
};

// API
pub use api::{ApiError, ApiResult};
pub use app::AppState;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "海产品加工追溯系统";
