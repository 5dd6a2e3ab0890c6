// ==========================================
// 海产品加工追溯系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 文档存储协作者 + 类型化 Entity Store
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod document_store;
pub mod entity_store;
pub mod error;

// 重导出核心仓储
pub use document_store::{DocumentStore, MemoryDocumentStore, Snapshot, SqliteDocumentStore, WriteOp};
pub use entity_store::{AssignmentFailure, AssignmentOutcome, EntityStore, Subscription};
pub use error::{RepositoryError, RepositoryResult};
