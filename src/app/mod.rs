// ==========================================
// 海产品加工追溯系统 - 应用层
// ==========================================
// 职责: 应用状态装配
// ==========================================

pub mod state;

pub use state::{get_default_db_path, AppState};
