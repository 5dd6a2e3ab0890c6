// ==========================================
// 海产品加工追溯系统 - 配置层
// ==========================================
// 职责: 系统配置管理（带默认值）
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod trace_config_trait;

// 重导出核心配置管理器
pub use config_manager::{config_keys, defaults, ConfigManager};
pub use trace_config_trait::TraceConfigReader;
