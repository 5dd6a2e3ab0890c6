// ==========================================
// 海产品加工追溯系统 - 应用状态
// ==========================================
// 职责: 显式构造的上下文对象，持有 Entity Store 与全部 API 实例
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{
    DashboardApi, ExportApi, IntakeApi, LotApi, MasterDataApi, ProcessingApi, QualityApi,
};
use crate::config::config_manager::ConfigManager;
use crate::config::trace_config_trait::TraceConfigReader;
use crate::db::{init_schema, open_sqlite_connection};
use crate::repository::document_store::{DocumentStore, SqliteDocumentStore};
use crate::repository::entity_store::EntityStore;

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// Entity Store（全部集合的唯一所有者）
    pub store: Arc<EntityStore>,

    /// 配置读取
    pub config: Arc<dyn TraceConfigReader>,

    pub master_data_api: Arc<MasterDataApi>,
    pub intake_api: Arc<IntakeApi>,
    pub lot_api: Arc<LotApi>,
    pub processing_api: Arc<ProcessingApi>,
    pub quality_api: Arc<QualityApi>,
    pub dashboard_api: Arc<DashboardApi>,
    pub export_api: Arc<ExportApi>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径（":memory:" 为内存库）
    ///
    /// # 说明
    /// 文档存储与配置管理器共享同一连接
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        init_schema(&conn).map_err(|e| format!("数据库初始化失败: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        let backend: Arc<dyn DocumentStore> = Arc::new(SqliteDocumentStore::from_connection(conn.clone()));
        let config: Arc<dyn TraceConfigReader> = Arc::new(
            ConfigManager::from_connection(conn).map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        let state = Self::with_backend(db_path, backend, config);
        tracing::info!("AppState初始化完成");
        Ok(state)
    }

    /// 由任意文档存储与配置构造（内存存储等）
    pub fn with_backend(
        db_path: String,
        backend: Arc<dyn DocumentStore>,
        config: Arc<dyn TraceConfigReader>,
    ) -> Self {
        let store = Arc::new(EntityStore::new(backend));

        Self {
            db_path,
            master_data_api: Arc::new(MasterDataApi::new(store.clone())),
            intake_api: Arc::new(IntakeApi::new(store.clone())),
            lot_api: Arc::new(LotApi::new(store.clone(), config.clone())),
            processing_api: Arc::new(ProcessingApi::new(store.clone(), config.clone())),
            quality_api: Arc::new(QualityApi::new(store.clone(), config.clone())),
            dashboard_api: Arc::new(DashboardApi::new(store.clone())),
            export_api: Arc::new(ExportApi::new(store.clone())),
            store,
            config,
        }
    }

    /// 获取数据库路径
    pub fn get_db_path(&self) -> &str {
        &self.db_path
    }
}

// ==========================================
// 默认数据库路径辅助函数
// ==========================================

/// 获取默认数据库路径
///
/// # 返回
/// - SEAFOOD_TRACE_DB_PATH 环境变量（非空时）
/// - 开发环境: 用户数据目录/seafood-trace-dev/seafood_trace.db
/// - 生产环境: 用户数据目录/seafood-trace/seafood_trace.db
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("SEAFOOD_TRACE_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./seafood_trace.db");

    if let Some(data_dir) = dirs::data_dir() {
        #[cfg(debug_assertions)]
        {
            path = data_dir.join("seafood-trace-dev");
        }

        #[cfg(not(debug_assertions))]
        {
            path = data_dir.join("seafood-trace");
        }

        // 目录创建失败时由后续打开数据库报错
        std::fs::create_dir_all(&path).ok();
        path = path.join("seafood_trace.db");
    }

    path.to_string_lossy().to_string()
}
