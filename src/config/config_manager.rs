// ==========================================
// 海产品加工追溯系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::trace_config_trait::TraceConfigReader;
use crate::db::open_sqlite_connection;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex, MutexGuard};

const GLOBAL_SCOPE: &str = "global";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        crate::db::init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let conn_guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
                params![GLOBAL_SCOPE, key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入 global scope 配置（upsert）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at)
             VALUES (?1, ?2, ?3, datetime('now'))
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3, updated_at = datetime('now')",
            params![GLOBAL_SCOPE, key, value],
        )?;
        tracing::info!(config_key = key, value, "配置已更新");
        Ok(())
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> RepositoryResult<String> {
        Ok(self
            .get_global_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// 解析数值配置，格式错误时告警并回退默认值
    fn parse_or_default<T: std::str::FromStr>(&self, key: &str, default: T) -> RepositoryResult<T> {
        let Some(raw) = self.get_global_config_value(key)? else {
            return Ok(default);
        };
        match raw.trim().parse::<T>() {
            Ok(v) => Ok(v),
            Err(_) => {
                tracing::warn!(config_key = key, raw_value = %raw, "配置格式错误，使用默认值");
                Ok(default)
            }
        }
    }
}

// ==========================================
// TraceConfigReader Trait 实现
// ==========================================
#[async_trait]
impl TraceConfigReader for ConfigManager {
    async fn get_box_number_width(&self) -> RepositoryResult<usize> {
        let width = self.parse_or_default(config_keys::BOX_NUMBER_WIDTH, defaults::BOX_NUMBER_WIDTH)?;
        if width == 0 {
            return Ok(defaults::BOX_NUMBER_WIDTH);
        }
        Ok(width)
    }

    async fn get_washing_kg_per_box(&self) -> RepositoryResult<f64> {
        let kg = self.parse_or_default(config_keys::WASHING_KG_PER_BOX, defaults::WASHING_KG_PER_BOX)?;
        if !kg.is_finite() || kg <= 0.0 {
            tracing::warn!(value = kg, "清洗每箱重量必须为正数，使用默认值");
            return Ok(defaults::WASHING_KG_PER_BOX);
        }
        Ok(kg)
    }

    async fn get_lot_number_prefix(&self) -> RepositoryResult<String> {
        let prefix = self.get_config_or_default(config_keys::LOT_NUMBER_PREFIX, defaults::LOT_NUMBER_PREFIX)?;
        let prefix = prefix.trim().to_uppercase();
        if prefix.is_empty() {
            Ok(defaults::LOT_NUMBER_PREFIX.to_string())
        } else {
            Ok(prefix)
        }
    }

    async fn get_enforce_quality_role(&self) -> RepositoryResult<bool> {
        let value = self.get_config_or_default(config_keys::ENFORCE_QUALITY_ROLE, "true")?;
        match value.trim().to_lowercase().as_str() {
            "false" | "0" | "no" => Ok(false),
            _ => Ok(true),
        }
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 箱号
    pub const BOX_NUMBER_WIDTH: &str = "box_number_width";

    // 清洗工序
    pub const WASHING_KG_PER_BOX: &str = "washing_kg_per_box";

    // 批次号
    pub const LOT_NUMBER_PREFIX: &str = "lot_number_prefix";

    // 质检权限
    pub const ENFORCE_QUALITY_ROLE: &str = "enforce_quality_role";
}

pub mod defaults {
    pub const BOX_NUMBER_WIDTH: usize = 4;
    pub const WASHING_KG_PER_BOX: f64 = 25.0;
    pub const LOT_NUMBER_PREFIX: &str = "LOT";
}
