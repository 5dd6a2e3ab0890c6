// ==========================================
// 海产品加工追溯系统 - 文档存储协作者
// ==========================================
// 职责: 定义核心层依赖的最小持久化契约（订阅/写入/局部更新/清空）
// 红线: Repository 不含业务逻辑；记录不做服务端编号，id 由调用方生成
// ==========================================
// 订阅语义:
// - 每次集合变更推送“完整集合快照”（按写入时间倒序）
// - 新快照整体替换旧快照（watch 通道天然满足）
// - 丢弃 Receiver 即取消订阅
// ==========================================

use crate::db::{init_schema, open_sqlite_connection};
use crate::domain::record::Collection;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;

/// 集合快照（写入时间倒序）
pub type Snapshot = Vec<Value>;

// ==========================================
// WriteOp - 批量写入操作
// ==========================================
#[derive(Debug, Clone)]
pub enum WriteOp {
    /// 整体写入（同 id 视为替换）
    Put {
        collection: Collection,
        id: String,
        body: Value,
    },
    /// 局部更新（顶层字段合并，文档必须已存在）
    Patch {
        collection: Collection,
        id: String,
        partial: Value,
    },
}

impl WriteOp {
    pub fn collection(&self) -> Collection {
        match self {
            WriteOp::Put { collection, .. } | WriteOp::Patch { collection, .. } => *collection,
        }
    }
}

// ==========================================
// Trait: DocumentStore
// ==========================================
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// 订阅集合，Receiver 初始值即当前快照
    async fn subscribe(&self, collection: Collection) -> RepositoryResult<watch::Receiver<Snapshot>>;

    /// 读取完整集合（写入时间倒序）
    async fn list(&self, collection: Collection) -> RepositoryResult<Snapshot>;

    /// 按 id 读取
    async fn get(&self, collection: Collection, id: &str) -> RepositoryResult<Option<Value>>;

    /// upsert
    async fn put(&self, collection: Collection, id: &str, body: Value) -> RepositoryResult<()>;

    /// 局部更新
    async fn patch(&self, collection: Collection, id: &str, partial: Value) -> RepositoryResult<()>;

    /// 清空集合，返回删除条数
    async fn delete_all(&self, collection: Collection) -> RepositoryResult<usize>;

    /// 是否支持多文档原子写入
    fn supports_atomic_batch(&self) -> bool {
        false
    }

    /// 批量写入
    ///
    /// - supports_atomic_batch = true: 全部成功或全部不生效
    /// - 否则: 顺序执行，遇错即停（之前的写入保留）
    async fn commit(&self, ops: Vec<WriteOp>) -> RepositoryResult<()> {
        for op in ops {
            match op {
                WriteOp::Put { collection, id, body } => self.put(collection, &id, body).await?,
                WriteOp::Patch { collection, id, partial } => {
                    self.patch(collection, &id, partial).await?
                }
            }
        }
        Ok(())
    }
}

/// 顶层字段合并（嵌套对象整体替换）
fn merge_top_level(target: &mut Value, partial: &Value) -> RepositoryResult<()> {
    let (Some(target_obj), Some(partial_obj)) = (target.as_object_mut(), partial.as_object()) else {
        return Err(RepositoryError::ValidationError(
            "局部更新只支持 JSON 对象".to_string(),
        ));
    };
    for (key, value) in partial_obj {
        target_obj.insert(key.clone(), value.clone());
    }
    Ok(())
}

// ==========================================
// SqliteDocumentStore - SQLite 实现
// ==========================================
/// 文档存储（SQLite）
/// 职责: documents 表的读写 + 订阅推送
pub struct SqliteDocumentStore {
    conn: Arc<Mutex<Connection>>,
    channels: Mutex<HashMap<Collection, watch::Sender<Snapshot>>>,
}

impl SqliteDocumentStore {
    /// 创建新的 SqliteDocumentStore 实例（自动建表）
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        init_schema(&conn)?;
        Ok(Self::from_connection(Arc::new(Mutex::new(conn))))
    }

    /// 从已有连接创建（调用方负责建表）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            conn,
            channels: Mutex::new(HashMap::new()),
        }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn get_channels(&self) -> RepositoryResult<MutexGuard<HashMap<Collection, watch::Sender<Snapshot>>>> {
        self.channels
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn load_collection(conn: &Connection, collection: Collection) -> RepositoryResult<Snapshot> {
        let mut stmt = conn.prepare(
            "SELECT body FROM documents WHERE collection = ?1 ORDER BY write_seq DESC",
        )?;
        let bodies = stmt
            .query_map(params![collection.as_str()], |row| row.get::<_, String>(0))?
            .collect::<SqliteResult<Vec<String>>>()?;

        bodies
            .iter()
            .map(|raw| {
                serde_json::from_str(raw).map_err(|e| RepositoryError::DocumentDecodeError {
                    collection: collection.to_string(),
                    message: e.to_string(),
                })
            })
            .collect()
    }

    fn load_one(conn: &Connection, collection: Collection, id: &str) -> RepositoryResult<Option<Value>> {
        let raw: Option<String> = conn
            .query_row(
                "SELECT body FROM documents WHERE collection = ?1 AND id = ?2",
                params![collection.as_str(), id],
                |row| row.get(0),
            )
            .optional()?;

        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw).map_err(|e| {
                RepositoryError::DocumentDecodeError {
                    collection: collection.to_string(),
                    message: e.to_string(),
                }
            })?)),
            None => Ok(None),
        }
    }

    fn put_in(conn: &Connection, collection: Collection, id: &str, body: &Value) -> RepositoryResult<()> {
        let now = Utc::now().to_rfc3339();
        let next_seq: i64 = conn.query_row(
            "SELECT COALESCE(MAX(write_seq), 0) + 1 FROM documents",
            [],
            |row| row.get(0),
        )?;
        conn.execute(
            r#"
            INSERT INTO documents (collection, id, body, write_seq, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            ON CONFLICT(collection, id) DO UPDATE SET
                body = excluded.body,
                write_seq = excluded.write_seq,
                updated_at = excluded.updated_at
            "#,
            params![collection.as_str(), id, serde_json::to_string(body)?, next_seq, now],
        )?;
        Ok(())
    }

    fn patch_in(conn: &Connection, collection: Collection, id: &str, partial: &Value) -> RepositoryResult<()> {
        let mut body = Self::load_one(conn, collection, id)?.ok_or_else(|| RepositoryError::NotFound {
            entity: collection.to_string(),
            id: id.to_string(),
        })?;
        merge_top_level(&mut body, partial)?;
        conn.execute(
            "UPDATE documents SET body = ?3, updated_at = ?4 WHERE collection = ?1 AND id = ?2",
            params![
                collection.as_str(),
                id,
                serde_json::to_string(&body)?,
                Utc::now().to_rfc3339()
            ],
        )?;
        Ok(())
    }

    /// 推送最新快照（仅在有订阅者时读取集合）
    fn publish(&self, conn: &Connection, collection: Collection) -> RepositoryResult<()> {
        let channels = self.get_channels()?;
        if let Some(sender) = channels.get(&collection) {
            if sender.receiver_count() > 0 {
                let snapshot = Self::load_collection(conn, collection)?;
                sender.send_replace(snapshot);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn subscribe(&self, collection: Collection) -> RepositoryResult<watch::Receiver<Snapshot>> {
        let conn = self.get_conn()?;
        let mut channels = self.get_channels()?;

        if let Some(sender) = channels.get(&collection) {
            // 通道可能在无订阅者期间错过推送，先刷新
            sender.send_replace(Self::load_collection(&conn, collection)?);
            return Ok(sender.subscribe());
        }

        let (sender, receiver) = watch::channel(Self::load_collection(&conn, collection)?);
        channels.insert(collection, sender);
        Ok(receiver)
    }

    async fn list(&self, collection: Collection) -> RepositoryResult<Snapshot> {
        let conn = self.get_conn()?;
        Self::load_collection(&conn, collection)
    }

    async fn get(&self, collection: Collection, id: &str) -> RepositoryResult<Option<Value>> {
        let conn = self.get_conn()?;
        Self::load_one(&conn, collection, id)
    }

    async fn put(&self, collection: Collection, id: &str, body: Value) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        Self::put_in(&conn, collection, id, &body)?;
        self.publish(&conn, collection)
    }

    async fn patch(&self, collection: Collection, id: &str, partial: Value) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        Self::patch_in(&conn, collection, id, &partial)?;
        self.publish(&conn, collection)
    }

    async fn delete_all(&self, collection: Collection) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let deleted = conn.execute(
            "DELETE FROM documents WHERE collection = ?1",
            params![collection.as_str()],
        )?;
        self.publish(&conn, collection)?;
        Ok(deleted)
    }

    fn supports_atomic_batch(&self) -> bool {
        true
    }

    async fn commit(&self, ops: Vec<WriteOp>) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let mut touched = HashSet::new();
        for op in &ops {
            match op {
                WriteOp::Put { collection, id, body } => Self::put_in(&tx, *collection, id, body)?,
                WriteOp::Patch { collection, id, partial } => {
                    Self::patch_in(&tx, *collection, id, partial)?
                }
            }
            touched.insert(op.collection());
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        for collection in touched {
            self.publish(&conn, collection)?;
        }
        Ok(())
    }
}

// ==========================================
// MemoryDocumentStore - 内存实现
// ==========================================
// 用途: 临时会话 / 无盘测试；不支持原子批量写
#[derive(Default)]
struct MemoryState {
    write_seq: u64,
    documents: HashMap<Collection, Vec<(String, Value, u64)>>,
    channels: HashMap<Collection, watch::Sender<Snapshot>>,
}

impl MemoryState {
    fn snapshot(&self, collection: Collection) -> Snapshot {
        let mut docs: Vec<&(String, Value, u64)> = self
            .documents
            .get(&collection)
            .map(|docs| docs.iter().collect())
            .unwrap_or_default();
        docs.sort_by(|a, b| b.2.cmp(&a.2));
        docs.into_iter().map(|(_, body, _)| body.clone()).collect()
    }

    fn publish(&self, collection: Collection) {
        if let Some(sender) = self.channels.get(&collection) {
            if sender.receiver_count() > 0 {
                sender.send_replace(self.snapshot(collection));
            }
        }
    }
}

#[derive(Default)]
pub struct MemoryDocumentStore {
    state: Mutex<MemoryState>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn get_state(&self) -> RepositoryResult<MutexGuard<MemoryState>> {
        self.state
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn subscribe(&self, collection: Collection) -> RepositoryResult<watch::Receiver<Snapshot>> {
        let mut state = self.get_state()?;
        let snapshot = state.snapshot(collection);
        if let Some(sender) = state.channels.get(&collection) {
            sender.send_replace(snapshot);
            return Ok(sender.subscribe());
        }
        let (sender, receiver) = watch::channel(snapshot);
        state.channels.insert(collection, sender);
        Ok(receiver)
    }

    async fn list(&self, collection: Collection) -> RepositoryResult<Snapshot> {
        Ok(self.get_state()?.snapshot(collection))
    }

    async fn get(&self, collection: Collection, id: &str) -> RepositoryResult<Option<Value>> {
        let state = self.get_state()?;
        Ok(state
            .documents
            .get(&collection)
            .and_then(|docs| docs.iter().find(|(doc_id, _, _)| doc_id == id))
            .map(|(_, body, _)| body.clone()))
    }

    async fn put(&self, collection: Collection, id: &str, body: Value) -> RepositoryResult<()> {
        let mut state = self.get_state()?;
        state.write_seq += 1;
        let seq = state.write_seq;
        let docs = state.documents.entry(collection).or_default();
        match docs.iter_mut().find(|(doc_id, _, _)| doc_id == id) {
            Some(doc) => *doc = (id.to_string(), body, seq),
            None => docs.push((id.to_string(), body, seq)),
        }
        state.publish(collection);
        Ok(())
    }

    async fn patch(&self, collection: Collection, id: &str, partial: Value) -> RepositoryResult<()> {
        let mut state = self.get_state()?;
        let doc = state
            .documents
            .get_mut(&collection)
            .and_then(|docs| docs.iter_mut().find(|(doc_id, _, _)| doc_id == id))
            .ok_or_else(|| RepositoryError::NotFound {
                entity: collection.to_string(),
                id: id.to_string(),
            })?;
        merge_top_level(&mut doc.1, &partial)?;
        state.publish(collection);
        Ok(())
    }

    async fn delete_all(&self, collection: Collection) -> RepositoryResult<usize> {
        let mut state = self.get_state()?;
        let deleted = state.documents.remove(&collection).map_or(0, |docs| docs.len());
        state.publish(collection);
        Ok(deleted)
    }
}
