// ==========================================
// 海产品加工追溯系统 - Entity Store
// ==========================================
// 职责: 各集合的类型化读写、订阅；组批挂靠；质检写入 + 状态回写
// 红线: 全部集合只归 Entity Store 所有，其他组件不持有权威状态副本
// 红线: 不做查询下推，过滤由调用方在完整集合上完成
// ==========================================

use crate::domain::quality::{QualityCheck, QualityCheckCorrection, QualitySubject};
use crate::domain::record::{Collection, Record};
use crate::domain::types::RecordStatus;
use crate::domain::RawMaterial;
use crate::repository::document_store::{DocumentStore, Snapshot, WriteOp};
use crate::repository::error::{RepositoryError, RepositoryResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

// ==========================================
// AssignmentOutcome - 原料挂靠结果
// ==========================================
/// 组批挂靠的结构化结果
///
/// 非原子存储下逐条写入，单条失败不回滚，也不中断后续写入
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentOutcome {
    pub lot_id: String,
    pub succeeded: Vec<String>,
    pub failed: Vec<AssignmentFailure>,
    pub atomic: bool, // 是否以单个事务写入
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentFailure {
    pub material_id: String,
    pub reason: String,
}

impl AssignmentOutcome {
    /// 是否全部挂靠成功
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

// ==========================================
// Subscription - 类型化订阅句柄
// ==========================================
/// 集合订阅（丢弃即取消订阅）
pub struct Subscription<R: Record> {
    receiver: watch::Receiver<Snapshot>,
    _marker: PhantomData<fn() -> R>,
}

impl<R: Record> Subscription<R> {
    /// 当前快照（并标记为已读）
    pub fn current(&mut self) -> RepositoryResult<Vec<R>> {
        let snapshot = self.receiver.borrow_and_update().clone();
        decode_all(snapshot)
    }

    /// 等待下一次变更，返回完整的新快照
    pub async fn changed(&mut self) -> RepositoryResult<Vec<R>> {
        self.receiver
            .changed()
            .await
            .map_err(|_| RepositoryError::SubscriptionClosed(R::COLLECTION.to_string()))?;
        self.current()
    }
}

fn encode<R: Record>(record: &R) -> RepositoryResult<Value> {
    serde_json::to_value(record).map_err(|e| RepositoryError::DocumentDecodeError {
        collection: R::COLLECTION.to_string(),
        message: e.to_string(),
    })
}

fn decode<R: Record>(doc: Value) -> RepositoryResult<R> {
    serde_json::from_value(doc).map_err(|e| RepositoryError::DocumentDecodeError {
        collection: R::COLLECTION.to_string(),
        message: e.to_string(),
    })
}

fn decode_all<R: Record>(docs: Snapshot) -> RepositoryResult<Vec<R>> {
    docs.into_iter().map(decode::<R>).collect()
}

/// 持久化失败统一记录日志后原样返回（不做自动重试）
fn logged<T>(operation: &str, collection: Collection, result: RepositoryResult<T>) -> RepositoryResult<T> {
    if let Err(e) = &result {
        error!(operation, collection = %collection, error = %e, "持久化操作失败");
    }
    result
}

/// 质检结论需要回写的实体状态
fn status_write(subject: &QualitySubject, status: RecordStatus) -> Option<WriteOp> {
    let (collection, id) = match subject {
        QualitySubject::Lot { .. } => return None,
        QualitySubject::RawMaterial { raw_material_id } => (Collection::RawMaterials, raw_material_id),
        QualitySubject::ProcessedBatch { batch_id, .. } => (Collection::ProcessedBatches, batch_id),
        QualitySubject::FinalProduct { product_id } => (Collection::FinalProducts, product_id),
    };
    Some(WriteOp::Patch {
        collection,
        id: id.clone(),
        partial: json!({ "status": status }),
    })
}

// ==========================================
// EntityStore
// ==========================================
pub struct EntityStore {
    backend: Arc<dyn DocumentStore>,
}

impl EntityStore {
    /// 创建 EntityStore
    ///
    /// # 参数
    /// - backend: 文档存储协作者
    pub fn new(backend: Arc<dyn DocumentStore>) -> Self {
        Self { backend }
    }

    /// 写入记录（存储边界校验 + upsert）
    pub async fn add<R: Record>(&self, record: &R) -> RepositoryResult<()> {
        record.validate().map_err(|reason| {
            warn!(collection = %R::COLLECTION, id = record.id(), %reason, "记录校验失败，拒绝写入");
            RepositoryError::ValidationError(reason)
        })?;
        let body = encode(record)?;
        logged("put", R::COLLECTION, self.backend.put(R::COLLECTION, record.id(), body).await)?;
        debug!(collection = %R::COLLECTION, id = record.id(), "记录已写入");
        Ok(())
    }

    /// 读取完整集合（写入时间倒序）
    pub async fn list<R: Record>(&self) -> RepositoryResult<Vec<R>> {
        let docs = logged("list", R::COLLECTION, self.backend.list(R::COLLECTION).await)?;
        decode_all(docs)
    }

    /// 按 id 读取
    pub async fn get<R: Record>(&self, id: &str) -> RepositoryResult<Option<R>> {
        let doc = logged("get", R::COLLECTION, self.backend.get(R::COLLECTION, id).await)?;
        doc.map(decode::<R>).transpose()
    }

    /// 按 id 读取，不存在则返回 NotFound
    pub async fn require<R: Record>(&self, id: &str) -> RepositoryResult<R> {
        self.get(id).await?.ok_or_else(|| RepositoryError::NotFound {
            entity: R::COLLECTION.to_string(),
            id: id.to_string(),
        })
    }

    /// 订阅集合
    pub async fn subscribe<R: Record>(&self) -> RepositoryResult<Subscription<R>> {
        let receiver = logged("subscribe", R::COLLECTION, self.backend.subscribe(R::COLLECTION).await)?;
        Ok(Subscription {
            receiver,
            _marker: PhantomData,
        })
    }

    /// 清空集合
    pub async fn clear(&self, collection: Collection) -> RepositoryResult<usize> {
        let deleted = logged("delete_all", collection, self.backend.delete_all(collection).await)?;
        info!(collection = %collection, deleted, "集合已清空");
        Ok(deleted)
    }

    /// 将原料挂靠到批次
    ///
    /// # 说明
    /// - 存储支持原子批量写: 单事务，全部成功或全部失败
    /// - 否则: 逐条顺序写入，失败项记录在 failed 中，不回滚已成功项
    pub async fn assign_raw_materials(
        &self,
        lot_id: &str,
        material_ids: &[String],
    ) -> RepositoryResult<AssignmentOutcome> {
        let patch = |material_id: &String| WriteOp::Patch {
            collection: RawMaterial::COLLECTION,
            id: material_id.clone(),
            partial: json!({ "lot_id": lot_id }),
        };

        let mut outcome = AssignmentOutcome {
            lot_id: lot_id.to_string(),
            succeeded: Vec::new(),
            failed: Vec::new(),
            atomic: self.backend.supports_atomic_batch(),
        };

        if outcome.atomic {
            let ops = material_ids.iter().map(patch).collect();
            match logged("commit", Collection::RawMaterials, self.backend.commit(ops).await) {
                Ok(()) => outcome.succeeded = material_ids.to_vec(),
                Err(e) => {
                    let reason = e.to_string();
                    outcome.failed = material_ids
                        .iter()
                        .map(|id| AssignmentFailure {
                            material_id: id.clone(),
                            reason: reason.clone(),
                        })
                        .collect();
                }
            }
        } else {
            for material_id in material_ids {
                let result = self
                    .backend
                    .patch(RawMaterial::COLLECTION, material_id, json!({ "lot_id": lot_id }))
                    .await;
                match logged("patch", RawMaterial::COLLECTION, result) {
                    Ok(()) => outcome.succeeded.push(material_id.clone()),
                    Err(e) => outcome.failed.push(AssignmentFailure {
                        material_id: material_id.clone(),
                        reason: e.to_string(),
                    }),
                }
            }
        }

        info!(
            lot_id,
            succeeded = outcome.succeeded.len(),
            failed = outcome.failed.len(),
            atomic = outcome.atomic,
            "原料挂靠完成"
        );
        Ok(outcome)
    }

    /// 写入质检记录并回写被检实体状态
    ///
    /// 原子存储下两次写入同一事务提交；否则先写质检再回写状态，任一失败均返回错误
    pub async fn record_quality_check(&self, check: &QualityCheck) -> RepositoryResult<()> {
        check.validate().map_err(RepositoryError::ValidationError)?;

        let mut ops = vec![WriteOp::Put {
            collection: QualityCheck::COLLECTION,
            id: check.id.clone(),
            body: encode(check)?,
        }];
        if let Some(op) = status_write(&check.subject, check.status.into()) {
            ops.push(op);
        }

        logged("commit", QualityCheck::COLLECTION, self.backend.commit(ops).await)?;
        info!(
            check_id = %check.id,
            step = %check.step,
            subject = check.subject.subject_id(),
            status = %check.status,
            "质检记录已写入"
        );
        Ok(())
    }

    /// 直接更新实体审核状态（原料/加工批次/成品）
    pub async fn update_status(&self, subject: &QualitySubject, status: RecordStatus) -> RepositoryResult<()> {
        match status_write(subject, status) {
            Some(op) => logged("commit", op.collection(), self.backend.commit(vec![op]).await),
            None => Err(RepositoryError::ValidationError(format!(
                "批次对象没有审核状态: {}",
                subject.subject_id()
            ))),
        }
    }

    /// 管理员更正质检记录
    ///
    /// 若更正了结论，同步回写被检实体状态
    pub async fn correct_quality_check(
        &self,
        check_id: &str,
        correction: &QualityCheckCorrection,
    ) -> RepositoryResult<QualityCheck> {
        if correction.is_empty() {
            return Err(RepositoryError::ValidationError("更正内容为空".to_string()));
        }
        let existing: QualityCheck = self.require(check_id).await?;

        let mut ops = vec![WriteOp::Patch {
            collection: QualityCheck::COLLECTION,
            id: check_id.to_string(),
            partial: serde_json::to_value(correction)?,
        }];
        if let Some(status) = correction.status {
            if let Some(op) = status_write(&existing.subject, status.into()) {
                ops.push(op);
            }
        }

        logged("commit", QualityCheck::COLLECTION, self.backend.commit(ops).await)?;
        info!(check_id, "质检记录已更正");
        self.require(check_id).await
    }
}
