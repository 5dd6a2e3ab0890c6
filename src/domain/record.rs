// ==========================================
// 海产品加工追溯系统 - 持久化记录契约
// ==========================================
// 职责: 定义集合名称与各集合记录类型的统一约束
// 红线: 标识由调用方生成（不透明唯一串），写入同 id 视为整体替换
// ==========================================

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// Collection - 集合
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Collection {
    Users,
    Suppliers,
    ProductGrades,
    RawMaterials,
    Lots,
    ProcessedBatches,
    ByProducts,
    FinalProducts,
    QualityChecks,
}

impl Collection {
    /// 全部集合（用于建表/清空等批量操作）
    pub const ALL: [Collection; 9] = [
        Collection::Users,
        Collection::Suppliers,
        Collection::ProductGrades,
        Collection::RawMaterials,
        Collection::Lots,
        Collection::ProcessedBatches,
        Collection::ByProducts,
        Collection::FinalProducts,
        Collection::QualityChecks,
    ];

    /// 存储层使用的集合名
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Suppliers => "suppliers",
            Collection::ProductGrades => "productGrades",
            Collection::RawMaterials => "rawMaterials",
            Collection::Lots => "lots",
            Collection::ProcessedBatches => "processedBatches",
            Collection::ByProducts => "byProducts",
            Collection::FinalProducts => "finalProducts",
            Collection::QualityChecks => "qualityChecks",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// Trait: Record
// ==========================================
// 用途: Entity Store 的类型化读写边界
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// 所属集合
    const COLLECTION: Collection;

    /// 记录标识
    fn id(&self) -> &str;

    /// 写入前校验（存储边界）
    ///
    /// # 返回
    /// - Err(String): 违规原因（可直接展示给操作人）
    fn validate(&self) -> Result<(), String>;
}

/// 校验必填字符串字段
pub(crate) fn require_non_empty(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} 不能为空", field));
    }
    Ok(())
}

/// 校验非负有限数值
pub(crate) fn require_non_negative(field: &str, value: f64) -> Result<(), String> {
    if !value.is_finite() || value < 0.0 {
        return Err(format!("{} 必须为非负数值: {}", field, value));
    }
    Ok(())
}
