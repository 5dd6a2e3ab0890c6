// ==========================================
// 海产品加工追溯系统 - 追溯配置读取 Trait
// ==========================================
// 职责: 定义用例层所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// TraceConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait TraceConfigReader: Send + Sync {
    /// 箱号序号补零位数
    ///
    /// # 默认值
    /// - 4（LOT-...-0001 / BOX-0001）
    async fn get_box_number_width(&self) -> RepositoryResult<usize>;

    /// 清洗工序每箱重量（kg）
    ///
    /// # 默认值
    /// - 25.0
    ///
    /// # 用途
    /// - 清洗批次箱数 = ceil(数量 / 每箱重量)
    async fn get_washing_kg_per_box(&self) -> RepositoryResult<f64>;

    /// 批次号前缀
    ///
    /// # 默认值
    /// - LOT
    async fn get_lot_number_prefix(&self) -> RepositoryResult<String>;

    /// 是否校验质检员角色
    ///
    /// # 默认值
    /// - true
    async fn get_enforce_quality_role(&self) -> RepositoryResult<bool>;
}
