// ==========================================
// 海产品加工追溯系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换Repository错误为用户友好的错误消息
// 分类:
// - 校验错误: 立即返回，不写入
// - 一致性缺口: 质检门控在写入前拒绝
// - 持久化错误: 已由仓储层记录日志，原样上抛，不自动重试
// ==========================================

use crate::domain::types::{QualityCheckStep, StepStatus, UserRole};
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
/// 所有错误信息必须包含显式原因
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 质检门控
    // ==========================================
    /// 前序步骤未通过
    #[error("质检门控拒绝: step={step}, 前序步骤 {blocking_step} 状态为 {blocking_status}")]
    QualityGateBlocked {
        step: QualityCheckStep,
        blocking_step: QualityCheckStep,
        blocking_status: StepStatus,
    },

    /// 步骤不在所选流水线中
    #[error("无法识别的步骤顺序: {0}")]
    UnrecognizedStep(String),

    // ==========================================
    // 权限
    // ==========================================
    #[error("权限不足: user={user_id}, 需要角色 {required}")]
    PermissionDenied { user_id: String, required: UserRole },

    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    #[error("数据验证失败: {0}")]
    ValidationError(String),

    /// 组批原料选择校验失败（带逐条原因）
    #[error("原料选择校验失败: {reason}")]
    MaterialSelectionError {
        reason: String,
        violations: Vec<ValidationViolation>,
    },

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    // ==========================================
    // 导出错误
    // ==========================================
    #[error("数据导出失败: {0}")]
    ExportError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            // 数据库错误
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),

            // 存储边界校验
            RepositoryError::ValidationError(msg) => ApiError::ValidationError(msg),
            RepositoryError::DocumentDecodeError { collection, message } => {
                ApiError::DatabaseError(format!("集合 {} 文档损坏: {}", collection, message))
            }

            RepositoryError::SubscriptionClosed(collection) => {
                ApiError::InternalError(format!("订阅已关闭: {}", collection))
            }

            // 通用错误
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

impl From<csv::Error> for ApiError {
    fn from(err: csv::Error) -> Self {
        ApiError::ExportError(err.to_string())
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::ExportError(err.to_string())
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

// ==========================================
// 校验违规详情
// ==========================================

/// 校验违规详情
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ValidationViolation {
    /// 违规类型（UNKNOWN_MATERIAL / ALREADY_ASSIGNED / DUPLICATE）
    pub violation_type: String,
    pub material_id: String,
    pub reason: String,
}
