// ==========================================
// 海产品加工追溯系统 - 领域类型定义
// ==========================================
// 职责: 定义状态枚举、产品类型、质检步骤标识
// 序列化格式: kebab-case / lowercase (与存储文档一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 用户角色 (User Role)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Operator,   // 操作员：原料登记、加工记录
    Supervisor, // 主管：组批
    Quality,    // 质检员：质检门控
    Admin,      // 管理员：主数据、质检更正
    Management, // 管理层：只读看板
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Operator => "operator",
            UserRole::Supervisor => "supervisor",
            UserRole::Quality => "quality",
            UserRole::Admin => "admin",
            UserRole::Management => "management",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 产品类型 (Product Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProductType {
    ShellOn, // 带壳
    Meat,    // 净肉
}

impl ProductType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductType::ShellOn => "shell-on",
            ProductType::Meat => "meat",
        }
    }

    /// 产品编码前缀
    pub fn code_prefix(&self) -> &'static str {
        match self {
            ProductType::ShellOn => "SHO",
            ProductType::Meat => "MEA",
        }
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 记录审核状态 (Record Status)
// ==========================================
// 适用: 原料、加工批次、成品
// 流转: Pending → Approved / Rejected（仅由质检触发）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Pending,  // 待检
    Approved, // 合格放行
    Rejected, // 不合格
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Pending => "pending",
            RecordStatus::Approved => "approved",
            RecordStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<CheckStatus> for RecordStatus {
    fn from(status: CheckStatus) -> Self {
        match status {
            CheckStatus::Passed => RecordStatus::Approved,
            CheckStatus::Failed => RecordStatus::Rejected,
        }
    }
}

// ==========================================
// 批次状态 (Lot Status)
// ==========================================
// 注意: 目前没有任何规则把批次推进到 Completed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LotStatus {
    Active,
    Completed,
}

impl fmt::Display for LotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LotStatus::Active => write!(f, "active"),
            LotStatus::Completed => write!(f, "completed"),
        }
    }
}

// ==========================================
// 质检结论 (Check Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Passed,
    Failed,
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckStatus::Passed => write!(f, "passed"),
            CheckStatus::Failed => write!(f, "failed"),
        }
    }
}

// ==========================================
// 步骤状态 (Step Status)
// ==========================================
// 派生值: 无质检记录 → Pending，否则取最新一条质检结论
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Pending,
    Passed,
    Failed,
}

impl From<CheckStatus> for StepStatus {
    fn from(status: CheckStatus) -> Self {
        match status {
            CheckStatus::Passed => StepStatus::Passed,
            CheckStatus::Failed => StepStatus::Failed,
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepStatus::Pending => write!(f, "pending"),
            StepStatus::Passed => write!(f, "passed"),
            StepStatus::Failed => write!(f, "failed"),
        }
    }
}

// ==========================================
// 副产品处置方式 (Disposal Method)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisposalMethod {
    Recycling, // 回收
    Waste,     // 废弃
    Other,     // 其他
}

impl fmt::Display for DisposalMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisposalMethod::Recycling => write!(f, "recycling"),
            DisposalMethod::Waste => write!(f, "waste"),
            DisposalMethod::Other => write!(f, "other"),
        }
    }
}

// ==========================================
// 生产阶段标签 (Process Stage)
// ==========================================
// 由加工批次携带，Stage Transition Resolver 据此推断批次当前阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProcessStage {
    Washing,      // 清洗
    Processing,   // 加工
    FinalPacking, // 终包装
    Completed,    // 完成（当前没有规则会推进到此阶段）
}

impl ProcessStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessStage::Washing => "washing",
            ProcessStage::Processing => "processing",
            ProcessStage::FinalPacking => "final-packing",
            ProcessStage::Completed => "completed",
        }
    }
}

impl fmt::Display for ProcessStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 质检步骤 (Quality Check Step)
// ==========================================
// 两类步骤:
// 1. 阶段级步骤（raw-material / washing / processing / final-packing）：实体放行质检
// 2. 流水线步骤（生产线 9 步 + 终包装 2 步）：由 engine::steps 定义顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QualityCheckStep {
    // ===== 阶段级 =====
    RawMaterial,
    Washing,
    Processing,
    FinalPacking,

    // ===== 生产线 =====
    RawMaterialReceiving,
    RotaryScreenWashing,
    Depuration,
    PressureWasher,
    LiveSeparation,
    Grading,
    Cooking,
    MeatSeparation,
    FinalQcRelease,

    // ===== 终包装线 =====
    #[serde(rename = "form3-product-in")]
    Form3ProductIn,
    #[serde(rename = "form3-microbiology")]
    Form3Microbiology,
}

impl QualityCheckStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityCheckStep::RawMaterial => "raw-material",
            QualityCheckStep::Washing => "washing",
            QualityCheckStep::Processing => "processing",
            QualityCheckStep::FinalPacking => "final-packing",
            QualityCheckStep::RawMaterialReceiving => "raw-material-receiving",
            QualityCheckStep::RotaryScreenWashing => "rotary-screen-washing",
            QualityCheckStep::Depuration => "depuration",
            QualityCheckStep::PressureWasher => "pressure-washer",
            QualityCheckStep::LiveSeparation => "live-separation",
            QualityCheckStep::Grading => "grading",
            QualityCheckStep::Cooking => "cooking",
            QualityCheckStep::MeatSeparation => "meat-separation",
            QualityCheckStep::FinalQcRelease => "final-qc-release",
            QualityCheckStep::Form3ProductIn => "form3-product-in",
            QualityCheckStep::Form3Microbiology => "form3-microbiology",
        }
    }

    /// 从字符串解析质检步骤
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "raw-material" => Some(QualityCheckStep::RawMaterial),
            "washing" => Some(QualityCheckStep::Washing),
            "processing" => Some(QualityCheckStep::Processing),
            "final-packing" => Some(QualityCheckStep::FinalPacking),
            "raw-material-receiving" => Some(QualityCheckStep::RawMaterialReceiving),
            "rotary-screen-washing" => Some(QualityCheckStep::RotaryScreenWashing),
            "depuration" => Some(QualityCheckStep::Depuration),
            "pressure-washer" => Some(QualityCheckStep::PressureWasher),
            "live-separation" => Some(QualityCheckStep::LiveSeparation),
            "grading" => Some(QualityCheckStep::Grading),
            "cooking" => Some(QualityCheckStep::Cooking),
            "meat-separation" => Some(QualityCheckStep::MeatSeparation),
            "final-qc-release" => Some(QualityCheckStep::FinalQcRelease),
            "form3-product-in" => Some(QualityCheckStep::Form3ProductIn),
            "form3-microbiology" => Some(QualityCheckStep::Form3Microbiology),
            _ => None,
        }
    }

    /// 该步骤的质检表单是否要求温度读数
    pub fn requires_temperature(&self) -> bool {
        matches!(
            self,
            QualityCheckStep::RawMaterial
                | QualityCheckStep::Washing
                | QualityCheckStep::RawMaterialReceiving
                | QualityCheckStep::RotaryScreenWashing
        )
    }
}

impl fmt::Display for QualityCheckStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
