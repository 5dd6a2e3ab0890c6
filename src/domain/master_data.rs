// ==========================================
// 海产品加工追溯系统 - 主数据领域模型
// ==========================================
// 包含: 用户、供应商、产品等级
// ==========================================

use crate::domain::record::{require_non_empty, Collection, Record};
use crate::domain::types::{ProductType, UserRole};
use serde::{Deserialize, Serialize};

// ==========================================
// User - 用户
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub code: String,            // 用户编码（USR + yyMMdd + 随机）
    pub contact: Option<String>,
}

impl Record for User {
    const COLLECTION: Collection = Collection::Users;

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> Result<(), String> {
        require_non_empty("id", &self.id)?;
        require_non_empty("name", &self.name)?;
        require_non_empty("code", &self.code)?;
        if !self.email.contains('@') {
            return Err(format!("email 格式错误: {}", self.email));
        }
        Ok(())
    }
}

// ==========================================
// Supplier - 供应商
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supplier {
    pub id: String,
    pub name: String,
    pub code: String, // 供应商编码（SUP + yyMM + 随机）
    pub contact: String,
}

impl Record for Supplier {
    const COLLECTION: Collection = Collection::Suppliers;

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> Result<(), String> {
        require_non_empty("id", &self.id)?;
        require_non_empty("name", &self.name)?;
        require_non_empty("code", &self.code)
    }
}

// ==========================================
// ProductGrade - 产品等级
// ==========================================
// 等级与产品类型绑定：带壳等级不能用于净肉批次
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductGrade {
    pub id: String,
    pub name: String,
    pub code: String,
    pub product_type: ProductType,
    pub description: String,
}

impl Record for ProductGrade {
    const COLLECTION: Collection = Collection::ProductGrades;

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> Result<(), String> {
        require_non_empty("id", &self.id)?;
        require_non_empty("name", &self.name)?;
        require_non_empty("code", &self.code)
    }
}
