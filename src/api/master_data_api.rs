// ==========================================
// 海产品加工追溯系统 - 主数据 API
// ==========================================
// 职责: 用户、供应商、产品等级的登记与查询；默认等级初始化
// ==========================================

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::TraceInputValidator;
use crate::domain::master_data::{ProductGrade, Supplier, User};
use crate::domain::record::Collection;
use crate::domain::types::{ProductType, UserRole};
use crate::engine::codes::CodeGenerator;
use crate::repository::entity_store::EntityStore;

/// 新用户
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub contact: Option<String>,
}

/// 新供应商
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSupplier {
    pub name: String,
    pub contact: String,
}

/// 新产品等级（code 为空时自动生成）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGrade {
    pub name: String,
    pub code: Option<String>,
    pub product_type: ProductType,
    pub description: String,
}

/// 默认等级: (code, name, product_type, description)
const DEFAULT_GRADES: [(&str, &str, ProductType, &str); 6] = [
    ("WH01", "Grade 1", ProductType::ShellOn, "Shell-On Grade 1"),
    ("WH02", "Grade 2", ProductType::ShellOn, "Shell-On Grade 2"),
    ("WH03", "Grade 3", ProductType::ShellOn, "Shell-On Grade 3"),
    ("CM01", "Grade 1", ProductType::Meat, "Clam Meat Grade 1"),
    ("CM02", "Grade 2", ProductType::Meat, "Clam Meat Grade 2"),
    ("CM03", "Grade 3", ProductType::Meat, "Clam Meat Grade 3"),
];

// ==========================================
// MasterDataApi - 主数据 API
// ==========================================
pub struct MasterDataApi {
    store: Arc<EntityStore>,
}

impl MasterDataApi {
    pub fn new(store: Arc<EntityStore>) -> Self {
        Self { store }
    }

    fn unique_code<F>(taken: HashSet<String>, generate: F) -> ApiResult<String>
    where
        F: FnMut() -> String,
    {
        CodeGenerator::generate_unique(&taken, generate)
            .ok_or_else(|| ApiError::InternalError("编码生成多次冲突，请重试".to_string()))
    }

    // ==========================================
    // 用户
    // ==========================================

    /// 登记用户（自动生成用户编码）
    pub async fn add_user(&self, input: NewUser) -> ApiResult<User> {
        TraceInputValidator::require_text("姓名", &input.name)?;
        TraceInputValidator::require_text("邮箱", &input.email)?;

        let existing = self.store.list::<User>().await?;
        if existing.iter().any(|u| u.email.eq_ignore_ascii_case(input.email.trim())) {
            return Err(ApiError::BusinessRuleViolation(format!(
                "邮箱已被使用: {}",
                input.email
            )));
        }

        let now = Utc::now();
        let taken = existing.into_iter().map(|u| u.code).collect();
        let user = User {
            id: CodeGenerator::new_record_id(),
            name: input.name.trim().to_string(),
            email: input.email.trim().to_string(),
            role: input.role,
            code: Self::unique_code(taken, || CodeGenerator::user_code(now))?,
            contact: input.contact,
        };
        self.store.add(&user).await?;

        info!(user_id = %user.id, code = %user.code, role = %user.role, "用户已登记");
        Ok(user)
    }

    pub async fn list_users(&self) -> ApiResult<Vec<User>> {
        Ok(self.store.list().await?)
    }

    pub async fn get_user(&self, user_id: &str) -> ApiResult<User> {
        Ok(self.store.require(user_id).await?)
    }

    // ==========================================
    // 供应商
    // ==========================================

    /// 登记供应商（自动生成供应商编码）
    pub async fn add_supplier(&self, input: NewSupplier) -> ApiResult<Supplier> {
        TraceInputValidator::require_text("供应商名称", &input.name)?;

        let now = Utc::now();
        let taken = self
            .store
            .list::<Supplier>()
            .await?
            .into_iter()
            .map(|s| s.code)
            .collect();
        let supplier = Supplier {
            id: CodeGenerator::new_record_id(),
            name: input.name.trim().to_string(),
            code: Self::unique_code(taken, || CodeGenerator::supplier_code(now))?,
            contact: input.contact,
        };
        self.store.add(&supplier).await?;

        info!(supplier_id = %supplier.id, code = %supplier.code, "供应商已登记");
        Ok(supplier)
    }

    pub async fn list_suppliers(&self) -> ApiResult<Vec<Supplier>> {
        Ok(self.store.list().await?)
    }

    // ==========================================
    // 产品等级
    // ==========================================

    pub async fn add_grade(&self, input: NewGrade) -> ApiResult<ProductGrade> {
        TraceInputValidator::require_text("等级名称", &input.name)?;

        let existing = self.store.list::<ProductGrade>().await?;
        let code = match input.code.as_deref().map(str::trim) {
            Some(code) if !code.is_empty() => {
                if existing.iter().any(|g| g.code == code) {
                    return Err(ApiError::BusinessRuleViolation(format!("等级编码已存在: {}", code)));
                }
                code.to_string()
            }
            _ => {
                let now = Utc::now();
                let taken = existing.into_iter().map(|g| g.code).collect();
                Self::unique_code(taken, || CodeGenerator::product_code(input.product_type, now))?
            }
        };

        let grade = ProductGrade {
            id: CodeGenerator::new_record_id(),
            name: input.name.trim().to_string(),
            code,
            product_type: input.product_type,
            description: input.description,
        };
        self.store.add(&grade).await?;

        info!(grade_id = %grade.id, code = %grade.code, product_type = %grade.product_type, "产品等级已登记");
        Ok(grade)
    }

    pub async fn list_grades(&self) -> ApiResult<Vec<ProductGrade>> {
        Ok(self.store.list().await?)
    }

    /// 按产品类型筛选等级
    pub async fn list_grades_for(&self, product_type: ProductType) -> ApiResult<Vec<ProductGrade>> {
        let grades = self.store.list::<ProductGrade>().await?;
        Ok(grades
            .into_iter()
            .filter(|g| g.product_type == product_type)
            .collect())
    }

    /// 重置为默认等级（清空后写入 WH01-03 / CM01-03）
    pub async fn initialize_default_grades(&self) -> ApiResult<Vec<ProductGrade>> {
        self.store.clear(Collection::ProductGrades).await?;

        let mut grades = Vec::with_capacity(DEFAULT_GRADES.len());
        for (code, name, product_type, description) in DEFAULT_GRADES {
            let grade = ProductGrade {
                id: CodeGenerator::new_record_id(),
                name: name.to_string(),
                code: code.to_string(),
                product_type,
                description: description.to_string(),
            };
            self.store.add(&grade).await?;
            grades.push(grade);
        }

        info!(count = grades.len(), "默认产品等级已初始化");
        Ok(grades)
    }
}
