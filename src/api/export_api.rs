// ==========================================
// 海产品加工追溯系统 - 数据导出 API
// ==========================================
// 职责: 将各集合导出为 CSV（表头 + 数据行）
// 格式: 含逗号的值加引号；文件名 {name}_{yyyy-MM-dd_HH-mm}.csv
// ==========================================

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::batch::ProcessedBatch;
use crate::domain::lot::Lot;
use crate::domain::material::RawMaterial;
use crate::domain::product::FinalProduct;
use crate::domain::quality::QualityCheck;
use crate::domain::types::RecordStatus;
use crate::repository::entity_store::EntityStore;

const RAW_MATERIAL_HEADERS: [&str; 7] = [
    "id", "supplierId", "quantity", "temperature", "qualityScore", "receivedDate", "status",
];
const LOT_HEADERS: [&str; 6] = ["id", "lotNumber", "createdAt", "createdBy", "status", "totalQuantity"];
const BATCH_HEADERS: [&str; 8] = [
    "id", "lotId", "productType", "grade", "quantity", "boxCount", "processDate", "status",
];
const PRODUCT_HEADERS: [&str; 8] = [
    "id", "processedBatchId", "productType", "grade", "quantity", "cartonCount", "packingDate", "status",
];
const INVENTORY_HEADERS: [&str; 9] = [
    "id", "processedBatchId", "productType", "grade", "quantity", "cartonCount", "packingDate", "status",
    "boxNumbers",
];
const CHECK_HEADERS: [&str; 10] = [
    "id", "step", "subjectId", "status", "checkedAt", "checkedBy", "temperature", "appearance", "weight",
    "comments",
];

fn timestamp(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn optional<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(ToString::to_string).unwrap_or_default()
}

/// 表头 + 数据行 → CSV 文本
fn to_csv<I>(headers: &[&str], rows: I) -> ApiResult<String>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(&row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ApiError::ExportError(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ApiError::ExportError(e.to_string()))
}

pub fn raw_materials_csv(materials: &[RawMaterial]) -> ApiResult<String> {
    to_csv(
        &RAW_MATERIAL_HEADERS,
        materials.iter().map(|m| {
            vec![
                m.id.clone(),
                m.supplier_id.clone(),
                m.quantity.to_string(),
                m.temperature.to_string(),
                m.quality_score.to_string(),
                timestamp(&m.received_date),
                m.status.to_string(),
            ]
        }),
    )
}

pub fn lots_csv(lots: &[Lot]) -> ApiResult<String> {
    to_csv(
        &LOT_HEADERS,
        lots.iter().map(|l| {
            vec![
                l.id.clone(),
                l.lot_number.clone(),
                timestamp(&l.created_at),
                l.created_by.clone(),
                l.status.to_string(),
                l.total_quantity.to_string(),
            ]
        }),
    )
}

pub fn processed_batches_csv(batches: &[ProcessedBatch]) -> ApiResult<String> {
    to_csv(
        &BATCH_HEADERS,
        batches.iter().map(|b| {
            vec![
                b.id.clone(),
                b.lot_id.clone(),
                b.product_type.to_string(),
                b.grade.clone(),
                b.quantity.to_string(),
                b.box_count.to_string(),
                timestamp(&b.process_date),
                b.status.to_string(),
            ]
        }),
    )
}

fn product_row(p: &FinalProduct) -> Vec<String> {
    vec![
        p.id.clone(),
        p.processed_batch_id.clone(),
        p.product_type.to_string(),
        p.grade.clone(),
        p.quantity.to_string(),
        p.carton_count.to_string(),
        timestamp(&p.packing_date),
        p.status.to_string(),
    ]
}

pub fn final_products_csv(products: &[FinalProduct]) -> ApiResult<String> {
    to_csv(&PRODUCT_HEADERS, products.iter().map(product_row))
}

/// 库存导出（附箱号，逗号分隔）
pub fn inventory_csv(inventory: &[FinalProduct]) -> ApiResult<String> {
    to_csv(
        &INVENTORY_HEADERS,
        inventory.iter().map(|p| {
            let mut row = product_row(p);
            row.push(p.box_numbers.join(","));
            row
        }),
    )
}

pub fn quality_checks_csv(checks: &[QualityCheck]) -> ApiResult<String> {
    to_csv(
        &CHECK_HEADERS,
        checks.iter().map(|c| {
            vec![
                c.id.clone(),
                c.step.to_string(),
                c.subject.subject_id().to_string(),
                c.status.to_string(),
                timestamp(&c.checked_at),
                c.checked_by.clone(),
                optional(&c.temperature),
                optional(&c.appearance),
                optional(&c.weight),
                optional(&c.comments),
            ]
        }),
    )
}

/// 导出文件名
pub fn export_file_name(name: &str, now: DateTime<Utc>) -> String {
    format!("{}_{}.csv", name, now.format("%Y-%m-%d_%H-%M"))
}

pub struct ExportApi {
    store: Arc<EntityStore>,
}

impl ExportApi {
    pub fn new(store: Arc<EntityStore>) -> Self {
        Self { store }
    }

    fn write_file(dir: &Path, name: &str, now: DateTime<Utc>, content: &str) -> ApiResult<PathBuf> {
        let path = dir.join(export_file_name(name, now));
        fs::write(&path, content)?;
        Ok(path)
    }

    /// 导出驾驶舱数据（原料/批次/加工批次/成品/质检 五个文件）
    pub async fn export_dashboard(&self, dir: &Path) -> ApiResult<Vec<PathBuf>> {
        fs::create_dir_all(dir)?;
        let now = Utc::now();

        let files = [
            ("raw-materials", raw_materials_csv(&self.store.list::<RawMaterial>().await?)?),
            ("lots", lots_csv(&self.store.list::<Lot>().await?)?),
            ("processed-batches", processed_batches_csv(&self.store.list::<ProcessedBatch>().await?)?),
            ("final-products", final_products_csv(&self.store.list::<FinalProduct>().await?)?),
            ("quality-checks", quality_checks_csv(&self.store.list::<QualityCheck>().await?)?),
        ];

        let mut paths = Vec::with_capacity(files.len());
        for (name, content) in &files {
            paths.push(Self::write_file(dir, name, now, content)?);
        }

        info!(dir = %dir.display(), files = paths.len(), "驾驶舱数据已导出");
        Ok(paths)
    }

    /// 导出库存（已放行成品）
    pub async fn export_inventory(&self, dir: &Path) -> ApiResult<PathBuf> {
        fs::create_dir_all(dir)?;
        let products = self.store.list::<FinalProduct>().await?;
        let inventory: Vec<FinalProduct> = products
            .into_iter()
            .filter(|p| p.status == RecordStatus::Approved)
            .collect();

        let path = Self::write_file(dir, "inventory", Utc::now(), &inventory_csv(&inventory)?)?;
        info!(path = %path.display(), products = inventory.len(), "库存已导出");
        Ok(path)
    }
}
