// ==========================================
// 海产品加工追溯系统 - 主入口
// ==========================================
// 打开数据库、确保默认等级存在、输出当前生产概况
// ==========================================

use anyhow::anyhow;
use seafood_trace::app::{get_default_db_path, AppState};
use seafood_trace::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", seafood_trace::APP_NAME);
    tracing::info!("系统版本: {}", seafood_trace::VERSION);
    tracing::info!("==================================================");

    let db_path = get_default_db_path();
    tracing::info!("使用数据库: {}", db_path);

    let state = AppState::new(db_path).map_err(|e| anyhow!(e))?;

    if state.master_data_api.list_grades().await?.is_empty() {
        state.master_data_api.initialize_default_grades().await?;
    }

    let summary = state.dashboard_api.summary().await?;
    tracing::info!(
        raw_materials = summary.raw_materials,
        unassigned = summary.unassigned_raw_materials,
        active_lots = summary.active_lots,
        lots_in_progress = summary.lots_in_progress,
        inventory = summary.inventory_products,
        pass_rate = %summary.quality.pass_rate_display(),
        "生产概况"
    );

    for entry in state.lot_api.lots_in_progress().await? {
        tracing::info!(lot_number = %entry.lot.lot_number, stage = %entry.stage, "在制批次");
    }

    Ok(())
}
