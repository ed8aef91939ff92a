//! 模板推算：總成本與交期

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use uuid::Uuid;

use prodflow_core::{ErpError, Result};
use prodflow_store::Store;

/// 模板推算器
///
/// 正式簽名：成本取（產品、倉庫），交期取（產品）；
/// 工序一律依 sequence 升冪。
pub struct TemplateCalculator;

impl TemplateCalculator {
    /// 推算生產 1 單位產出的材料總成本
    ///
    /// 逐工序逐材料累加 `需求數量 × 當前平均單位成本`；
    /// 材料沒有庫存列時該行以 0 計（成本為參考值，非權威值）。
    pub fn total_cost(store: &Store, product_id: Uuid, warehouse_id: Uuid) -> Result<Decimal> {
        let template = store
            .latest_template(product_id)
            .ok_or_else(|| ErpError::TemplateNotFound(store.product_name(product_id)))?;

        let mut total = Decimal::ZERO;
        for step in template.ordered_steps() {
            for material in &step.materials {
                let unit_cost = store
                    .inventories
                    .get(&(material.product_id, warehouse_id))
                    .map(|inv| inv.unit_cost)
                    .unwrap_or(Decimal::ZERO);
                total += material.required_quantity * unit_cost;
            }
        }
        Ok(total.round_dp(2))
    }

    /// 推算生產 1 單位產出的交期（天）
    pub fn deadline_days(store: &Store, product_id: Uuid) -> Result<u32> {
        Self::deadline_days_for_quantity(store, product_id, Decimal::ONE)
    }

    /// 推算指定訂單數量的交期（天）
    ///
    /// 每道工序 `ceil(預期產出 × 數量 / 每日產能)`，工序依序執行、天數相加。
    pub fn deadline_days_for_quantity(
        store: &Store,
        product_id: Uuid,
        quantity: Decimal,
    ) -> Result<u32> {
        let template = store
            .latest_template(product_id)
            .ok_or_else(|| ErpError::TemplateNotFound(store.product_name(product_id)))?;

        let mut total_days: u32 = 0;
        for step in template.ordered_steps() {
            let station = store
                .work_stations
                .get(&step.work_station_id)
                .ok_or_else(|| ErpError::NotFound(format!("工作站 {}", step.work_station_id)))?;

            let daily_rate = station.daily_rate().ok_or_else(|| {
                ErpError::Other(format!("工作站 {} 未設置產能率", station.name))
            })?;

            let days = (step.expected_quantity * quantity / daily_rate)
                .ceil()
                .to_u32()
                .ok_or_else(|| ErpError::Other("交期天數溢出".to_string()))?;
            total_days += days;
        }
        Ok(total_days)
    }
}
