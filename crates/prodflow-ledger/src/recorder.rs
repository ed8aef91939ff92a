//! 異動記錄器：所有庫存數量變動的唯一入口，伴隨稽核紀錄

use rust_decimal::Decimal;
use uuid::Uuid;

use prodflow_core::{
    ErpError, Inventory, InventoryTransaction, Result, TransactionType,
};
use prodflow_store::Store;

use crate::costing::weighted_average_cost;
use crate::ledger::InventoryLedger;

/// 入庫參數
#[derive(Debug, Clone)]
pub struct StockReceipt {
    /// 產品ID
    pub product_id: Uuid,

    /// 倉庫ID
    pub warehouse_id: Uuid,

    /// 入庫數量
    pub quantity: Decimal,

    /// 本次入庫的總成本（提供時重算加權平均）
    pub cost: Option<Decimal>,

    /// 目標儲位
    pub storage_location: Option<String>,

    /// 工作站脈絡（生產入庫）
    pub work_station_id: Option<Uuid>,

    /// 供應商脈絡（補貨入庫）
    pub supplier_id: Option<Uuid>,

    /// 是否記錄異動（預設記錄）
    pub record_transaction: bool,
}

impl StockReceipt {
    /// 創建新的入庫參數
    pub fn new(product_id: Uuid, warehouse_id: Uuid, quantity: Decimal) -> Self {
        Self {
            product_id,
            warehouse_id,
            quantity,
            cost: None,
            storage_location: None,
            work_station_id: None,
            supplier_id: None,
            record_transaction: true,
        }
    }

    /// 建構器模式：設置總成本
    pub fn with_cost(mut self, cost: Decimal) -> Self {
        self.cost = Some(cost);
        self
    }

    /// 建構器模式：設置儲位
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.storage_location = Some(location.into());
        self
    }

    /// 建構器模式：設置工作站脈絡
    pub fn with_work_station(mut self, work_station_id: Uuid) -> Self {
        self.work_station_id = Some(work_station_id);
        self
    }

    /// 建構器模式：設置供應商脈絡
    pub fn with_supplier(mut self, supplier_id: Uuid) -> Self {
        self.supplier_id = Some(supplier_id);
        self
    }

    /// 建構器模式：不記錄異動
    pub fn without_transaction(mut self) -> Self {
        self.record_transaction = false;
        self
    }
}

/// 出庫走批計劃：每批取用量與總缺口
type RemovalPlan = (Vec<(Uuid, Decimal)>, Decimal);

/// 異動記錄器
pub struct StockRecorder;

impl StockRecorder {
    /// 入庫
    ///
    /// 依取用順序找到目標儲位的第一個批次並加量（無則先建立 0 量批次）。
    /// 返回批次ID。
    pub fn add_stock(store: &mut Store, receipt: StockReceipt) -> Result<Uuid> {
        if receipt.quantity <= Decimal::ZERO {
            return Err(ErpError::InvalidQuantity);
        }

        let inventory = InventoryLedger::get_or_create_inventory(
            store,
            receipt.product_id,
            receipt.warehouse_id,
        );

        if let Some(cost) = receipt.cost {
            inventory.unit_cost = weighted_average_cost(
                inventory.quantity(),
                inventory.unit_cost,
                receipt.quantity,
                cost,
            );
        }

        // 確保目標儲位至少有一個批次
        let location = receipt.storage_location.clone();
        if !inventory
            .items
            .iter()
            .any(|i| i.storage_location == location)
        {
            inventory.push_item(Decimal::ZERO, location.clone());
        }

        let ordered = InventoryLedger::ordered_item_ids(inventory, location.as_deref());
        let target_id = ordered
            .into_iter()
            .find(|id| {
                inventory
                    .items
                    .iter()
                    .any(|i| i.id == *id && i.storage_location == location)
            })
            .ok_or_else(|| ErpError::Other("找不到入庫批次".to_string()))?;

        if let Some(item) = inventory.item_mut(target_id) {
            item.quantity += receipt.quantity;
        }
        let unit_cost = inventory.unit_cost;

        if receipt.record_transaction {
            let cost = receipt
                .cost
                .unwrap_or_else(|| (unit_cost * receipt.quantity).round_dp(2));
            store.transactions.push(
                InventoryTransaction::new(
                    receipt.product_id,
                    receipt.warehouse_id,
                    receipt.quantity,
                    TransactionType::In,
                    cost,
                )
                .with_location(location)
                .with_work_station(receipt.work_station_id)
                .with_supplier(receipt.supplier_id),
            );
        }

        Ok(target_id)
    }

    /// 出庫
    ///
    /// 依取用順序逐批消耗，每個被消耗的批次各記一筆出庫異動
    /// （以該批儲位、當前平均成本計價）。返回未滿足的缺口（0 = 全數滿足）。
    pub fn remove_stock(
        store: &mut Store,
        product_id: Uuid,
        quantity: Decimal,
        warehouse_id: Uuid,
        work_station_id: Option<Uuid>,
        location: Option<&str>,
    ) -> Result<Decimal> {
        if quantity <= Decimal::ZERO {
            return Err(ErpError::InvalidQuantity);
        }

        let Some(inventory) = store.inventories.get_mut(&(product_id, warehouse_id)) else {
            return Ok(quantity);
        };

        let (takes, shortfall) = Self::plan_removal(inventory, quantity, location);
        let unit_cost = inventory.unit_cost;

        let mut consumed: Vec<(Option<String>, Decimal)> = Vec::new();
        for (item_id, take) in takes {
            if let Some(item) = inventory.item_mut(item_id) {
                item.quantity -= take;
                consumed.push((item.storage_location.clone(), take));
            }
        }

        for (item_location, take) in consumed {
            store.transactions.push(
                InventoryTransaction::new(
                    product_id,
                    warehouse_id,
                    take,
                    TransactionType::Out,
                    (unit_cost * take).round_dp(2),
                )
                .with_location(item_location)
                .with_work_station(work_station_id),
            );
        }

        Ok(shortfall)
    }

    /// 出庫缺口試算（唯讀）
    ///
    /// 與 `remove_stock` 共用同一套走批計劃，兩者不會不一致。
    pub fn stock_lack_qty(
        store: &Store,
        product_id: Uuid,
        quantity: Decimal,
        warehouse_id: Uuid,
        location: Option<&str>,
    ) -> Decimal {
        if quantity <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        match store.inventories.get(&(product_id, warehouse_id)) {
            Some(inventory) => Self::plan_removal(inventory, quantity, location).1,
            None => quantity,
        }
    }

    /// 迷你庫存缺口試算：max(0, 需求 − 現有)
    pub fn mini_stock_lack_qty(
        store: &Store,
        product_id: Uuid,
        work_station_id: Uuid,
        quantity: Decimal,
    ) -> Decimal {
        let on_hand = store
            .mini_inventories
            .get(&(product_id, work_station_id))
            .map(|m| m.quantity)
            .unwrap_or(Decimal::ZERO);
        if quantity > on_hand {
            quantity - on_hand
        } else {
            Decimal::ZERO
        }
    }

    /// 迷你庫存入庫（單桶，無儲位維度）
    pub fn add_mini_stock(
        store: &mut Store,
        product_id: Uuid,
        work_station_id: Uuid,
        quantity: Decimal,
        cost: Option<Decimal>,
    ) -> Result<()> {
        if quantity <= Decimal::ZERO {
            return Err(ErpError::InvalidQuantity);
        }
        let mini =
            InventoryLedger::get_or_create_mini_inventory(store, product_id, work_station_id);
        if let Some(cost) = cost {
            mini.unit_cost = weighted_average_cost(mini.quantity, mini.unit_cost, quantity, cost);
        }
        mini.quantity += quantity;
        Ok(())
    }

    /// 迷你庫存出庫（不足時報錯）
    pub fn remove_mini_stock(
        store: &mut Store,
        product_id: Uuid,
        work_station_id: Uuid,
        quantity: Decimal,
    ) -> Result<()> {
        if quantity <= Decimal::ZERO {
            return Err(ErpError::InvalidQuantity);
        }
        let available = store
            .mini_inventories
            .get(&(product_id, work_station_id))
            .map(|m| m.quantity)
            .unwrap_or(Decimal::ZERO);
        if quantity > available {
            return Err(ErpError::InsufficientStock {
                product: store.product_name(product_id),
                available,
            });
        }
        if let Some(mini) = store.mini_inventories.get_mut(&(product_id, work_station_id)) {
            mini.quantity -= quantity;
        }
        Ok(())
    }

    /// 迷你庫存出庫（夾取：取到可用為止，返回未滿足缺口）
    pub fn remove_mini_stock_force(
        store: &mut Store,
        product_id: Uuid,
        work_station_id: Uuid,
        quantity: Decimal,
    ) -> Result<Decimal> {
        if quantity <= Decimal::ZERO {
            return Err(ErpError::InvalidQuantity);
        }
        let available = store
            .mini_inventories
            .get(&(product_id, work_station_id))
            .map(|m| m.quantity)
            .unwrap_or(Decimal::ZERO);
        let take = quantity.min(available);
        if take > Decimal::ZERO {
            if let Some(mini) = store.mini_inventories.get_mut(&(product_id, work_station_id)) {
                mini.quantity -= take;
            }
        }
        Ok(quantity - take)
    }

    /// 走批計劃：取用順序見 `InventoryLedger::ordered_item_ids`
    fn plan_removal(
        inventory: &Inventory,
        quantity: Decimal,
        preferred_location: Option<&str>,
    ) -> RemovalPlan {
        let ordered = InventoryLedger::ordered_item_ids(inventory, preferred_location);
        let mut remaining = quantity;
        let mut takes = Vec::new();

        for item_id in ordered {
            if remaining <= Decimal::ZERO {
                break;
            }
            let Some(item) = inventory.items.iter().find(|i| i.id == item_id) else {
                continue;
            };
            let take = remaining.min(item.quantity);
            if take > Decimal::ZERO {
                takes.push((item_id, take));
                remaining -= take;
            }
        }

        (takes, remaining)
    }
}
