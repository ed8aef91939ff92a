//! 庫存帳本：彙總列的查找/建立與批次取用順序

use uuid::Uuid;

use prodflow_core::{Inventory, MiniInventory};
use prodflow_store::Store;

/// 庫存帳本
///
/// 只負責列的建立與查詢順序；所有數量變動經由異動記錄器。
pub struct InventoryLedger;

impl InventoryLedger {
    /// 冪等查找倉庫庫存列，不存在時建立數量 0、成本 0 的新列
    pub fn get_or_create_inventory(
        store: &mut Store,
        product_id: Uuid,
        warehouse_id: Uuid,
    ) -> &mut Inventory {
        store
            .inventories
            .entry((product_id, warehouse_id))
            .or_insert_with(|| Inventory::new(product_id, warehouse_id))
    }

    /// 冪等查找工作站迷你庫存列
    pub fn get_or_create_mini_inventory(
        store: &mut Store,
        product_id: Uuid,
        work_station_id: Uuid,
    ) -> &mut MiniInventory {
        store
            .mini_inventories
            .entry((product_id, work_station_id))
            .or_insert_with(|| MiniInventory::new(product_id, work_station_id))
    }

    /// 取得批次取用順序
    ///
    /// 優先序：指定儲位的批次 → 無儲位批次 → 其他儲位批次；
    /// 同一優先序內依建立順序先進先出。倉庫出庫一律走這個順序。
    pub fn ordered_item_ids(inventory: &Inventory, preferred_location: Option<&str>) -> Vec<Uuid> {
        let mut ranked: Vec<(u8, u64, Uuid)> = inventory
            .items
            .iter()
            .map(|item| {
                let rank = match (&item.storage_location, preferred_location) {
                    (loc, pref) if loc.as_deref() == pref => 0,
                    (None, _) => 1,
                    _ => 2,
                };
                (rank, item.seq, item.id)
            })
            .collect();
        ranked.sort();
        ranked.into_iter().map(|(_, _, id)| id).collect()
    }
}
