//! 實體儲存與快照交易

use std::collections::HashMap;

use uuid::Uuid;

use prodflow_core::{
    DomainEvent, ErpError, Inventory, InventoryTransaction, MiniInventory, Partner, ProdOrder,
    ProdOrderGroup, ProdTemplate, Product, ProductCategory, Result, SupplyOrder, Task, Warehouse,
    WorkStation,
};

/// 記憶體實體儲存
///
/// 倉庫庫存以（產品、倉庫）為鍵、迷你庫存以（產品、工作站）為鍵，
/// 唯一鍵的 get-or-create 因此天然冪等。
#[derive(Debug, Clone, Default)]
pub struct Store {
    pub products: HashMap<Uuid, Product>,
    pub categories: HashMap<Uuid, ProductCategory>,
    pub partners: HashMap<Uuid, Partner>,
    pub warehouses: HashMap<Uuid, Warehouse>,
    pub work_stations: HashMap<Uuid, WorkStation>,
    pub templates: HashMap<Uuid, ProdTemplate>,
    pub groups: HashMap<Uuid, ProdOrderGroup>,
    pub orders: HashMap<Uuid, ProdOrder>,
    pub inventories: HashMap<(Uuid, Uuid), Inventory>,
    pub mini_inventories: HashMap<(Uuid, Uuid), MiniInventory>,
    pub transactions: Vec<InventoryTransaction>,
    pub supply_orders: HashMap<Uuid, SupplyOrder>,
    pub tasks: Vec<Task>,
    pub events: Vec<DomainEvent>,
    pub supply_order_seq: u64,
}

impl Store {
    /// 創建空的儲存
    pub fn new() -> Self {
        Self::default()
    }

    /// 交易執行：閉包回傳錯誤時整體回滾，原始錯誤原樣拋出
    pub fn transaction<T>(&mut self, f: impl FnOnce(&mut Store) -> Result<T>) -> Result<T> {
        let snapshot = self.clone();
        match f(self) {
            Ok(value) => Ok(value),
            Err(err) => {
                *self = snapshot;
                Err(err)
            }
        }
    }

    /// 註冊產品
    pub fn add_product(&mut self, product: Product) -> Uuid {
        let id = product.id;
        self.products.insert(id, product);
        id
    }

    /// 註冊產品分類
    pub fn add_category(&mut self, category: ProductCategory) -> Uuid {
        let id = category.id;
        self.categories.insert(id, category);
        id
    }

    /// 註冊合作夥伴
    pub fn add_partner(&mut self, partner: Partner) -> Uuid {
        let id = partner.id;
        self.partners.insert(id, partner);
        id
    }

    /// 註冊倉庫
    pub fn add_warehouse(&mut self, warehouse: Warehouse) -> Uuid {
        let id = warehouse.id;
        self.warehouses.insert(id, warehouse);
        id
    }

    /// 註冊工作站
    pub fn add_work_station(&mut self, station: WorkStation) -> Uuid {
        let id = station.id;
        self.work_stations.insert(id, station);
        id
    }

    /// 註冊生產模板
    pub fn add_template(&mut self, template: ProdTemplate) -> Uuid {
        let id = template.id;
        self.templates.insert(id, template);
        id
    }

    /// 註冊訂單群組
    pub fn add_group(&mut self, group: ProdOrderGroup) -> Uuid {
        let id = group.id;
        self.groups.insert(id, group);
        id
    }

    /// 註冊生產訂單
    pub fn add_order(&mut self, order: ProdOrder) -> Uuid {
        let id = order.id;
        self.orders.insert(id, order);
        id
    }

    /// 取得產品名稱（找不到時退回ID字串，供錯誤訊息使用）
    pub fn product_name(&self, product_id: Uuid) -> String {
        self.products
            .get(&product_id)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| product_id.to_string())
    }

    /// 取得產品所屬分類
    pub fn product_category(&self, product_id: Uuid) -> Result<Uuid> {
        self.products
            .get(&product_id)
            .map(|p| p.category_id)
            .ok_or_else(|| ErpError::NotFound(format!("產品 {}", product_id)))
    }

    /// 取得某產品的最新模板（依建立時間）
    pub fn latest_template(&self, product_id: Uuid) -> Option<&ProdTemplate> {
        self.templates
            .values()
            .filter(|t| t.product_id == product_id)
            .max_by_key(|t| t.created_at)
    }

    /// 下一個供應訂單流水號
    pub fn next_supply_order_seq(&mut self) -> u64 {
        self.supply_order_seq += 1;
        self.supply_order_seq
    }

    /// 取出並清空事件 outbox
    pub fn drain_events(&mut self) -> Vec<DomainEvent> {
        std::mem::take(&mut self.events)
    }
}
