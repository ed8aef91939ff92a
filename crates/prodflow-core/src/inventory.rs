//! 庫存模型（倉庫批次庫存 + 工作站迷你庫存 + 異動紀錄）

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 庫存批次（同一倉庫內可分儲位存放）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItem {
    /// 批次ID
    pub id: Uuid,

    /// 批次數量
    pub quantity: Decimal,

    /// 儲位（可空）
    pub storage_location: Option<String>,

    /// 建立時間
    pub created_at: DateTime<Utc>,

    /// 插入序號（同一毫秒建立的批次仍保持先進先出）
    pub seq: u64,
}

impl InventoryItem {
    /// 創建新的批次
    pub fn new(quantity: Decimal, storage_location: Option<String>, seq: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            quantity,
            storage_location,
            created_at: Utc::now(),
            seq,
        }
    }
}

/// 倉庫庫存（產品 × 倉庫 唯一，數量為批次加總）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inventory {
    /// 庫存ID
    pub id: Uuid,

    /// 產品ID
    pub product_id: Uuid,

    /// 倉庫ID
    pub warehouse_id: Uuid,

    /// 加權平均單位成本
    pub unit_cost: Decimal,

    /// 批次列表
    pub items: Vec<InventoryItem>,

    /// 批次序號計數器
    pub next_seq: u64,
}

impl Inventory {
    /// 創建新的庫存列（數量 0、成本 0）
    pub fn new(product_id: Uuid, warehouse_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            product_id,
            warehouse_id,
            unit_cost: Decimal::ZERO,
            items: Vec::new(),
            next_seq: 0,
        }
    }

    /// 現有總數量（批次加總）
    pub fn quantity(&self) -> Decimal {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// 添加新批次並返回批次ID
    pub fn push_item(&mut self, quantity: Decimal, storage_location: Option<String>) -> Uuid {
        let seq = self.next_seq;
        self.next_seq += 1;
        let item = InventoryItem::new(quantity, storage_location, seq);
        let id = item.id;
        self.items.push(item);
        id
    }

    /// 取得指定批次（可變）
    pub fn item_mut(&mut self, item_id: Uuid) -> Option<&mut InventoryItem> {
        self.items.iter_mut().find(|i| i.id == item_id)
    }
}

/// 工作站迷你庫存（產品 × 工作站 唯一，單桶無儲位）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MiniInventory {
    /// 迷你庫存ID
    pub id: Uuid,

    /// 產品ID
    pub product_id: Uuid,

    /// 工作站ID
    pub work_station_id: Uuid,

    /// 數量
    pub quantity: Decimal,

    /// 加權平均單位成本
    pub unit_cost: Decimal,
}

impl MiniInventory {
    /// 創建新的迷你庫存列（數量 0、成本 0）
    pub fn new(product_id: Uuid, work_station_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            product_id,
            work_station_id,
            quantity: Decimal::ZERO,
            unit_cost: Decimal::ZERO,
        }
    }
}

/// 異動類型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionType {
    /// 入庫
    In,
    /// 出庫
    Out,
}

/// 庫存異動紀錄（建立後不可變）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryTransaction {
    /// 異動ID
    pub id: Uuid,

    /// 產品ID
    pub product_id: Uuid,

    /// 倉庫ID
    pub warehouse_id: Uuid,

    /// 儲位
    pub storage_location: Option<String>,

    /// 數量
    pub quantity: Decimal,

    /// 異動類型
    pub transaction_type: TransactionType,

    /// 成本
    pub cost: Decimal,

    /// 工作站脈絡
    pub work_station_id: Option<Uuid>,

    /// 供應商脈絡
    pub supplier_id: Option<Uuid>,

    /// 業務代理脈絡
    pub agent_id: Option<Uuid>,

    /// 建立時間
    pub created_at: DateTime<Utc>,
}

impl InventoryTransaction {
    /// 創建新的異動紀錄
    pub fn new(
        product_id: Uuid,
        warehouse_id: Uuid,
        quantity: Decimal,
        transaction_type: TransactionType,
        cost: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            product_id,
            warehouse_id,
            storage_location: None,
            quantity,
            transaction_type,
            cost,
            work_station_id: None,
            supplier_id: None,
            agent_id: None,
            created_at: Utc::now(),
        }
    }

    /// 建構器模式：設置儲位
    pub fn with_location(mut self, location: Option<String>) -> Self {
        self.storage_location = location;
        self
    }

    /// 建構器模式：設置工作站脈絡
    pub fn with_work_station(mut self, work_station_id: Option<Uuid>) -> Self {
        self.work_station_id = work_station_id;
        self
    }

    /// 建構器模式：設置供應商脈絡
    pub fn with_supplier(mut self, supplier_id: Option<Uuid>) -> Self {
        self.supplier_id = supplier_id;
        self
    }
}
