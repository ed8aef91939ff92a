//! 供應訂單模型

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 供應訂單生命週期狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SupplyOrderState {
    /// 已建立
    Created,
    /// 處理中
    InProgress,
    /// 已到貨（待核對）
    Delivered,
    /// 已關閉
    Closed,
}

/// 供應訂單產品明細
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplyOrderProduct {
    /// 產品ID
    pub product_id: Uuid,

    /// 預期數量
    pub expected_quantity: Decimal,

    /// 實際到貨數量
    pub actual_quantity: Decimal,

    /// 單價
    pub price: Decimal,
}

impl SupplyOrderProduct {
    /// 創建新的產品明細（實際數量起始為 0）
    pub fn new(product_id: Uuid, expected_quantity: Decimal, price: Decimal) -> Self {
        Self {
            product_id,
            expected_quantity,
            actual_quantity: Decimal::ZERO,
            price,
        }
    }

    /// 檢查實際到貨是否等於預期
    pub fn is_matched(&self) -> bool {
        self.actual_quantity == self.expected_quantity
    }
}

/// 供應訂單（補貨）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplyOrder {
    /// 訂單ID
    pub id: Uuid,

    /// 單號
    pub number: String,

    /// 供應商（關閉前必須指定）
    pub supplier_id: Option<Uuid>,

    /// 入庫倉庫
    pub warehouse_id: Uuid,

    /// 產品分類
    pub category_id: Uuid,

    /// 觸發本單的生產訂單（缺料補貨時）
    pub prod_order_id: Option<Uuid>,

    /// 生命週期狀態
    pub state: SupplyOrderState,

    /// 自由文字子狀態（例如 AwaitingSupplierApproval）
    pub status: Option<String>,

    /// 關閉時間（單向轉換，設置後不再清除）
    pub closed_at: Option<DateTime<Utc>>,

    /// 關閉人
    pub closed_by: Option<Uuid>,

    /// 產品明細
    pub products: Vec<SupplyOrderProduct>,
}

impl SupplyOrder {
    /// 創建新的供應訂單
    pub fn new(number: impl Into<String>, warehouse_id: Uuid, category_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            number: number.into(),
            supplier_id: None,
            warehouse_id,
            category_id,
            prod_order_id: None,
            state: SupplyOrderState::Created,
            status: None,
            closed_at: None,
            closed_by: None,
            products: Vec::new(),
        }
    }

    /// 建構器模式：設置供應商
    pub fn with_supplier(mut self, supplier_id: Uuid) -> Self {
        self.supplier_id = Some(supplier_id);
        self
    }

    /// 建構器模式：關聯生產訂單
    pub fn with_prod_order(mut self, prod_order_id: Uuid) -> Self {
        self.prod_order_id = Some(prod_order_id);
        self
    }

    /// 建構器模式：設置子狀態
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// 建構器模式：添加產品明細
    pub fn with_product(mut self, product: SupplyOrderProduct) -> Self {
        self.products.push(product);
        self
    }

    /// 檢查是否已關閉
    pub fn is_closed(&self) -> bool {
        self.closed_at.is_some()
    }

    /// 取得指定產品的明細（可變）
    pub fn product_mut(&mut self, product_id: Uuid) -> Option<&mut SupplyOrderProduct> {
        self.products
            .iter_mut()
            .find(|p| p.product_id == product_id)
    }

    /// 檢查所有明細實際到貨是否等於預期
    pub fn all_matched(&self) -> bool {
        self.products.iter().all(|p| p.is_matched())
    }
}

/// 生成供應訂單單號：SO-<DDMMYY>-<流水號>
pub fn supply_order_number(date: NaiveDate, seq: u64) -> String {
    format!("SO-{}-{:04}", date.format("%d%m%y"), seq)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supply_order_number() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 29).unwrap();
        assert_eq!(supply_order_number(date, 7), "SO-290826-0007");
    }

    #[test]
    fn test_supply_order_builder() {
        let order = SupplyOrder::new("SO-X", Uuid::new_v4(), Uuid::new_v4())
            .with_supplier(Uuid::new_v4())
            .with_prod_order(Uuid::new_v4())
            .with_status("AwaitingWarehouseApproval")
            .with_product(SupplyOrderProduct::new(
                Uuid::new_v4(),
                Decimal::from(12),
                Decimal::from(30),
            ));

        assert!(order.supplier_id.is_some());
        assert!(order.prod_order_id.is_some());
        assert!(!order.is_closed());
        assert_eq!(order.products.len(), 1);
        // 實際數量尚未寫入
        assert!(!order.all_matched());
    }

    #[test]
    fn test_all_matched() {
        let product_id = Uuid::new_v4();
        let mut order = SupplyOrder::new("SO-X", Uuid::new_v4(), Uuid::new_v4()).with_product(
            SupplyOrderProduct::new(product_id, Decimal::from(5), Decimal::ONE),
        );

        order.product_mut(product_id).unwrap().actual_quantity = Decimal::from(5);
        assert!(order.all_matched());
    }
}
