//! # ProdFlow Engine
//!
//! 生產訂單狀態機、模板推算與供應訂單引擎

pub mod notify;
pub mod production;
pub mod supply;
pub mod template_calc;

// Re-export 主要類型
pub use notify::Notifier;
pub use production::ProductionEngine;
pub use supply::{SupplyEngine, SupplyOrderForm, SupplyOrderFormLine};
pub use template_calc::TemplateCalculator;

use std::collections::HashMap;

use rust_decimal::Decimal;
use uuid::Uuid;

/// 單一材料缺口
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortfall {
    /// 材料產品ID
    pub product_id: Uuid,

    /// 缺口數量
    pub quantity: Decimal,
}

impl Shortfall {
    /// 創建新的缺口
    pub fn new(product_id: Uuid, quantity: Decimal) -> Self {
        Self {
            product_id,
            quantity,
        }
    }
}

/// 按產品分類彙總的材料缺口
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryShortfalls {
    /// 分類ID → 缺口列表
    pub by_category: HashMap<Uuid, Vec<Shortfall>>,
}

impl CategoryShortfalls {
    /// 創建空的彙總
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加一筆缺口
    pub fn add(&mut self, category_id: Uuid, product_id: Uuid, quantity: Decimal) {
        self.by_category
            .entry(category_id)
            .or_default()
            .push(Shortfall::new(product_id, quantity));
    }

    /// 檢查是否沒有任何缺口
    pub fn is_empty(&self) -> bool {
        self.by_category.is_empty()
    }

    /// 缺口總量（跨分類）
    pub fn total_quantity(&self) -> Decimal {
        self.by_category
            .values()
            .flatten()
            .map(|s| s.quantity)
            .sum()
    }

    /// 取得指定產品的缺口數量
    pub fn quantity_of(&self, product_id: Uuid) -> Decimal {
        self.by_category
            .values()
            .flatten()
            .filter(|s| s.product_id == product_id)
            .map(|s| s.quantity)
            .sum()
    }
}
