//! 產品模型

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 產品類型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductType {
    /// 原物料
    RawMaterial,
    /// 半成品
    SemiFinished,
    /// 成品
    ReadyProduct,
}

/// 計量單位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeasureUnit {
    /// 件
    Piece,
    /// 公斤
    Kilogram,
    /// 公克
    Gram,
    /// 公升
    Liter,
    /// 公尺
    Meter,
    /// 組
    Set,
}

/// 產品分類（決定計量單位）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCategory {
    /// 分類ID
    pub id: Uuid,

    /// 分類名稱
    pub name: String,

    /// 計量單位
    pub measure_unit: MeasureUnit,
}

impl ProductCategory {
    /// 創建新的產品分類
    pub fn new(name: impl Into<String>, measure_unit: MeasureUnit) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            measure_unit,
        }
    }
}

/// 產品（不可變的參考資料）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// 產品ID
    pub id: Uuid,

    /// 產品名稱
    pub name: String,

    /// 產品代碼
    pub code: String,

    /// 產品類型
    pub product_type: ProductType,

    /// 產品分類
    pub category_id: Uuid,

    /// 售價
    pub price: Decimal,
}

impl Product {
    /// 創建新的產品
    pub fn new(
        name: impl Into<String>,
        code: impl Into<String>,
        product_type: ProductType,
        category_id: Uuid,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            code: code.into(),
            product_type,
            category_id,
            price: Decimal::ZERO,
        }
    }

    /// 建構器模式：設置售價
    pub fn with_price(mut self, price: Decimal) -> Self {
        self.price = price;
        self
    }

    /// 檢查是否為原物料
    pub fn is_raw_material(&self) -> bool {
        self.product_type == ProductType::RawMaterial
    }

    /// 檢查是否為成品
    pub fn is_ready_product(&self) -> bool {
        self.product_type == ProductType::ReadyProduct
    }
}
