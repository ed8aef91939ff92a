//! 合作夥伴、倉庫與工作站模型

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 合作夥伴類型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartnerType {
    /// 供應商
    Supplier,
    /// 業務代理
    Agent,
}

/// 合作夥伴（供應商 / 業務代理）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Partner {
    /// 夥伴ID
    pub id: Uuid,

    /// 名稱
    pub name: String,

    /// 代碼（用於單號生成）
    pub code: String,

    /// 夥伴類型
    pub partner_type: PartnerType,
}

impl Partner {
    /// 創建新的合作夥伴
    pub fn new(
        name: impl Into<String>,
        code: impl Into<String>,
        partner_type: PartnerType,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            code: code.into(),
            partner_type,
        }
    }

    /// 檢查是否為供應商
    pub fn is_supplier(&self) -> bool {
        self.partner_type == PartnerType::Supplier
    }
}

/// 倉庫
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warehouse {
    /// 倉庫ID
    pub id: Uuid,

    /// 倉庫名稱
    pub name: String,

    /// 倉庫代碼
    pub code: String,
}

impl Warehouse {
    /// 創建新的倉庫
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            code: code.into(),
        }
    }
}

/// 產能時間單位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DurationUnit {
    /// 日
    Day,
    /// 週
    Week,
    /// 月（以 30 天折算）
    Month,
}

impl DurationUnit {
    /// 折算為天數
    pub fn days(&self) -> Decimal {
        match self {
            DurationUnit::Day => Decimal::ONE,
            DurationUnit::Week => Decimal::from(7),
            DurationUnit::Month => Decimal::from(30),
        }
    }
}

/// 工作站（含產能率，用於交期推算）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkStation {
    /// 工作站ID
    pub id: Uuid,

    /// 工作站名稱
    pub name: String,

    /// 產能數量（在 performance_duration 內可完成的數量）
    pub performance_quantity: Decimal,

    /// 產能週期長度
    pub performance_duration: Decimal,

    /// 產能週期單位
    pub duration_unit: DurationUnit,
}

impl WorkStation {
    /// 創建新的工作站
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            performance_quantity: Decimal::ZERO,
            performance_duration: Decimal::ONE,
            duration_unit: DurationUnit::Day,
        }
    }

    /// 建構器模式：設置產能率
    pub fn with_performance(
        mut self,
        quantity: Decimal,
        duration: Decimal,
        unit: DurationUnit,
    ) -> Self {
        self.performance_quantity = quantity;
        self.performance_duration = duration;
        self.duration_unit = unit;
        self
    }

    /// 每日產能（產能數量 / 折算天數）
    ///
    /// 產能未設置時返回 None
    pub fn daily_rate(&self) -> Option<Decimal> {
        let days = self.performance_duration * self.duration_unit.days();
        if days <= Decimal::ZERO || self.performance_quantity <= Decimal::ZERO {
            return None;
        }
        Some(self.performance_quantity / days)
    }
}
