//! 生產訂單模型

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 生產訂單狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProdOrderStatus {
    /// 待開工
    Pending,
    /// 生產中
    Processing,
    /// 缺料阻塞（等待供應解決後回到生產中）
    Blocked,
    /// 已完工（等待核准入庫）
    Completed,
    /// 已核准
    Approved,
}

/// 工序狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepStatus {
    /// 待執行
    Pending,
    /// 執行中
    InProgress,
    /// 已完工
    Completed,
}

/// 材料明細狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaterialStatus {
    /// 待備料
    Pending,
    /// 實際到站（由上一道工序轉入）
    Actual,
    /// 已投料
    Used,
}

/// 訂單群組類型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupType {
    /// 接單生產
    ByOrder,
    /// 備貨生產
    ByCatalog,
}

/// 生產訂單群組
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProdOrderGroup {
    /// 群組ID
    pub id: Uuid,

    /// 群組類型
    pub group_type: GroupType,

    /// 出入庫倉庫
    pub warehouse_id: Uuid,

    /// 業務代理（接單生產時使用）
    pub agent_id: Option<Uuid>,

    /// 交貨期限（備貨生產時使用）
    pub deadline: Option<NaiveDate>,
}

impl ProdOrderGroup {
    /// 創建新的訂單群組
    pub fn new(group_type: GroupType, warehouse_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            group_type,
            warehouse_id,
            agent_id: None,
            deadline: None,
        }
    }

    /// 建構器模式：設置業務代理
    pub fn with_agent(mut self, agent_id: Uuid) -> Self {
        self.agent_id = Some(agent_id);
        self
    }

    /// 建構器模式：設置交貨期限
    pub fn with_deadline(mut self, deadline: NaiveDate) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// 工序材料明細（模板材料的可變工作副本）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProdOrderStepProduct {
    /// 材料產品ID
    pub product_id: Uuid,

    /// 需求數量（已按訂單數量放大）
    pub required_quantity: Decimal,

    /// 已備數量
    pub available_quantity: Decimal,

    /// 已投料數量
    pub used_quantity: Decimal,

    /// 明細狀態
    pub status: MaterialStatus,
}

impl ProdOrderStepProduct {
    /// 創建新的材料明細
    pub fn new(product_id: Uuid, required_quantity: Decimal) -> Self {
        Self {
            product_id,
            required_quantity,
            available_quantity: Decimal::ZERO,
            used_quantity: Decimal::ZERO,
            status: MaterialStatus::Pending,
        }
    }

    /// 尚缺數量
    pub fn lacking_quantity(&self) -> Decimal {
        if self.available_quantity < self.required_quantity {
            self.required_quantity - self.available_quantity
        } else {
            Decimal::ZERO
        }
    }

    /// 檢查備料是否已滿足需求
    pub fn is_satisfied(&self) -> bool {
        self.available_quantity >= self.required_quantity
    }
}

/// 訂單工序（模板工序的可變工作副本）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProdOrderStep {
    /// 工序ID
    pub id: Uuid,

    /// 工序順序（1 起算）
    pub sequence: u32,

    /// 工作站
    pub work_station_id: Uuid,

    /// 工序狀態
    pub status: StepStatus,

    /// 產出產品
    pub output_product_id: Uuid,

    /// 預期產出數量（已按訂單數量放大）
    pub expected_quantity: Decimal,

    /// 實際產出數量
    pub output_quantity: Decimal,

    /// 材料明細
    pub materials: Vec<ProdOrderStepProduct>,
}

impl ProdOrderStep {
    /// 創建新的訂單工序
    pub fn new(
        sequence: u32,
        work_station_id: Uuid,
        output_product_id: Uuid,
        expected_quantity: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            sequence,
            work_station_id,
            status: StepStatus::Pending,
            output_product_id,
            expected_quantity,
            output_quantity: Decimal::ZERO,
            materials: Vec::new(),
        }
    }

    /// 建構器模式：添加材料明細
    pub fn with_material(mut self, material: ProdOrderStepProduct) -> Self {
        self.materials.push(material);
        self
    }

    /// 取得指定產品的材料明細
    pub fn material(&self, product_id: Uuid) -> Option<&ProdOrderStepProduct> {
        self.materials.iter().find(|m| m.product_id == product_id)
    }

    /// 取得指定產品的材料明細（可變）
    pub fn material_mut(&mut self, product_id: Uuid) -> Option<&mut ProdOrderStepProduct> {
        self.materials
            .iter_mut()
            .find(|m| m.product_id == product_id)
    }

    /// 檢查所有材料是否已備齊
    pub fn all_materials_satisfied(&self) -> bool {
        self.materials.iter().all(|m| m.is_satisfied())
    }
}

/// 生產訂單
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProdOrder {
    /// 訂單ID
    pub id: Uuid,

    /// 單號（PO-<代理代碼><產品代碼><DDMMYY>）
    pub number: String,

    /// 所屬群組
    pub group_id: Uuid,

    /// 產出產品
    pub product_id: Uuid,

    /// 訂單數量
    pub quantity: Decimal,

    /// 報價
    pub offer_price: Decimal,

    /// 訂單狀態
    pub status: ProdOrderStatus,

    /// 確認時間（未確認不可開工）
    pub confirmed_at: Option<DateTime<Utc>>,

    /// 確認人
    pub confirmed_by: Option<Uuid>,

    /// 當前工序
    pub current_step_id: Option<Uuid>,

    /// 總成本（開工時依模板推算）
    pub total_cost: Decimal,

    /// 推算交期（天）
    pub deadline_days: u32,

    /// 工序列表（開工時自模板複製）
    pub steps: Vec<ProdOrderStep>,
}

impl ProdOrder {
    /// 創建新的生產訂單
    pub fn new(
        number: impl Into<String>,
        group_id: Uuid,
        product_id: Uuid,
        quantity: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            number: number.into(),
            group_id,
            product_id,
            quantity,
            offer_price: Decimal::ZERO,
            status: ProdOrderStatus::Pending,
            confirmed_at: None,
            confirmed_by: None,
            current_step_id: None,
            total_cost: Decimal::ZERO,
            deadline_days: 0,
            steps: Vec::new(),
        }
    }

    /// 建構器模式：設置報價
    pub fn with_offer_price(mut self, price: Decimal) -> Self {
        self.offer_price = price;
        self
    }

    /// 確認訂單
    pub fn confirm(&mut self, user_id: Uuid) {
        self.confirmed_at = Some(Utc::now());
        self.confirmed_by = Some(user_id);
    }

    /// 檢查是否已確認
    pub fn is_confirmed(&self) -> bool {
        self.confirmed_at.is_some()
    }

    /// 檢查是否已開工（任何非待開工狀態都算）
    pub fn is_started(&self) -> bool {
        self.status != ProdOrderStatus::Pending
    }

    /// 取得當前工序
    pub fn current_step(&self) -> Option<&ProdOrderStep> {
        let id = self.current_step_id?;
        self.steps.iter().find(|s| s.id == id)
    }

    /// 取得指定工序
    pub fn step(&self, step_id: Uuid) -> Option<&ProdOrderStep> {
        self.steps.iter().find(|s| s.id == step_id)
    }

    /// 取得指定工序之後的下一道工序（依 sequence）
    pub fn next_step_after(&self, sequence: u32) -> Option<&ProdOrderStep> {
        self.steps
            .iter()
            .filter(|s| s.sequence > sequence)
            .min_by_key(|s| s.sequence)
    }

    /// 取得最後一道工序（sequence 最大）
    pub fn last_step(&self) -> Option<&ProdOrderStep> {
        self.steps.iter().max_by_key(|s| s.sequence)
    }
}

/// 生成生產訂單單號：PO-<代理代碼><產品代碼><DDMMYY>
pub fn prod_order_number(agent_code: &str, product_code: &str, date: NaiveDate) -> String {
    format!("PO-{}{}{}", agent_code, product_code, date.format("%d%m%y"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prod_order_number() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 5).unwrap();
        assert_eq!(prod_order_number("AG1", "BK7", date), "PO-AG1BK7050326");
    }

    #[test]
    fn test_order_confirm_and_start_flags() {
        let mut order = ProdOrder::new("PO-X", Uuid::new_v4(), Uuid::new_v4(), Decimal::from(3));
        assert!(!order.is_confirmed());
        assert!(!order.is_started());

        order.confirm(Uuid::new_v4());
        assert!(order.is_confirmed());

        order.status = ProdOrderStatus::Blocked;
        assert!(order.is_started());
    }

    #[test]
    fn test_step_navigation() {
        let product = Uuid::new_v4();
        let station = Uuid::new_v4();
        let mut order = ProdOrder::new("PO-X", Uuid::new_v4(), product, Decimal::ONE);
        order.steps.push(ProdOrderStep::new(1, station, product, Decimal::ONE));
        order.steps.push(ProdOrderStep::new(2, station, product, Decimal::ONE));

        assert_eq!(order.next_step_after(1).unwrap().sequence, 2);
        assert!(order.next_step_after(2).is_none());
        assert_eq!(order.last_step().unwrap().sequence, 2);
    }

    #[test]
    fn test_material_lacking_quantity() {
        let mut material = ProdOrderStepProduct::new(Uuid::new_v4(), Decimal::from(12));
        assert_eq!(material.lacking_quantity(), Decimal::from(12));
        assert!(!material.is_satisfied());

        material.available_quantity = Decimal::from(12);
        assert_eq!(material.lacking_quantity(), Decimal::ZERO);
        assert!(material.is_satisfied());
    }
}
