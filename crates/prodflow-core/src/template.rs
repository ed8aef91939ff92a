//! 生產模板模型（BOM，執行期間唯讀）

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::product::MeasureUnit;

/// 模板工序的材料明細（每 1 單位產出所需數量）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateMaterial {
    /// 材料產品ID
    pub product_id: Uuid,

    /// 需求數量（每 1 單位產出）
    pub required_quantity: Decimal,
}

impl TemplateMaterial {
    /// 創建新的材料明細
    pub fn new(product_id: Uuid, required_quantity: Decimal) -> Self {
        Self {
            product_id,
            required_quantity,
        }
    }
}

/// 模板工序
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProdTemplateStep {
    /// 工序ID
    pub id: Uuid,

    /// 工序順序（1 起算，模板內唯一）
    pub sequence: u32,

    /// 工作站
    pub work_station_id: Uuid,

    /// 產出產品
    pub output_product_id: Uuid,

    /// 預期產出數量（每 1 單位訂單產出）
    pub expected_quantity: Decimal,

    /// 計量單位
    pub measure_unit: MeasureUnit,

    /// 材料明細
    pub materials: Vec<TemplateMaterial>,
}

impl ProdTemplateStep {
    /// 創建新的模板工序
    pub fn new(
        sequence: u32,
        work_station_id: Uuid,
        output_product_id: Uuid,
        expected_quantity: Decimal,
        measure_unit: MeasureUnit,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            sequence,
            work_station_id,
            output_product_id,
            expected_quantity,
            measure_unit,
            materials: Vec::new(),
        }
    }

    /// 建構器模式：添加材料明細
    pub fn with_material(mut self, product_id: Uuid, required_quantity: Decimal) -> Self {
        self.materials
            .push(TemplateMaterial::new(product_id, required_quantity));
        self
    }
}

/// 生產模板（靜態工藝路線，訂單開工時複製為工作副本）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProdTemplate {
    /// 模板ID
    pub id: Uuid,

    /// 產出產品
    pub product_id: Uuid,

    /// 建立時間（同產品取最新模板）
    pub created_at: DateTime<Utc>,

    /// 工序列表
    pub steps: Vec<ProdTemplateStep>,
}

impl ProdTemplate {
    /// 創建新的生產模板
    pub fn new(product_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            product_id,
            created_at: Utc::now(),
            steps: Vec::new(),
        }
    }

    /// 建構器模式：添加工序
    pub fn with_step(mut self, step: ProdTemplateStep) -> Self {
        self.steps.push(step);
        self
    }

    /// 取得按 sequence 升冪排列的工序
    pub fn ordered_steps(&self) -> Vec<&ProdTemplateStep> {
        let mut steps: Vec<&ProdTemplateStep> = self.steps.iter().collect();
        steps.sort_by_key(|s| s.sequence);
        steps
    }

    /// 取得第一道工序（sequence == 1）
    pub fn first_step(&self) -> Option<&ProdTemplateStep> {
        self.steps.iter().find(|s| s.sequence == 1)
    }
}
