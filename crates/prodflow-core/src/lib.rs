//! # ProdFlow Core
//!
//! 核心資料模型與類型定義

pub mod event;
pub mod inventory;
pub mod order;
pub mod partner;
pub mod product;
pub mod supply;
pub mod task;
pub mod template;

// Re-export 主要類型
pub use event::DomainEvent;
pub use inventory::{
    Inventory, InventoryItem, InventoryTransaction, MiniInventory, TransactionType,
};
pub use order::{
    prod_order_number, GroupType, MaterialStatus, ProdOrder, ProdOrderGroup, ProdOrderStatus,
    ProdOrderStep, ProdOrderStepProduct, StepStatus,
};
pub use partner::{DurationUnit, Partner, PartnerType, Warehouse, WorkStation};
pub use product::{MeasureUnit, Product, ProductCategory, ProductType};
pub use supply::{supply_order_number, SupplyOrder, SupplyOrderProduct, SupplyOrderState};
pub use task::{RelatedEntityRef, Task, TaskAction, TaskRecipients, TaskStatus, UserRole};
pub use template::{ProdTemplate, ProdTemplateStep, TemplateMaterial};

use rust_decimal::Decimal;

/// ERP 錯誤類型
#[derive(Debug, thiserror::Error)]
pub enum ErpError {
    #[error("輸入驗證失敗: {}", .0.join("; "))]
    ValidationFailed(Vec<String>),

    #[error("訂單尚未確認，無法開工")]
    NotConfirmed,

    #[error("訂單已經開工，不可重複開工")]
    AlreadyStarted,

    #[error("當前工序尚未完工，無法進入下一工序")]
    StepNotCompleted,

    #[error("該工序已完工，不可重複回報")]
    StepAlreadyCompleted,

    #[error("訂單尚未完工，無法核准入庫")]
    NotCompleted,

    #[error("數量必須大於零")]
    InvalidQuantity,

    #[error("庫存不足: {product}，可用數量 {available}")]
    InsufficientStock { product: String, available: Decimal },

    #[error("供應訂單已經關閉")]
    AlreadyClosed,

    #[error("供應訂單缺少供應商，無法關閉")]
    NoSupplier,

    #[error("供應訂單沒有產品明細，無法關閉")]
    NoProducts,

    #[error("產品 {0} 的實際到貨數量為零，無法關閉")]
    ZeroActualQuantity(String),

    #[error("找不到資料: {0}")]
    NotFound(String),

    #[error("找不到產品 {0} 的生產模板")]
    TemplateNotFound(String),

    #[error("資料正被其他操作使用，請稍後重試")]
    ConcurrencyConflict,

    #[error("其他錯誤: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, ErpError>;
