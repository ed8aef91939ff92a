//! # ProdFlow
//!
//! 製造業 ERP 核心：雙層庫存帳、生產模板推算、生產訂單狀態機
//! 與供應訂單引擎。純記憶體模型，所有操作快照交易保證原子性。
//!
//! ## 快速開始
//!
//! ```
//! use prodflow::prelude::*;
//! use rust_decimal::Decimal;
//!
//! let mut store = Store::new();
//! let category_id = store.add_category(ProductCategory::new("原料", MeasureUnit::Piece));
//! let product_id = store.add_product(Product::new(
//!     "原料A",
//!     "RM-A",
//!     ProductType::RawMaterial,
//!     category_id,
//! ));
//! let warehouse_id = store.add_warehouse(Warehouse::new("主倉", "WH1"));
//!
//! // 入庫 10 件，總成本 30
//! StockRecorder::add_stock(
//!     &mut store,
//!     StockReceipt::new(product_id, warehouse_id, Decimal::from(10))
//!         .with_cost(Decimal::from(30)),
//! )
//! .unwrap();
//! assert_eq!(
//!     store.inventories[&(product_id, warehouse_id)].unit_cost,
//!     Decimal::from(3)
//! );
//! ```

pub use prodflow_core as core;
pub use prodflow_engine as engine;
pub use prodflow_ledger as ledger;
pub use prodflow_store as store;

/// 常用類型一次導入
pub mod prelude {
    pub use prodflow_core::{
        DomainEvent, DurationUnit, ErpError, GroupType, Inventory, InventoryTransaction,
        MaterialStatus, MeasureUnit, MiniInventory, Partner, PartnerType, ProdOrder,
        ProdOrderGroup, ProdOrderStatus, ProdOrderStep, ProdTemplate, ProdTemplateStep, Product,
        ProductCategory, ProductType, Result, StepStatus, SupplyOrder, SupplyOrderState, Task,
        TaskAction, TransactionType, UserRole, Warehouse, WorkStation,
    };
    pub use prodflow_engine::{
        CategoryShortfalls, Notifier, ProductionEngine, SupplyEngine, SupplyOrderForm,
        SupplyOrderFormLine, TemplateCalculator,
    };
    pub use prodflow_ledger::{InventoryLedger, StockReceipt, StockRecorder};
    pub use prodflow_store::{SharedStore, Store};
}

/// 初始化日誌（依 RUST_LOG 過濾，重複呼叫靜默忽略）
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let _ = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}
