//! # ProdFlow Ledger
//!
//! 庫存帳本（倉庫批次 + 工作站迷你庫存）與異動記錄器

pub mod costing;
pub mod ledger;
pub mod recorder;

// Re-export 主要類型
pub use costing::weighted_average_cost;
pub use ledger::InventoryLedger;
pub use recorder::{StockReceipt, StockRecorder};
