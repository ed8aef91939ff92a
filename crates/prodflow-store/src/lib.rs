//! # ProdFlow Store
//!
//! 記憶體實體儲存與快照交易

pub mod shared;
pub mod store;

// Re-export 主要類型
pub use shared::SharedStore;
pub use store::Store;
