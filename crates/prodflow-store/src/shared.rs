//! 共享儲存（多執行緒呼叫端用）

use std::sync::{Arc, Mutex};

use prodflow_core::{ErpError, Result};

use crate::store::Store;

/// 以互斥鎖包裝的共享儲存
///
/// 單一操作模型：每次呼叫取得鎖、執行、釋放。取不到鎖時回傳
/// `ConcurrencyConflict` 交由呼叫端重試，不做隱式重試。
#[derive(Debug, Clone, Default)]
pub struct SharedStore {
    inner: Arc<Mutex<Store>>,
}

impl SharedStore {
    /// 創建新的共享儲存
    pub fn new(store: Store) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    /// 在鎖內執行操作
    pub fn with<T>(&self, f: impl FnOnce(&mut Store) -> Result<T>) -> Result<T> {
        let mut guard = self
            .inner
            .try_lock()
            .map_err(|_| ErpError::ConcurrencyConflict)?;
        f(&mut guard)
    }
}
