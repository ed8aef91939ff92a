//! 領域事件（外部協作者的顯式整合點）

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 領域事件
///
/// 事件收集在儲存層的 outbox 中，由呼叫端顯式消費；
/// 核心不註冊任何隱式監聽器。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DomainEvent {
    /// 供應訂單已關閉（被阻塞的生產訂單可藉此重新備料）
    SupplyOrderClosed {
        supply_order_id: Uuid,
        prod_order_id: Option<Uuid>,
    },
}
