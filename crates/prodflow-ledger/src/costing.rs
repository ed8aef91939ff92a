//! 加權平均成本計算（與批次變動分離，獨立可測）

use rust_decimal::Decimal;

/// 計算入庫後的新加權平均單位成本
///
/// `incoming_cost` 為本次入庫數量的總成本。
/// `new_avg = (existing_qty * old_avg + incoming_cost) / (existing_qty + incoming_qty)`，
/// 四捨五入到 2 位小數。總數量為零時維持原平均。
pub fn weighted_average_cost(
    existing_qty: Decimal,
    old_avg: Decimal,
    incoming_qty: Decimal,
    incoming_cost: Decimal,
) -> Decimal {
    let total_qty = existing_qty + incoming_qty;
    if total_qty <= Decimal::ZERO {
        return old_avg;
    }
    ((existing_qty * old_avg + incoming_cost) / total_qty).round_dp(2)
}
