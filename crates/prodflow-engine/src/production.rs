//! 生產訂單狀態機
//!
//! Pending → Processing ⇄ Blocked → Completed → Approved
//!
//! 備料永遠偏好部分滿足：訂單以現有量繼續推進，缺口另行
//! 走供應鏈解決，不會因缺料整步拒絕。

use rust_decimal::Decimal;
use uuid::Uuid;

use prodflow_core::{
    ErpError, MaterialStatus, ProdOrderStatus, ProdOrderStep, ProdOrderStepProduct,
    RelatedEntityRef, Result, StepStatus, TaskAction, UserRole,
};
use prodflow_ledger::{StockReceipt, StockRecorder};
use prodflow_store::Store;

use crate::notify::Notifier;
use crate::supply::SupplyEngine;
use crate::template_calc::TemplateCalculator;
use crate::CategoryShortfalls;

/// 生產訂單引擎
pub struct ProductionEngine;

impl ProductionEngine {
    /// 開工
    ///
    /// 自最新模板複製工序為工作副本（需求/預期數量按訂單數量放大），
    /// 第一道工序就地備料：迷你庫存先計入，缺額由倉庫轉入。
    /// 仍有缺口時訂單轉 Blocked 並按分類建立供應訂單，否則 Processing。
    pub fn start(store: &mut Store, order_id: Uuid, acting_user: Uuid) -> Result<()> {
        store.transaction(|s| {
            let mut order = s
                .orders
                .get(&order_id)
                .cloned()
                .ok_or_else(|| ErpError::NotFound(format!("生產訂單 {order_id}")))?;
            if !order.is_confirmed() {
                return Err(ErpError::NotConfirmed);
            }
            if order.is_started() {
                return Err(ErpError::AlreadyStarted);
            }

            let group = s
                .groups
                .get(&order.group_id)
                .cloned()
                .ok_or_else(|| ErpError::NotFound(format!("訂單群組 {}", order.group_id)))?;
            let warehouse_id = group.warehouse_id;

            let template = s
                .latest_template(order.product_id)
                .cloned()
                .ok_or_else(|| ErpError::TemplateNotFound(s.product_name(order.product_id)))?;

            tracing::info!(
                user = %acting_user,
                "開工生產訂單 {}：產品 {}，數量 {}",
                order.number,
                s.product_name(order.product_id),
                order.quantity
            );

            // 複製模板工序為可變工作副本
            let mut steps: Vec<ProdOrderStep> = Vec::new();
            for tmpl_step in template.ordered_steps() {
                let mut step = ProdOrderStep::new(
                    tmpl_step.sequence,
                    tmpl_step.work_station_id,
                    tmpl_step.output_product_id,
                    tmpl_step.expected_quantity * order.quantity,
                );
                for material in &tmpl_step.materials {
                    step.materials.push(ProdOrderStepProduct::new(
                        material.product_id,
                        material.required_quantity * order.quantity,
                    ));
                }
                steps.push(step);
            }
            if steps.is_empty() {
                return Err(ErpError::Other(format!(
                    "產品 {} 的模板沒有任何工序",
                    s.product_name(order.product_id)
                )));
            }

            // 第一道工序備料
            let mut shortfalls = CategoryShortfalls::new();
            let first_station = steps[0].work_station_id;
            for idx in 0..steps[0].materials.len() {
                let product_id = steps[0].materials[idx].product_id;
                let required = steps[0].materials[idx].required_quantity;

                let short =
                    Self::stage_material(s, product_id, required, warehouse_id, first_station)?;
                steps[0].materials[idx].available_quantity = required - short;

                if short > Decimal::ZERO {
                    let category_id = s.product_category(product_id)?;
                    shortfalls.add(category_id, product_id, short);
                    tracing::debug!("材料 {} 缺口 {}", s.product_name(product_id), short);
                }
            }

            steps[0].status = StepStatus::InProgress;
            order.current_step_id = Some(steps[0].id);
            order.steps = steps;
            order.total_cost =
                (TemplateCalculator::total_cost(s, order.product_id, warehouse_id)?
                    * order.quantity)
                    .round_dp(2);
            order.deadline_days =
                TemplateCalculator::deadline_days_for_quantity(s, order.product_id, order.quantity)?;
            order.status = if shortfalls.is_empty() {
                ProdOrderStatus::Processing
            } else {
                ProdOrderStatus::Blocked
            };

            let blocked = !shortfalls.is_empty();
            s.orders.insert(order_id, order);

            if blocked {
                tracing::info!("訂單 {} 缺料阻塞，建立供應訂單", order_id);
                SupplyEngine::store_for_prod_order(s, order_id, &shortfalls)?;
            }
            Ok(())
        })
    }

    /// 開工前試算（唯讀）
    ///
    /// 與 `start` 用同一套備料邏輯計算缺口，只算不動。
    pub fn check_start(store: &Store, order_id: Uuid) -> Result<CategoryShortfalls> {
        let order = store
            .orders
            .get(&order_id)
            .ok_or_else(|| ErpError::NotFound(format!("生產訂單 {order_id}")))?;
        let group = store
            .groups
            .get(&order.group_id)
            .ok_or_else(|| ErpError::NotFound(format!("訂單群組 {}", order.group_id)))?;
        let template = store
            .latest_template(order.product_id)
            .ok_or_else(|| ErpError::TemplateNotFound(store.product_name(order.product_id)))?;
        let first = template.first_step().ok_or_else(|| {
            ErpError::Other(format!(
                "產品 {} 的模板沒有第一道工序",
                store.product_name(order.product_id)
            ))
        })?;

        let mut shortfalls = CategoryShortfalls::new();
        for material in &first.materials {
            let required = material.required_quantity * order.quantity;
            let mini_lack = StockRecorder::mini_stock_lack_qty(
                store,
                material.product_id,
                first.work_station_id,
                required,
            );
            if mini_lack <= Decimal::ZERO {
                continue;
            }
            let short = StockRecorder::stock_lack_qty(
                store,
                material.product_id,
                mini_lack,
                group.warehouse_id,
                None,
            );
            if short > Decimal::ZERO {
                let category_id = store.product_category(material.product_id)?;
                shortfalls.add(category_id, material.product_id, short);
            }
        }
        Ok(shortfalls)
    }

    /// 完工回報
    ///
    /// 自工作站迷你庫存投料，產出入同站迷你庫存（成本為投料成本彙總），
    /// 工序轉 Completed。重複回報直接拒絕（機器人雙擊防護）。
    pub fn complete_work(
        store: &mut Store,
        order_id: Uuid,
        step_id: Uuid,
        output_quantity: Decimal,
        acting_user: Uuid,
    ) -> Result<()> {
        store.transaction(|s| {
            if output_quantity <= Decimal::ZERO {
                return Err(ErpError::InvalidQuantity);
            }
            let mut order = s
                .orders
                .get(&order_id)
                .cloned()
                .ok_or_else(|| ErpError::NotFound(format!("生產訂單 {order_id}")))?;
            let step_idx = order
                .steps
                .iter()
                .position(|st| st.id == step_id)
                .ok_or_else(|| ErpError::NotFound(format!("工序 {step_id}")))?;
            if order.steps[step_idx].status == StepStatus::Completed {
                return Err(ErpError::StepAlreadyCompleted);
            }

            let station_id = order.steps[step_idx].work_station_id;
            let mut rolled_cost = Decimal::ZERO;
            for m_idx in 0..order.steps[step_idx].materials.len() {
                let (product_id, consume) = {
                    let material = &order.steps[step_idx].materials[m_idx];
                    let consume = if material.used_quantity > Decimal::ZERO {
                        material.used_quantity
                    } else {
                        material.required_quantity
                    };
                    (material.product_id, consume)
                };
                if consume <= Decimal::ZERO {
                    continue;
                }
                let unit_cost = s
                    .mini_inventories
                    .get(&(product_id, station_id))
                    .map(|m| m.unit_cost)
                    .unwrap_or(Decimal::ZERO);
                StockRecorder::remove_mini_stock(s, product_id, station_id, consume)?;
                rolled_cost += unit_cost * consume;

                let material = &mut order.steps[step_idx].materials[m_idx];
                material.used_quantity = consume;
                material.status = MaterialStatus::Used;
            }

            let output_product = order.steps[step_idx].output_product_id;
            StockRecorder::add_mini_stock(
                s,
                output_product,
                station_id,
                output_quantity,
                Some(rolled_cost.round_dp(2)),
            )?;

            order.steps[step_idx].output_quantity = output_quantity;
            order.steps[step_idx].status = StepStatus::Completed;

            tracing::info!(
                user = %acting_user,
                "工序 {} 完工：產出 {} × {}",
                order.steps[step_idx].sequence,
                s.product_name(output_product),
                output_quantity
            );
            s.orders.insert(order_id, order);
            Ok(())
        })
    }

    /// 推進到下一道工序
    ///
    /// 當前工序未完工則拒絕。有下一道工序時把本工序產出自舊站
    /// 迷你庫存搬到新站，記為新工序的實際到站材料；沒有下一道
    /// 工序時訂單轉 Completed（等待核准入庫）。
    pub fn next_step(store: &mut Store, order_id: Uuid) -> Result<()> {
        store.transaction(|s| {
            let mut order = s
                .orders
                .get(&order_id)
                .cloned()
                .ok_or_else(|| ErpError::NotFound(format!("生產訂單 {order_id}")))?;
            let current = order
                .current_step()
                .cloned()
                .ok_or_else(|| ErpError::Other("訂單沒有當前工序".to_string()))?;
            if current.status != StepStatus::Completed {
                return Err(ErpError::StepNotCompleted);
            }

            match order.next_step_after(current.sequence).map(|st| st.id) {
                Some(next_id) => {
                    let next_idx = order
                        .steps
                        .iter()
                        .position(|st| st.id == next_id)
                        .ok_or_else(|| ErpError::NotFound(format!("工序 {next_id}")))?;
                    let next_station = order.steps[next_idx].work_station_id;

                    let qty = current.output_quantity;
                    if qty > Decimal::ZERO {
                        let unit_cost = s
                            .mini_inventories
                            .get(&(current.output_product_id, current.work_station_id))
                            .map(|m| m.unit_cost)
                            .unwrap_or(Decimal::ZERO);
                        let unmet = StockRecorder::remove_mini_stock_force(
                            s,
                            current.output_product_id,
                            current.work_station_id,
                            qty,
                        )?;
                        let moved = qty - unmet;
                        if moved > Decimal::ZERO {
                            StockRecorder::add_mini_stock(
                                s,
                                current.output_product_id,
                                next_station,
                                moved,
                                Some((unit_cost * moved).round_dp(2)),
                            )?;
                            match order.steps[next_idx].material_mut(current.output_product_id) {
                                Some(material) => {
                                    material.available_quantity += moved;
                                    material.status = MaterialStatus::Actual;
                                }
                                None => {
                                    let mut material = ProdOrderStepProduct::new(
                                        current.output_product_id,
                                        moved,
                                    );
                                    material.available_quantity = moved;
                                    material.status = MaterialStatus::Actual;
                                    order.steps[next_idx].materials.push(material);
                                }
                            }
                        }
                    }

                    order.steps[next_idx].status = StepStatus::InProgress;
                    order.current_step_id = Some(next_id);
                    tracing::info!("訂單 {} 推進到工序 {}", order.number, order.steps[next_idx].sequence);
                }
                None => {
                    order.status = ProdOrderStatus::Completed;
                    tracing::info!("訂單 {} 全工序完工，等待核准", order.number);
                }
            }

            s.orders.insert(order_id, order);
            Ok(())
        })
    }

    /// 核准入庫
    ///
    /// 把最後一道工序的產出自迷你庫存轉入倉庫（記入庫異動），
    /// 訂單轉 Approved。實際產出與預期不符時通知生產管理員。
    pub fn approve(store: &mut Store, order_id: Uuid, acting_user: Uuid) -> Result<()> {
        store.transaction(|s| {
            let mut order = s
                .orders
                .get(&order_id)
                .cloned()
                .ok_or_else(|| ErpError::NotFound(format!("生產訂單 {order_id}")))?;
            if order.status != ProdOrderStatus::Completed {
                return Err(ErpError::NotCompleted);
            }
            let group = s
                .groups
                .get(&order.group_id)
                .cloned()
                .ok_or_else(|| ErpError::NotFound(format!("訂單群組 {}", order.group_id)))?;
            let last = order
                .last_step()
                .cloned()
                .ok_or_else(|| ErpError::Other("訂單沒有任何工序".to_string()))?;

            // 有完工回報時以實際產出入庫；移動預期數量會憑空生出庫存
            let qty = if last.output_quantity > Decimal::ZERO {
                last.output_quantity
            } else {
                last.expected_quantity
            };
            let unit_cost = s
                .mini_inventories
                .get(&(last.output_product_id, last.work_station_id))
                .map(|m| m.unit_cost)
                .unwrap_or(Decimal::ZERO);
            let unmet = StockRecorder::remove_mini_stock_force(
                s,
                last.output_product_id,
                last.work_station_id,
                qty,
            )?;
            let moved = qty - unmet;
            if moved > Decimal::ZERO {
                StockRecorder::add_stock(
                    s,
                    StockReceipt::new(last.output_product_id, group.warehouse_id, moved)
                        .with_cost((unit_cost * moved).round_dp(2))
                        .with_work_station(last.work_station_id),
                )?;
            }

            if last.output_quantity != last.expected_quantity {
                Notifier::notify_roles(
                    s,
                    acting_user,
                    vec![UserRole::ProductionManager],
                    RelatedEntityRef::ProdOrder(order_id),
                    TaskAction::QuantityMismatch,
                    format!(
                        "訂單 {} 實際產出 {} 與預期 {} 不符",
                        order.number, last.output_quantity, last.expected_quantity
                    ),
                );
            }

            order.status = ProdOrderStatus::Approved;
            tracing::info!(user = %acting_user, "訂單 {} 已核准入庫", order.number);
            s.orders.insert(order_id, order);
            Ok(())
        })
    }

    /// 增補材料備料：自倉庫搬 `quantity` 到工序所在站的迷你庫存
    ///
    /// 返回未滿足缺口（呼叫端可據此走建立供應訂單流程），不拋錯。
    pub fn add_material_available(
        store: &mut Store,
        order_id: Uuid,
        step_id: Uuid,
        product_id: Uuid,
        quantity: Decimal,
    ) -> Result<Decimal> {
        store.transaction(|s| {
            if quantity <= Decimal::ZERO {
                return Err(ErpError::InvalidQuantity);
            }
            let mut order = s
                .orders
                .get(&order_id)
                .cloned()
                .ok_or_else(|| ErpError::NotFound(format!("生產訂單 {order_id}")))?;
            let group = s
                .groups
                .get(&order.group_id)
                .cloned()
                .ok_or_else(|| ErpError::NotFound(format!("訂單群組 {}", order.group_id)))?;
            let step_idx = order
                .steps
                .iter()
                .position(|st| st.id == step_id)
                .ok_or_else(|| ErpError::NotFound(format!("工序 {step_id}")))?;
            let station_id = order.steps[step_idx].work_station_id;
            if order.steps[step_idx].material(product_id).is_none() {
                return Err(ErpError::NotFound(format!(
                    "材料明細 {}",
                    s.product_name(product_id)
                )));
            }

            let (moved, short) =
                Self::pull_from_warehouse(s, product_id, quantity, group.warehouse_id, station_id)?;
            if let Some(material) = order.steps[step_idx].material_mut(product_id) {
                material.available_quantity += moved;
            }
            s.orders.insert(order_id, order);
            Ok(short)
        })
    }

    /// 備料校正到精確值：雙向調節迷你庫存與倉庫的差額
    ///
    /// 目標高於現值時自倉庫補、低於現值時退回倉庫。返回未滿足缺口。
    pub fn update_materials_exact(
        store: &mut Store,
        order_id: Uuid,
        step_id: Uuid,
        product_id: Uuid,
        target: Decimal,
    ) -> Result<Decimal> {
        store.transaction(|s| {
            if target < Decimal::ZERO {
                return Err(ErpError::InvalidQuantity);
            }
            let mut order = s
                .orders
                .get(&order_id)
                .cloned()
                .ok_or_else(|| ErpError::NotFound(format!("生產訂單 {order_id}")))?;
            let group = s
                .groups
                .get(&order.group_id)
                .cloned()
                .ok_or_else(|| ErpError::NotFound(format!("訂單群組 {}", order.group_id)))?;
            let step_idx = order
                .steps
                .iter()
                .position(|st| st.id == step_id)
                .ok_or_else(|| ErpError::NotFound(format!("工序 {step_id}")))?;
            let station_id = order.steps[step_idx].work_station_id;
            let available = order
                .steps[step_idx]
                .material(product_id)
                .map(|m| m.available_quantity)
                .ok_or_else(|| {
                    ErpError::NotFound(format!("材料明細 {}", s.product_name(product_id)))
                })?;

            let short = if target > available {
                let delta = target - available;
                let (moved, short) = Self::pull_from_warehouse(
                    s,
                    product_id,
                    delta,
                    group.warehouse_id,
                    station_id,
                )?;
                if let Some(material) = order.steps[step_idx].material_mut(product_id) {
                    material.available_quantity += moved;
                }
                short
            } else if target < available {
                let back = available - target;
                let unit_cost = s
                    .mini_inventories
                    .get(&(product_id, station_id))
                    .map(|m| m.unit_cost)
                    .unwrap_or(Decimal::ZERO);
                let unmet =
                    StockRecorder::remove_mini_stock_force(s, product_id, station_id, back)?;
                let moved = back - unmet;
                if moved > Decimal::ZERO {
                    StockRecorder::add_stock(
                        s,
                        StockReceipt::new(product_id, group.warehouse_id, moved)
                            .with_cost((unit_cost * moved).round_dp(2))
                            .with_work_station(station_id),
                    )?;
                }
                if let Some(material) = order.steps[step_idx].material_mut(product_id) {
                    material.available_quantity -= moved;
                }
                Decimal::ZERO
            } else {
                Decimal::ZERO
            };

            s.orders.insert(order_id, order);
            Ok(short)
        })
    }

    /// 缺料阻塞後的顯式重新備料（供應訂單關閉後由呼叫端驅動）
    ///
    /// 只補當前工序仍缺的行；開工時現有迷你庫存已計入 available，
    /// 這裡只從倉庫補缺額避免重複計算。全數補齊時轉回 Processing，
    /// 仍有缺口則維持 Blocked 並冪等地重建供應訂單。
    pub fn resume(store: &mut Store, order_id: Uuid) -> Result<CategoryShortfalls> {
        store.transaction(|s| {
            let mut order = s
                .orders
                .get(&order_id)
                .cloned()
                .ok_or_else(|| ErpError::NotFound(format!("生產訂單 {order_id}")))?;
            if order.status != ProdOrderStatus::Blocked {
                return Ok(CategoryShortfalls::new());
            }
            let group = s
                .groups
                .get(&order.group_id)
                .cloned()
                .ok_or_else(|| ErpError::NotFound(format!("訂單群組 {}", order.group_id)))?;
            let current_id = order
                .current_step_id
                .ok_or_else(|| ErpError::Other("訂單沒有當前工序".to_string()))?;
            let step_idx = order
                .steps
                .iter()
                .position(|st| st.id == current_id)
                .ok_or_else(|| ErpError::NotFound(format!("工序 {current_id}")))?;
            let station_id = order.steps[step_idx].work_station_id;

            let mut remaining = CategoryShortfalls::new();
            for m_idx in 0..order.steps[step_idx].materials.len() {
                let (product_id, lack) = {
                    let material = &order.steps[step_idx].materials[m_idx];
                    (material.product_id, material.lacking_quantity())
                };
                if lack <= Decimal::ZERO {
                    continue;
                }
                let (moved, short) = Self::pull_from_warehouse(
                    s,
                    product_id,
                    lack,
                    group.warehouse_id,
                    station_id,
                )?;
                order.steps[step_idx].materials[m_idx].available_quantity += moved;
                if short > Decimal::ZERO {
                    let category_id = s.product_category(product_id)?;
                    remaining.add(category_id, product_id, short);
                }
            }

            if order.steps[step_idx].all_materials_satisfied() {
                order.status = ProdOrderStatus::Processing;
                tracing::info!("訂單 {} 缺料已解決，回到生產中", order.number);
            }
            s.orders.insert(order_id, order);

            if !remaining.is_empty() {
                SupplyEngine::store_for_prod_order(s, order_id, &remaining)?;
            }
            Ok(remaining)
        })
    }

    /// 開工備料：迷你庫存先計入，缺額由倉庫轉入；返回最終缺口
    fn stage_material(
        store: &mut Store,
        product_id: Uuid,
        required: Decimal,
        warehouse_id: Uuid,
        work_station_id: Uuid,
    ) -> Result<Decimal> {
        let mini_lack =
            StockRecorder::mini_stock_lack_qty(store, product_id, work_station_id, required);
        if mini_lack <= Decimal::ZERO {
            return Ok(Decimal::ZERO);
        }
        let (_, short) =
            Self::pull_from_warehouse(store, product_id, mini_lack, warehouse_id, work_station_id)?;
        Ok(short)
    }

    /// 倉庫 → 迷你庫存搬運；返回（實際搬量、未滿足缺口）
    fn pull_from_warehouse(
        store: &mut Store,
        product_id: Uuid,
        quantity: Decimal,
        warehouse_id: Uuid,
        work_station_id: Uuid,
    ) -> Result<(Decimal, Decimal)> {
        let unit_cost = store
            .inventories
            .get(&(product_id, warehouse_id))
            .map(|inv| inv.unit_cost)
            .unwrap_or(Decimal::ZERO);
        let short = StockRecorder::remove_stock(
            store,
            product_id,
            quantity,
            warehouse_id,
            Some(work_station_id),
            None,
        )?;
        let moved = quantity - short;
        if moved > Decimal::ZERO {
            StockRecorder::add_mini_stock(
                store,
                product_id,
                work_station_id,
                moved,
                Some((unit_cost * moved).round_dp(2)),
            )?;
        }
        Ok((moved, short))
    }
}
