//! 供應訂單引擎
//!
//! Created → InProgress → Delivered → Closed。關閉是唯一入庫點：
//! 所有守衛通過前不動任何庫存。

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use prodflow_core::{
    supply_order_number, DomainEvent, ErpError, RelatedEntityRef, Result, SupplyOrder,
    SupplyOrderProduct, SupplyOrderState, TaskAction, UserRole,
};
use prodflow_ledger::{StockReceipt, StockRecorder};
use prodflow_store::Store;

use crate::notify::Notifier;
use crate::CategoryShortfalls;

/// 供應訂單表單明細
#[derive(Debug, Clone)]
pub struct SupplyOrderFormLine {
    /// 產品ID
    pub product_id: Uuid,

    /// 訂購數量
    pub quantity: Decimal,

    /// 單價
    pub price: Decimal,
}

/// 手動建立供應訂單的表單
#[derive(Debug, Clone)]
pub struct SupplyOrderForm {
    /// 供應商
    pub supplier_id: Option<Uuid>,

    /// 入庫倉庫
    pub warehouse_id: Uuid,

    /// 產品分類
    pub category_id: Uuid,

    /// 關聯生產訂單
    pub prod_order_id: Option<Uuid>,

    /// 產品明細
    pub products: Vec<SupplyOrderFormLine>,
}

/// 供應訂單引擎
pub struct SupplyEngine;

impl SupplyEngine {
    /// 依表單建立供應訂單
    ///
    /// 校驗一次收齊所有問題再整批回報，不在第一個錯就中斷。
    pub fn create_order_by_form(
        store: &mut Store,
        form: SupplyOrderForm,
        acting_user: Uuid,
    ) -> Result<Uuid> {
        let mut problems: Vec<String> = Vec::new();

        if !store.warehouses.contains_key(&form.warehouse_id) {
            problems.push(format!("倉庫 {} 不存在", form.warehouse_id));
        }
        if !store.categories.contains_key(&form.category_id) {
            problems.push(format!("產品分類 {} 不存在", form.category_id));
        }
        if let Some(supplier_id) = form.supplier_id {
            match store.partners.get(&supplier_id) {
                Some(partner) if partner.is_supplier() => {}
                Some(_) => problems.push(format!("夥伴 {supplier_id} 不是供應商")),
                None => problems.push(format!("供應商 {supplier_id} 不存在")),
            }
        }
        if form.products.is_empty() {
            problems.push("至少需要一筆產品明細".to_string());
        }
        for line in &form.products {
            if !store.products.contains_key(&line.product_id) {
                problems.push(format!("產品 {} 不存在", line.product_id));
            }
            if line.quantity <= Decimal::ZERO {
                problems.push(format!(
                    "產品 {} 的訂購數量必須為正",
                    store.product_name(line.product_id)
                ));
            }
            if line.price < Decimal::ZERO {
                problems.push(format!(
                    "產品 {} 的單價不可為負",
                    store.product_name(line.product_id)
                ));
            }
        }
        if !problems.is_empty() {
            return Err(ErpError::ValidationFailed(problems));
        }

        let number = supply_order_number(Utc::now().date_naive(), store.next_supply_order_seq());
        let mut order = SupplyOrder::new(number, form.warehouse_id, form.category_id);
        order.supplier_id = form.supplier_id;
        order.prod_order_id = form.prod_order_id;
        for line in form.products {
            order
                .products
                .push(SupplyOrderProduct::new(line.product_id, line.quantity, line.price));
        }

        let order_id = order.id;
        tracing::info!(user = %acting_user, "建立供應訂單 {}", order.number);
        store.supply_orders.insert(order_id, order);
        Ok(order_id)
    }

    /// 指定供應商
    ///
    /// 訂單自 Created 轉入 InProgress（採購進行中）。已關閉的
    /// 訂單拒絕改派。
    pub fn assign_supplier(store: &mut Store, order_id: Uuid, supplier_id: Uuid) -> Result<()> {
        match store.partners.get(&supplier_id) {
            Some(partner) if partner.is_supplier() => {}
            Some(_) => {
                return Err(ErpError::ValidationFailed(vec![format!(
                    "夥伴 {supplier_id} 不是供應商"
                )]))
            }
            None => return Err(ErpError::NotFound(format!("供應商 {supplier_id}"))),
        }
        let order = store
            .supply_orders
            .get_mut(&order_id)
            .ok_or_else(|| ErpError::NotFound(format!("供應訂單 {order_id}")))?;
        if order.is_closed() {
            return Err(ErpError::AlreadyClosed);
        }
        order.supplier_id = Some(supplier_id);
        if order.state == SupplyOrderState::Created {
            order.state = SupplyOrderState::InProgress;
        }
        tracing::info!("供應訂單 {} 已指定供應商，進入採購", order.number);
        Ok(())
    }

    /// 為缺料阻塞的生產訂單按分類建立供應訂單
    ///
    /// 冪等：同一（生產訂單、分類）已有未關閉供應訂單時略過該
    /// 分類，重入不會重複開單。返回本次新建的訂單ID。
    pub fn store_for_prod_order(
        store: &mut Store,
        prod_order_id: Uuid,
        shortfalls: &CategoryShortfalls,
    ) -> Result<Vec<Uuid>> {
        let order = store
            .orders
            .get(&prod_order_id)
            .ok_or_else(|| ErpError::NotFound(format!("生產訂單 {prod_order_id}")))?;
        let group = store
            .groups
            .get(&order.group_id)
            .ok_or_else(|| ErpError::NotFound(format!("訂單群組 {}", order.group_id)))?;
        let warehouse_id = group.warehouse_id;

        let mut created = Vec::new();
        for (&category_id, shortfall_list) in &shortfalls.by_category {
            let already_open = store.supply_orders.values().any(|so| {
                so.prod_order_id == Some(prod_order_id)
                    && so.category_id == category_id
                    && !so.is_closed()
            });
            if already_open {
                tracing::debug!("分類 {} 已有未關閉的供應訂單，略過", category_id);
                continue;
            }

            let number =
                supply_order_number(Utc::now().date_naive(), store.next_supply_order_seq());
            let mut supply = SupplyOrder::new(number, warehouse_id, category_id)
                .with_prod_order(prod_order_id)
                .with_status("AwaitingWarehouseApproval");
            for shortfall in shortfall_list {
                supply.products.push(SupplyOrderProduct::new(
                    shortfall.product_id,
                    shortfall.quantity,
                    Decimal::ZERO,
                ));
            }

            tracing::info!(
                "生產訂單 {} 缺料，建立供應訂單 {}（{} 筆明細）",
                prod_order_id,
                supply.number,
                supply.products.len()
            );
            created.push(supply.id);
            store.supply_orders.insert(supply.id, supply);
        }
        Ok(created)
    }

    /// 到貨核對
    ///
    /// 寫入各明細實際到貨數量；全數相符直接走關閉入庫，任一
    /// 不符則停在 Delivered 並通知供應管理員裁決。整個核對在
    /// 單一交易內，關閉守衛失敗時到貨數量也一併回滾。
    pub fn compare_products(
        store: &mut Store,
        order_id: Uuid,
        actuals: &[(Uuid, Decimal)],
        acting_user: Uuid,
    ) -> Result<()> {
        store.transaction(|s| {
            let mut order = s
                .supply_orders
                .get(&order_id)
                .cloned()
                .ok_or_else(|| ErpError::NotFound(format!("供應訂單 {order_id}")))?;
            if order.is_closed() {
                return Err(ErpError::AlreadyClosed);
            }

            for &(product_id, actual) in actuals {
                let line = order.product_mut(product_id).ok_or_else(|| {
                    ErpError::NotFound(format!("供應訂單明細 {}", s.product_name(product_id)))
                })?;
                line.actual_quantity = actual;
            }

            if order.all_matched() {
                s.supply_orders.insert(order_id, order);
                return Self::close_order_locked(s, order_id, acting_user);
            }

            order.state = SupplyOrderState::Delivered;
            order.status = Some("AwaitingSupplierApproval".to_string());
            tracing::info!("供應訂單 {} 到貨數量不符，待供應管理員裁決", order.number);
            s.supply_orders.insert(order_id, order);

            Notifier::notify_roles(
                s,
                acting_user,
                vec![UserRole::SupplyManager],
                RelatedEntityRef::SupplyOrder(order_id),
                TaskAction::QuantityMismatch,
                "供應訂單到貨數量與預期不符，請裁決",
            );
            Ok(())
        })
    }

    /// 關閉供應訂單（入庫）
    pub fn close_order(store: &mut Store, order_id: Uuid, acting_user: Uuid) -> Result<()> {
        store.transaction(|s| Self::close_order_locked(s, order_id, acting_user))
    }

    /// 關閉本體：守衛全過才動庫存
    ///
    /// 守衛順序固定：已關閉 → 無供應商 → 無明細 → 實到為零。
    fn close_order_locked(store: &mut Store, order_id: Uuid, acting_user: Uuid) -> Result<()> {
        let mut order = store
            .supply_orders
            .get(&order_id)
            .cloned()
            .ok_or_else(|| ErpError::NotFound(format!("供應訂單 {order_id}")))?;

        if order.is_closed() {
            return Err(ErpError::AlreadyClosed);
        }
        let supplier_id = order.supplier_id.ok_or(ErpError::NoSupplier)?;
        if order.products.is_empty() {
            return Err(ErpError::NoProducts);
        }
        for line in &order.products {
            if line.actual_quantity <= Decimal::ZERO {
                return Err(ErpError::ZeroActualQuantity(
                    store.product_name(line.product_id),
                ));
            }
        }

        for line in &order.products {
            StockRecorder::add_stock(
                store,
                StockReceipt::new(line.product_id, order.warehouse_id, line.actual_quantity)
                    .with_cost((line.price * line.actual_quantity).round_dp(2))
                    .with_supplier(supplier_id),
            )?;
        }

        order.state = SupplyOrderState::Closed;
        order.closed_at = Some(Utc::now());
        order.closed_by = Some(acting_user);
        tracing::info!(user = %acting_user, "供應訂單 {} 已關閉入庫", order.number);

        let prod_order_id = order.prod_order_id;
        store.supply_orders.insert(order_id, order);
        store.events.push(DomainEvent::SupplyOrderClosed {
            supply_order_id: order_id,
            prod_order_id,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prodflow_core::{
        MeasureUnit, Partner, PartnerType, Product, ProductCategory, ProductType, Warehouse,
    };

    struct Fixture {
        store: Store,
        product_id: Uuid,
        category_id: Uuid,
        warehouse_id: Uuid,
        supplier_id: Uuid,
        user: Uuid,
    }

    fn fixture() -> Fixture {
        let mut store = Store::new();
        let category_id = store.add_category(ProductCategory::new("原料", MeasureUnit::Piece));
        let product_id = store.add_product(Product::new(
            "原料A",
            "RM-A",
            ProductType::RawMaterial,
            category_id,
        ));
        let warehouse_id = store.add_warehouse(Warehouse::new("主倉", "WH1"));
        let supplier_id = store.add_partner(Partner::new("供應商甲", "SUP-A", PartnerType::Supplier));
        Fixture {
            store,
            product_id,
            category_id,
            warehouse_id,
            supplier_id,
            user: Uuid::new_v4(),
        }
    }

    fn form(fx: &Fixture, quantity: Decimal, price: Decimal) -> SupplyOrderForm {
        SupplyOrderForm {
            supplier_id: Some(fx.supplier_id),
            warehouse_id: fx.warehouse_id,
            category_id: fx.category_id,
            prod_order_id: None,
            products: vec![SupplyOrderFormLine {
                product_id: fx.product_id,
                quantity,
                price,
            }],
        }
    }

    #[test]
    fn test_create_order_by_form() {
        let mut fx = fixture();
        let supply_form = form(&fx, Decimal::from(10), Decimal::from(3));
        let order_id =
            SupplyEngine::create_order_by_form(&mut fx.store, supply_form, fx.user).unwrap();

        let order = &fx.store.supply_orders[&order_id];
        assert_eq!(order.state, SupplyOrderState::Created);
        assert!(order.number.starts_with("SO-"));
        assert_eq!(order.products[0].expected_quantity, Decimal::from(10));
        assert_eq!(order.products[0].actual_quantity, Decimal::ZERO);
    }

    #[test]
    fn test_create_order_collects_all_validation_problems() {
        let mut fx = fixture();
        let bad = SupplyOrderForm {
            supplier_id: Some(Uuid::new_v4()),
            warehouse_id: Uuid::new_v4(),
            category_id: fx.category_id,
            prod_order_id: None,
            products: vec![SupplyOrderFormLine {
                product_id: fx.product_id,
                quantity: Decimal::ZERO,
                price: Decimal::from(-1),
            }],
        };

        let err = SupplyEngine::create_order_by_form(&mut fx.store, bad, fx.user).unwrap_err();
        match err {
            // 倉庫、供應商、數量、單價四個問題一次收齊
            ErpError::ValidationFailed(problems) => assert_eq!(problems.len(), 4),
            other => panic!("預期 ValidationFailed，得到 {other:?}"),
        }
        assert!(fx.store.supply_orders.is_empty());
    }

    #[test]
    fn test_close_guard_order() {
        let mut fx = fixture();

        // 無供應商
        let mut no_supplier = form(&fx, Decimal::from(10), Decimal::ONE);
        no_supplier.supplier_id = None;
        let id =
            SupplyEngine::create_order_by_form(&mut fx.store, no_supplier, fx.user).unwrap();
        assert!(matches!(
            SupplyEngine::close_order(&mut fx.store, id, fx.user),
            Err(ErpError::NoSupplier)
        ));

        // 無明細（表單強制至少一行，直接組裝訂單）
        let empty = SupplyOrder::new("SO-EMPTY", fx.warehouse_id, fx.category_id)
            .with_supplier(fx.supplier_id);
        let empty_id = empty.id;
        fx.store.supply_orders.insert(empty_id, empty);
        assert!(matches!(
            SupplyEngine::close_order(&mut fx.store, empty_id, fx.user),
            Err(ErpError::NoProducts)
        ));

        // 實到為零
        let supply_form = form(&fx, Decimal::from(10), Decimal::ONE);
        let id =
            SupplyEngine::create_order_by_form(&mut fx.store, supply_form, fx.user).unwrap();
        assert!(matches!(
            SupplyEngine::close_order(&mut fx.store, id, fx.user),
            Err(ErpError::ZeroActualQuantity(_))
        ));
        // 守衛失敗：不動庫存
        assert!(fx.store.inventories.is_empty());
    }

    #[test]
    fn test_no_supplier_guard_wins_over_no_products() {
        let mut fx = fixture();

        // 既無供應商也無明細：供應商守衛先報
        let bare = SupplyOrder::new("SO-BARE", fx.warehouse_id, fx.category_id);
        let bare_id = bare.id;
        fx.store.supply_orders.insert(bare_id, bare);
        assert!(matches!(
            SupplyEngine::close_order(&mut fx.store, bare_id, fx.user),
            Err(ErpError::NoSupplier)
        ));
    }

    #[test]
    fn test_assign_supplier_moves_to_in_progress() {
        let mut fx = fixture();
        let mut supply_form = form(&fx, Decimal::from(10), Decimal::ONE);
        supply_form.supplier_id = None;
        let id =
            SupplyEngine::create_order_by_form(&mut fx.store, supply_form, fx.user).unwrap();
        assert_eq!(fx.store.supply_orders[&id].state, SupplyOrderState::Created);

        SupplyEngine::assign_supplier(&mut fx.store, id, fx.supplier_id).unwrap();
        let order = &fx.store.supply_orders[&id];
        assert_eq!(order.supplier_id, Some(fx.supplier_id));
        assert_eq!(order.state, SupplyOrderState::InProgress);

        // 非供應商夥伴不可指派
        let agent = fx
            .store
            .add_partner(Partner::new("代理乙", "AG-B", PartnerType::Agent));
        assert!(matches!(
            SupplyEngine::assign_supplier(&mut fx.store, id, agent),
            Err(ErpError::ValidationFailed(_))
        ));
    }

    #[test]
    fn test_close_books_stock_and_emits_event() {
        let mut fx = fixture();
        let supply_form = form(&fx, Decimal::from(10), Decimal::from(3));
        let id =
            SupplyEngine::create_order_by_form(&mut fx.store, supply_form, fx.user).unwrap();
        fx.store
            .supply_orders
            .get_mut(&id)
            .unwrap()
            .product_mut(fx.product_id)
            .unwrap()
            .actual_quantity = Decimal::from(10);

        SupplyEngine::close_order(&mut fx.store, id, fx.user).unwrap();

        let order = &fx.store.supply_orders[&id];
        assert_eq!(order.state, SupplyOrderState::Closed);
        assert!(order.is_closed());
        assert_eq!(order.closed_by, Some(fx.user));

        // 10 件 @3 入庫，記供應商入庫異動
        let inventory = &fx.store.inventories[&(fx.product_id, fx.warehouse_id)];
        assert_eq!(inventory.quantity(), Decimal::from(10));
        assert_eq!(inventory.unit_cost, Decimal::from(3));
        assert_eq!(fx.store.transactions.len(), 1);
        assert_eq!(fx.store.transactions[0].supplier_id, Some(fx.supplier_id));

        let events = fx.store.drain_events();
        assert!(matches!(
            events[0],
            DomainEvent::SupplyOrderClosed { supply_order_id, .. } if supply_order_id == id
        ));
    }

    #[test]
    fn test_close_twice_rejected() {
        let mut fx = fixture();
        let supply_form = form(&fx, Decimal::from(10), Decimal::ONE);
        let id =
            SupplyEngine::create_order_by_form(&mut fx.store, supply_form, fx.user).unwrap();
        fx.store
            .supply_orders
            .get_mut(&id)
            .unwrap()
            .product_mut(fx.product_id)
            .unwrap()
            .actual_quantity = Decimal::from(10);

        SupplyEngine::close_order(&mut fx.store, id, fx.user).unwrap();
        assert!(matches!(
            SupplyEngine::close_order(&mut fx.store, id, fx.user),
            Err(ErpError::AlreadyClosed)
        ));
        // 不重複入庫
        assert_eq!(
            fx.store.inventories[&(fx.product_id, fx.warehouse_id)].quantity(),
            Decimal::from(10)
        );
    }

    #[test]
    fn test_compare_products_matched_closes() {
        let mut fx = fixture();
        let supply_form = form(&fx, Decimal::from(10), Decimal::from(2));
        let id =
            SupplyEngine::create_order_by_form(&mut fx.store, supply_form, fx.user).unwrap();

        SupplyEngine::compare_products(
            &mut fx.store,
            id,
            &[(fx.product_id, Decimal::from(10))],
            fx.user,
        )
        .unwrap();

        assert_eq!(
            fx.store.supply_orders[&id].state,
            SupplyOrderState::Closed
        );
        assert_eq!(
            fx.store.inventories[&(fx.product_id, fx.warehouse_id)].quantity(),
            Decimal::from(10)
        );
        // 全數相符不產生任務
        assert!(fx.store.tasks.is_empty());
    }

    #[test]
    fn test_compare_products_mismatch_notifies_supply_manager() {
        let mut fx = fixture();
        let supply_form = form(&fx, Decimal::from(10), Decimal::from(2));
        let id =
            SupplyEngine::create_order_by_form(&mut fx.store, supply_form, fx.user).unwrap();

        SupplyEngine::compare_products(
            &mut fx.store,
            id,
            &[(fx.product_id, Decimal::from(8))],
            fx.user,
        )
        .unwrap();

        let order = &fx.store.supply_orders[&id];
        assert_eq!(order.state, SupplyOrderState::Delivered);
        assert_eq!(order.status.as_deref(), Some("AwaitingSupplierApproval"));
        assert_eq!(order.products[0].actual_quantity, Decimal::from(8));
        // 不符：不入庫，恰好一張任務
        assert!(fx.store.inventories.is_empty());
        assert_eq!(fx.store.tasks.len(), 1);
        assert!(fx.store.tasks[0].is_for_role(UserRole::SupplyManager));
    }

    #[test]
    fn test_store_for_prod_order_is_idempotent() {
        let mut fx = fixture();
        let group_id = fx.store.add_group(prodflow_core::ProdOrderGroup::new(
            prodflow_core::GroupType::ByCatalog,
            fx.warehouse_id,
        ));
        let prod_order_id = fx.store.add_order(prodflow_core::ProdOrder::new(
            "PO-T1",
            group_id,
            fx.product_id,
            Decimal::ONE,
        ));

        let mut shortfalls = CategoryShortfalls::new();
        shortfalls.add(fx.category_id, fx.product_id, Decimal::from(12));

        let created =
            SupplyEngine::store_for_prod_order(&mut fx.store, prod_order_id, &shortfalls).unwrap();
        assert_eq!(created.len(), 1);

        // 重入：同分類已有未關閉訂單，不再開單
        let created_again =
            SupplyEngine::store_for_prod_order(&mut fx.store, prod_order_id, &shortfalls).unwrap();
        assert!(created_again.is_empty());
        assert_eq!(fx.store.supply_orders.len(), 1);
    }
}
