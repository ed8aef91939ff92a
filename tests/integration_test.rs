//! 集成測試：從備料到核准入庫的完整生產週期

use chrono::{NaiveDate, Utc};
use prodflow::core::prod_order_number;
use prodflow::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

struct Plant {
    store: Store,
    raw_id: Uuid,
    semi_id: Uuid,
    finished_id: Uuid,
    raw_category_id: Uuid,
    warehouse_id: Uuid,
    station_a: Uuid,
    station_b: Uuid,
    supplier_id: Uuid,
    user: Uuid,
}

/// 兩道工序的工廠：
/// 工序1（站A）：4 件原料 → 1 件半成品；工序2（站B）：1 件半成品 → 1 件成品
fn plant() -> Plant {
    let mut store = Store::new();

    let raw_category_id = store.add_category(ProductCategory::new("原料", MeasureUnit::Piece));
    let semi_category_id = store.add_category(ProductCategory::new("半成品", MeasureUnit::Piece));
    let raw_id = store.add_product(Product::new(
        "原料A",
        "RM-A",
        ProductType::RawMaterial,
        raw_category_id,
    ));
    let semi_id = store.add_product(Product::new(
        "半成品S",
        "SF-S",
        ProductType::SemiFinished,
        semi_category_id,
    ));
    let finished_id = store.add_product(Product::new(
        "成品X",
        "FP-X",
        ProductType::ReadyProduct,
        semi_category_id,
    ));

    let warehouse_id = store.add_warehouse(Warehouse::new("主倉", "WH1"));
    let station_a = store.add_work_station(WorkStation::new("加工站").with_performance(
        Decimal::from(10),
        Decimal::ONE,
        DurationUnit::Day,
    ));
    let station_b = store.add_work_station(WorkStation::new("組裝站").with_performance(
        Decimal::from(5),
        Decimal::ONE,
        DurationUnit::Day,
    ));
    let supplier_id = store.add_partner(Partner::new("供應商甲", "SUP-A", PartnerType::Supplier));

    let template = ProdTemplate::new(finished_id)
        .with_step(
            ProdTemplateStep::new(1, station_a, semi_id, Decimal::ONE, MeasureUnit::Piece)
                .with_material(raw_id, Decimal::from(4)),
        )
        .with_step(
            ProdTemplateStep::new(2, station_b, finished_id, Decimal::ONE, MeasureUnit::Piece)
                .with_material(semi_id, Decimal::ONE),
        );
    store.add_template(template);

    Plant {
        store,
        raw_id,
        semi_id,
        finished_id,
        raw_category_id,
        warehouse_id,
        station_a,
        station_b,
        supplier_id,
        user: Uuid::new_v4(),
    }
}

fn confirmed_order(plant: &mut Plant, quantity: Decimal) -> Uuid {
    let agent_id = plant
        .store
        .add_partner(Partner::new("代理乙", "AG1", PartnerType::Agent));
    let group_id = plant.store.add_group(
        ProdOrderGroup::new(GroupType::ByOrder, plant.warehouse_id)
            .with_agent(agent_id)
            .with_deadline(NaiveDate::from_ymd_opt(2026, 9, 30).unwrap()),
    );
    let number = prod_order_number("AG1", "FP-X", Utc::now().date_naive());
    let mut order = ProdOrder::new(number, group_id, plant.finished_id, quantity)
        .with_offer_price(Decimal::from(500));
    order.confirm(plant.user);
    plant.store.add_order(order)
}

#[test]
fn test_full_production_cycle_with_sufficient_stock() {
    let mut plant = plant();
    let order_id = confirmed_order(&mut plant, Decimal::from(3));

    // 原料 12 件 @ 總成本 120 入庫
    StockRecorder::add_stock(
        &mut plant.store,
        StockReceipt::new(plant.raw_id, plant.warehouse_id, Decimal::from(12))
            .with_cost(Decimal::from(120)),
    )
    .unwrap();

    // 開工：原料已搬到站A，訂單生產中
    ProductionEngine::start(&mut plant.store, order_id, plant.user).unwrap();
    {
        let order = &plant.store.orders[&order_id];
        assert_eq!(order.status, ProdOrderStatus::Processing);
        assert_eq!(order.steps.len(), 2);
        assert_eq!(
            order.steps[0].materials[0].available_quantity,
            Decimal::from(12)
        );
        // 交期：工序1 需 3/10 天、工序2 需 3/5 天，各自進位 1 天
        assert_eq!(order.deadline_days, 2);
    }
    assert_eq!(
        plant.store.mini_inventories[&(plant.raw_id, plant.station_a)].quantity,
        Decimal::from(12)
    );

    // 工序1 完工：投料 12 原料，產出 3 半成品（成本 120 → 單位 40）
    let step1_id = plant.store.orders[&order_id].steps[0].id;
    ProductionEngine::complete_work(
        &mut plant.store,
        order_id,
        step1_id,
        Decimal::from(3),
        plant.user,
    )
    .unwrap();
    let semi_mini = &plant.store.mini_inventories[&(plant.semi_id, plant.station_a)];
    assert_eq!(semi_mini.quantity, Decimal::from(3));
    assert_eq!(semi_mini.unit_cost, Decimal::from(40));

    // 推進：半成品自站A搬到站B
    ProductionEngine::next_step(&mut plant.store, order_id).unwrap();
    {
        let order = &plant.store.orders[&order_id];
        assert_eq!(order.steps[1].status, StepStatus::InProgress);
        let material = order.steps[1].material(plant.semi_id).unwrap();
        assert_eq!(material.available_quantity, Decimal::from(3));
        assert_eq!(material.status, MaterialStatus::Actual);
    }
    assert_eq!(
        plant.store.mini_inventories[&(plant.semi_id, plant.station_a)].quantity,
        Decimal::ZERO
    );
    assert_eq!(
        plant.store.mini_inventories[&(plant.semi_id, plant.station_b)].quantity,
        Decimal::from(3)
    );

    // 工序2 完工 + 推進：無下一道工序，訂單完工
    let step2_id = plant.store.orders[&order_id].steps[1].id;
    ProductionEngine::complete_work(
        &mut plant.store,
        order_id,
        step2_id,
        Decimal::from(3),
        plant.user,
    )
    .unwrap();
    ProductionEngine::next_step(&mut plant.store, order_id).unwrap();
    assert_eq!(
        plant.store.orders[&order_id].status,
        ProdOrderStatus::Completed
    );

    // 核准：成品入倉庫，成本沿途滾動不失真（120 → 單位 40）
    ProductionEngine::approve(&mut plant.store, order_id, plant.user).unwrap();
    assert_eq!(
        plant.store.orders[&order_id].status,
        ProdOrderStatus::Approved
    );
    let finished = &plant.store.inventories[&(plant.finished_id, plant.warehouse_id)];
    assert_eq!(finished.quantity(), Decimal::from(3));
    assert_eq!(finished.unit_cost, Decimal::from(40));

    // 產出與預期相符：不產生任務
    assert!(plant.store.tasks.is_empty());
}

#[test]
fn test_blocked_cycle_through_supply_and_resume() {
    let mut plant = plant();
    let order_id = confirmed_order(&mut plant, Decimal::from(3));

    // 空倉開工：阻塞並自動開供應訂單（原料分類，預期 12）
    ProductionEngine::start(&mut plant.store, order_id, plant.user).unwrap();
    assert_eq!(
        plant.store.orders[&order_id].status,
        ProdOrderStatus::Blocked
    );
    assert_eq!(plant.store.supply_orders.len(), 1);
    let supply_id = *plant.store.supply_orders.keys().next().unwrap();
    {
        let supply = &plant.store.supply_orders[&supply_id];
        assert_eq!(supply.category_id, plant.raw_category_id);
        assert_eq!(supply.products[0].expected_quantity, Decimal::from(12));
    }

    // 指定供應商（進入採購）與單價，到貨核對全數相符 → 自動關閉入庫
    SupplyEngine::assign_supplier(&mut plant.store, supply_id, plant.supplier_id).unwrap();
    assert_eq!(
        plant.store.supply_orders[&supply_id].state,
        SupplyOrderState::InProgress
    );
    plant
        .store
        .supply_orders
        .get_mut(&supply_id)
        .unwrap()
        .products[0]
        .price = Decimal::from(10);
    SupplyEngine::compare_products(
        &mut plant.store,
        supply_id,
        &[(plant.raw_id, Decimal::from(12))],
        plant.user,
    )
    .unwrap();
    assert_eq!(
        plant.store.supply_orders[&supply_id].state,
        SupplyOrderState::Closed
    );
    assert_eq!(
        plant.store.inventories[&(plant.raw_id, plant.warehouse_id)].quantity(),
        Decimal::from(12)
    );

    // 關閉事件驅動顯式重新備料 → 回到生產中
    let events = plant.store.drain_events();
    assert!(matches!(
        events[0],
        DomainEvent::SupplyOrderClosed { prod_order_id: Some(p), .. } if p == order_id
    ));
    let remaining = ProductionEngine::resume(&mut plant.store, order_id).unwrap();
    assert!(remaining.is_empty());
    assert_eq!(
        plant.store.orders[&order_id].status,
        ProdOrderStatus::Processing
    );
    assert_eq!(
        plant.store.orders[&order_id].steps[0].materials[0].available_quantity,
        Decimal::from(12)
    );
}

#[test]
fn test_approve_with_quantity_mismatch_raises_task() {
    let mut plant = plant();
    let order_id = confirmed_order(&mut plant, Decimal::from(3));
    StockRecorder::add_stock(
        &mut plant.store,
        StockReceipt::new(plant.raw_id, plant.warehouse_id, Decimal::from(12))
            .with_cost(Decimal::from(120)),
    )
    .unwrap();

    ProductionEngine::start(&mut plant.store, order_id, plant.user).unwrap();
    let step1_id = plant.store.orders[&order_id].steps[0].id;
    ProductionEngine::complete_work(
        &mut plant.store,
        order_id,
        step1_id,
        Decimal::from(3),
        plant.user,
    )
    .unwrap();
    ProductionEngine::next_step(&mut plant.store, order_id).unwrap();

    // 工序2 報損：只產出 2 件（預期 3）
    let step2_id = plant.store.orders[&order_id].steps[1].id;
    ProductionEngine::complete_work(
        &mut plant.store,
        order_id,
        step2_id,
        Decimal::from(2),
        plant.user,
    )
    .unwrap();
    ProductionEngine::next_step(&mut plant.store, order_id).unwrap();
    ProductionEngine::approve(&mut plant.store, order_id, plant.user).unwrap();

    // 以實際產出 2 件入庫，並通知生產管理員
    assert_eq!(
        plant.store.inventories[&(plant.finished_id, plant.warehouse_id)].quantity(),
        Decimal::from(2)
    );
    assert_eq!(plant.store.tasks.len(), 1);
    assert!(plant.store.tasks[0].is_for_role(UserRole::ProductionManager));
}

#[test]
fn test_transaction_log_tracks_every_warehouse_movement() {
    let mut plant = plant();
    let order_id = confirmed_order(&mut plant, Decimal::from(3));
    StockRecorder::add_stock(
        &mut plant.store,
        StockReceipt::new(plant.raw_id, plant.warehouse_id, Decimal::from(12))
            .with_cost(Decimal::from(120)),
    )
    .unwrap();
    ProductionEngine::start(&mut plant.store, order_id, plant.user).unwrap();

    // 一筆入庫 + 一筆開工出庫（搬往站A）
    assert_eq!(plant.store.transactions.len(), 2);
    let out = &plant.store.transactions[1];
    assert_eq!(out.transaction_type, TransactionType::Out);
    assert_eq!(out.quantity, Decimal::from(12));
    assert_eq!(out.work_station_id, Some(plant.station_a));
    assert_eq!(out.cost, Decimal::from(120));

    // 迷你庫存內部流轉不記倉庫異動
    let step1_id = plant.store.orders[&order_id].steps[0].id;
    ProductionEngine::complete_work(
        &mut plant.store,
        order_id,
        step1_id,
        Decimal::from(3),
        plant.user,
    )
    .unwrap();
    ProductionEngine::next_step(&mut plant.store, order_id).unwrap();
    assert_eq!(plant.store.transactions.len(), 2);

    // 核准入庫再記一筆
    let step2_id = plant.store.orders[&order_id].steps[1].id;
    ProductionEngine::complete_work(
        &mut plant.store,
        order_id,
        step2_id,
        Decimal::from(3),
        plant.user,
    )
    .unwrap();
    ProductionEngine::next_step(&mut plant.store, order_id).unwrap();
    ProductionEngine::approve(&mut plant.store, order_id, plant.user).unwrap();
    assert_eq!(plant.store.transactions.len(), 3);
    assert_eq!(
        plant.store.transactions[2].transaction_type,
        TransactionType::In
    );
}

#[test]
fn test_shared_store_serializes_engine_calls() {
    let plant = plant();
    let shared = SharedStore::new(plant.store);

    let quantity = shared
        .with(|store| {
            Ok(StockRecorder::stock_lack_qty(
                store,
                plant.raw_id,
                Decimal::from(5),
                plant.warehouse_id,
                None,
            ))
        })
        .unwrap();
    assert_eq!(quantity, Decimal::from(5));

    // 持鎖期間重入 → 並發衝突
    let err = shared.with(|_| shared.with(|_| Ok(()))).unwrap_err();
    assert!(matches!(err, ErpError::ConcurrencyConflict));
}
