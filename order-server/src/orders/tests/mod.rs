use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use shared::models::{DiningTable, Discount, DiscountKind, DiscountScope, MenuItem, Restaurant};
use shared::order::{
    CartLineInput, CommandErrorCode, CreateOrderRequest, LiveMessage, OrderStatus,
    PreviewOrderRequest,
};
use tokio::sync::broadcast::error::TryRecvError;

use super::*;
use crate::dashboard::DashboardCache;
use crate::live::LiveOrderHub;
use crate::repo::{MemoryStore, OrderRepository, Repositories};

struct Fixture {
    store: Arc<MemoryStore>,
    service: OrderService,
    hub: LiveOrderHub,
}

fn menu_item(id: &str, restaurant_id: &str, price: Decimal, category: &str) -> MenuItem {
    MenuItem {
        id: id.into(),
        restaurant_id: restaurant_id.into(),
        name: format!("Item {id}"),
        price,
        category: Some(category.into()),
        available: true,
    }
}

fn fixture() -> Fixture {
    let store = Arc::new(MemoryStore::new());

    store.upsert_restaurant(Restaurant {
        id: "r1".into(),
        name: "Trattoria".into(),
        commission_rate: Some(dec!(0.10)),
    });
    store.upsert_restaurant(Restaurant {
        id: "r2".into(),
        name: "Burger Bar".into(),
        commission_rate: None,
    });

    for (id, restaurant_id, active) in [("t1", "r1", true), ("t-off", "r1", false), ("t2", "r2", true)] {
        store.upsert_table(DiningTable {
            id: id.into(),
            restaurant_id: restaurant_id.into(),
            name: format!("Table {id}"),
            is_active: active,
        });
    }

    store.upsert_menu_item(menu_item("pizza", "r1", dec!(50.00), "Mains"));
    store.upsert_menu_item(menu_item("pasta", "r1", dec!(30.00), "Mains"));
    store.upsert_menu_item(menu_item("cola", "r1", dec!(20.00), "Drinks"));
    store.upsert_menu_item(menu_item("soup", "r1", dec!(7.50), "Starters"));
    store.set_item_available("soup", false);
    store.upsert_menu_item(menu_item("burger", "r2", dec!(12.00), "Mains"));

    let hub = LiveOrderHub::new(16);
    let service = OrderService::new(
        Repositories::from_store(store.clone()),
        hub.clone(),
        DashboardCache::new(),
        OrderSettings::default(),
    );

    Fixture {
        store,
        service,
        hub,
    }
}

fn discount(id: &str, kind: DiscountKind, value: Decimal, scope: DiscountScope) -> Discount {
    Discount {
        id: id.into(),
        restaurant_id: "r1".into(),
        name: id.into(),
        kind,
        value,
        scope,
        start_time: None,
        end_time: None,
        is_active: true,
    }
}

fn create_req(table_id: &str, items: &[(&str, i64)]) -> CreateOrderRequest {
    CreateOrderRequest {
        table_id: table_id.into(),
        items: items
            .iter()
            .map(|(id, qty)| CartLineInput::new(*id, *qty))
            .collect(),
        customer_name: None,
        notes: None,
    }
}

async fn place(f: &Fixture, items: &[(&str, i64)]) -> String {
    f.service
        .create_order(create_req("t1", items))
        .await
        .expect("order should be created")
}

// ========================================================================
// Scenarios
// ========================================================================

#[tokio::test]
async fn test_scenario_percentage_on_whole_order() {
    let f = fixture();
    f.store.upsert_discount(&discount(
        "ten-off",
        DiscountKind::Percentage,
        dec!(10),
        DiscountScope::All,
    ));

    let id = place(&f, &[("pizza", 2)]).await;
    let order = f.service.get_order("r1", &id).await.unwrap();

    assert_eq!(order.subtotal, dec!(100.00));
    assert_eq!(order.discount_amount, dec!(10.00));
    assert_eq!(order.total, dec!(90.00));
    assert_eq!(order.applied_discount_id.as_deref(), Some("ten-off"));
    assert_eq!(order.commission_rate, dec!(0.10));
    assert_eq!(order.commission_amount, dec!(9.00));
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.table_name, "Table t1");
}

#[tokio::test]
async fn test_scenario_fixed_category_discount() {
    let f = fixture();
    f.store.upsert_discount(&discount(
        "drinks-5",
        DiscountKind::Fixed,
        dec!(5),
        DiscountScope::Category {
            category_id: "Drinks".into(),
        },
    ));

    let id = place(&f, &[("cola", 1), ("pasta", 1)]).await;
    let order = f.service.get_order("r1", &id).await.unwrap();

    assert_eq!(order.subtotal, dec!(50.00));
    assert_eq!(order.discount_amount, dec!(5.00));
    assert_eq!(order.total, dec!(45.00));
}

#[tokio::test]
async fn test_scenario_unknown_item_persists_nothing() {
    let f = fixture();
    let err = f
        .service
        .create_order(create_req("t1", &[("pizza", 1), ("ghost", 2)]))
        .await
        .unwrap_err();

    assert!(matches!(&err, OrderError::ItemsNotFound(ids) if ids == &vec!["ghost".to_string()]));
    assert_eq!(f.store.order_count(), 0);
}

#[tokio::test]
async fn test_scenario_back_then_cancel() {
    let f = fixture();
    let id = place(&f, &[("pizza", 1)]).await;

    let order = f
        .service
        .update_order_status("r1", &id, OrderStatus::Preparing)
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Preparing);

    let order = f
        .service
        .update_order_status("r1", &id, OrderStatus::Pending)
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Pending);

    let order = f.service.cancel_order("r1", &id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Cancelled);
}

#[tokio::test]
async fn test_scenario_cancel_completed_rejected() {
    let f = fixture();
    let id = place(&f, &[("pizza", 1)]).await;
    f.service
        .update_order_status("r1", &id, OrderStatus::Preparing)
        .await
        .unwrap();
    f.service
        .update_order_status("r1", &id, OrderStatus::Completed)
        .await
        .unwrap();

    let err = f.service.cancel_order("r1", &id).await.unwrap_err();
    assert!(matches!(
        err,
        OrderError::InvalidTransition {
            from: OrderStatus::Completed,
            to: OrderStatus::Cancelled
        }
    ));
    let order = f.service.get_order("r1", &id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Completed);
}

// ========================================================================
// Price integrity and availability
// ========================================================================

#[tokio::test]
async fn test_client_price_and_name_ignored() {
    let f = fixture();
    let mut line = CartLineInput::new("pizza", 1);
    line.name = Some("Free pizza".into());
    line.price = Some(dec!(1));
    let req = CreateOrderRequest {
        table_id: "t1".into(),
        items: vec![line],
        customer_name: None,
        notes: None,
    };

    let id = f.service.create_order(req).await.unwrap();
    let order = f.service.get_order("r1", &id).await.unwrap();
    assert_eq!(order.items[0].price, dec!(50.00));
    assert_eq!(order.items[0].name, "Item pizza");
    assert_eq!(order.items[0].category.as_deref(), Some("Mains"));
    assert_eq!(order.total, dec!(50.00));
}

#[tokio::test]
async fn test_unavailable_item_rejected() {
    let f = fixture();
    let err = f
        .service
        .create_order(create_req("t1", &[("pizza", 1), ("soup", 1)]))
        .await
        .unwrap_err();

    assert!(matches!(&err, OrderError::ItemsUnavailable(ids) if ids == &vec!["soup".to_string()]));
    assert_eq!(err.command_code(), CommandErrorCode::ItemsUnavailable);
    assert_eq!(f.store.order_count(), 0);
}

#[tokio::test]
async fn test_item_of_other_restaurant_not_found() {
    let f = fixture();
    let err = f
        .service
        .create_order(create_req("t1", &[("burger", 1)]))
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::ItemsNotFound(_)));
}

#[tokio::test]
async fn test_duplicate_lines_priced_separately() {
    let f = fixture();
    let id = place(&f, &[("cola", 1), ("cola", 2)]).await;
    let order = f.service.get_order("r1", &id).await.unwrap();
    assert_eq!(order.items.len(), 2);
    assert_eq!(order.subtotal, dec!(60.00));
}

#[tokio::test]
async fn test_validation_runs_before_reads() {
    let f = fixture();

    let err = f
        .service
        .create_order(create_req("no-such-table", &[("pizza", 0)]))
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::Validation(_)));

    let err = f
        .service
        .create_order(create_req("t1", &[]))
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::Validation(_)));

    let mut req = create_req("t1", &[("pizza", 1)]);
    req.notes = Some("n".repeat(501));
    let err = f.service.create_order(req).await.unwrap_err();
    assert!(matches!(err, OrderError::Validation(_)));
}

#[tokio::test]
async fn test_table_checks() {
    let f = fixture();

    let err = f
        .service
        .create_order(create_req("nope", &[("pizza", 1)]))
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::TableNotFound(_)));

    let err = f
        .service
        .create_order(create_req("t-off", &[("pizza", 1)]))
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::TableInactive(_)));
    assert_eq!(f.store.order_count(), 0);
}

#[tokio::test]
async fn test_customer_text_trimmed() {
    let f = fixture();
    let mut req = create_req("t1", &[("pizza", 1)]);
    req.customer_name = Some("  Ana  ".into());
    req.notes = Some("   ".into());

    let id = f.service.create_order(req).await.unwrap();
    let order = f.service.get_order("r1", &id).await.unwrap();
    assert_eq!(order.customer_name.as_deref(), Some("Ana"));
    assert_eq!(order.notes, None);
}

// ========================================================================
// Discounts
// ========================================================================

#[tokio::test]
async fn test_single_most_specific_discount_applies() {
    let f = fixture();
    f.store.upsert_discount(&discount(
        "all-20",
        DiscountKind::Percentage,
        dec!(20),
        DiscountScope::All,
    ));
    f.store.upsert_discount(&discount(
        "mains-15",
        DiscountKind::Percentage,
        dec!(15),
        DiscountScope::Category {
            category_id: "Mains".into(),
        },
    ));
    f.store.upsert_discount(&discount(
        "pizza-3",
        DiscountKind::Fixed,
        dec!(3),
        DiscountScope::Item {
            item_id: "pizza".into(),
        },
    ));

    let id = place(&f, &[("pizza", 1), ("cola", 1)]).await;
    let order = f.service.get_order("r1", &id).await.unwrap();

    assert_eq!(order.applied_discount_id.as_deref(), Some("pizza-3"));
    assert_eq!(order.discount_amount, dec!(3.00));
    assert_eq!(order.total, dec!(67.00));
}

#[tokio::test]
async fn test_discount_clamped_to_subtotal() {
    let f = fixture();
    f.store.upsert_discount(&discount(
        "huge",
        DiscountKind::Fixed,
        dec!(500),
        DiscountScope::All,
    ));

    let id = place(&f, &[("pizza", 2)]).await;
    let order = f.service.get_order("r1", &id).await.unwrap();
    assert_eq!(order.discount_amount, dec!(100.00));
    assert_eq!(order.total, Decimal::ZERO);
    assert_eq!(order.commission_amount, Decimal::ZERO);
}

#[tokio::test]
async fn test_sub_cent_discount_not_recorded() {
    let f = fixture();
    f.store.upsert_discount(&discount(
        "tiny",
        DiscountKind::Fixed,
        dec!(0.004),
        DiscountScope::All,
    ));

    let id = place(&f, &[("pizza", 1)]).await;
    let order = f.service.get_order("r1", &id).await.unwrap();
    assert_eq!(order.discount_amount, Decimal::ZERO);
    assert_eq!(order.total, dec!(50.00));
    assert_eq!(order.applied_discount_id, None);
}

#[tokio::test]
async fn test_expired_discount_ignored() {
    let f = fixture();
    let mut expired = discount("old", DiscountKind::Percentage, dec!(50), DiscountScope::All);
    expired.end_time = Some(shared::util::now_millis() - 60_000);
    f.store.upsert_discount(&expired);

    let id = place(&f, &[("pizza", 1)]).await;
    let order = f.service.get_order("r1", &id).await.unwrap();
    assert_eq!(order.discount_amount, Decimal::ZERO);
    assert_eq!(order.applied_discount_id, None);
}

#[tokio::test]
async fn test_discount_read_failure_degrades() {
    let f = fixture();
    f.store.upsert_discount(&discount(
        "ten-off",
        DiscountKind::Percentage,
        dec!(10),
        DiscountScope::All,
    ));
    f.store.fail_discount_reads(true);

    let id = place(&f, &[("pizza", 2)]).await;
    let order = f.service.get_order("r1", &id).await.unwrap();
    assert_eq!(order.total, dec!(100.00));
    assert_eq!(order.applied_discount_id, None);
}

#[tokio::test]
async fn test_default_commission_rate() {
    let f = fixture();
    let id = f
        .service
        .create_order(create_req("t2", &[("burger", 2)]))
        .await
        .unwrap();
    let order = f.service.get_order("r2", &id).await.unwrap();
    assert_eq!(order.commission_rate, dec!(0.05));
    assert_eq!(order.commission_amount, dec!(1.20));
}

#[tokio::test]
async fn test_preview_matches_create() {
    let f = fixture();
    f.store.upsert_discount(&discount(
        "mains-15",
        DiscountKind::Percentage,
        dec!(15),
        DiscountScope::Category {
            category_id: "Mains".into(),
        },
    ));
    let items = [("pizza", 1), ("pasta", 3), ("cola", 2)];

    let preview = f
        .service
        .preview_order_pricing(&PreviewOrderRequest {
            table_id: "t1".into(),
            items: items
                .iter()
                .map(|(id, qty)| CartLineInput::new(*id, *qty))
                .collect(),
        })
        .await
        .unwrap();
    assert_eq!(f.store.order_count(), 0);

    let id = place(&f, &items).await;
    let order = f.service.get_order("r1", &id).await.unwrap();
    assert_eq!(preview.subtotal, order.subtotal);
    assert_eq!(preview.discount, order.discount_amount);
    assert_eq!(preview.total, order.total);
    assert_eq!(preview.applied_discount_id, order.applied_discount_id);
    assert_eq!(preview.discount, dec!(21.00));
}

// ========================================================================
// Status graph
// ========================================================================

#[tokio::test]
async fn test_pending_to_completed_rejected() {
    let f = fixture();
    let id = place(&f, &[("pizza", 1)]).await;

    let err = f
        .service
        .update_order_status("r1", &id, OrderStatus::Completed)
        .await
        .unwrap_err();
    assert_eq!(err.command_code(), CommandErrorCode::InvalidTransition);
    let order = f.service.get_order("r1", &id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
}

#[tokio::test]
async fn test_same_status_is_noop() {
    let f = fixture();
    let id = place(&f, &[("pizza", 1)]).await;
    let before = f.service.get_order("r1", &id).await.unwrap();

    let mut rx = f.hub.subscribe("r1");
    let after = f
        .service
        .update_order_status("r1", &id, OrderStatus::Pending)
        .await
        .unwrap();
    assert_eq!(after.updated_at, before.updated_at);
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn test_other_restaurant_cannot_touch_order() {
    let f = fixture();
    let id = place(&f, &[("pizza", 1)]).await;

    let err = f
        .service
        .update_order_status("r2", &id, OrderStatus::Preparing)
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::OrderNotFound(_)));

    let err = f.service.cancel_order("r2", &id).await.unwrap_err();
    assert!(matches!(err, OrderError::OrderNotFound(_)));
    assert_eq!(
        f.service.get_order("r1", &id).await.unwrap().status,
        OrderStatus::Pending
    );
}

#[tokio::test]
async fn test_status_update_to_cancelled_routes_through_cancel() {
    let f = fixture();
    f.store.set_stock("r1", "pizza", 10);
    let id = place(&f, &[("pizza", 3)]).await;
    assert_eq!(f.store.stock("r1", "pizza"), Some(7));

    let order = f
        .service
        .update_order_status("r1", &id, OrderStatus::Cancelled)
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Cancelled);
    assert_eq!(f.store.stock("r1", "pizza"), Some(10));
}

#[tokio::test]
async fn test_lost_race_retries_against_fresh_row() {
    let f = fixture();
    let id = place(&f, &[("pizza", 1)]).await;

    // Someone else cancels between our read and our write
    f.store.interpose_status_change(&id, OrderStatus::Cancelled);
    let err = f
        .service
        .update_order_status("r1", &id, OrderStatus::Preparing)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        OrderError::InvalidTransition {
            from: OrderStatus::Cancelled,
            to: OrderStatus::Preparing
        }
    ));
}

#[tokio::test]
async fn test_lost_race_to_same_target_is_noop() {
    let f = fixture();
    let id = place(&f, &[("pizza", 1)]).await;

    f.store.interpose_status_change(&id, OrderStatus::Preparing);
    let order = f
        .service
        .update_order_status("r1", &id, OrderStatus::Preparing)
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Preparing);
}

// ========================================================================
// Side effects
// ========================================================================

#[tokio::test]
async fn test_events_published() {
    let f = fixture();
    let mut rx = f.hub.subscribe("r1");
    let mut other = f.hub.subscribe("r2");

    let id = place(&f, &[("pizza", 1)]).await;
    match rx.try_recv().unwrap() {
        LiveMessage::Inserted { order } => assert_eq!(order.id, id),
        other => panic!("unexpected message: {other:?}"),
    }

    let created = f.service.get_order("r1", &id).await.unwrap();
    f.service
        .update_order_status("r1", &id, OrderStatus::Preparing)
        .await
        .unwrap();
    match rx.try_recv().unwrap() {
        LiveMessage::StatusChanged {
            order_id,
            status,
            updated_at,
        } => {
            assert_eq!(order_id, id);
            assert_eq!(status, OrderStatus::Preparing);
            assert!(updated_at > created.updated_at);
        }
        other => panic!("unexpected message: {other:?}"),
    }

    assert!(matches!(other.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn test_failed_insert_publishes_nothing() {
    let f = fixture();
    let mut rx = f.hub.subscribe("r1");
    f.store.fail_order_writes(true);

    let err = f
        .service
        .create_order(create_req("t1", &[("pizza", 1)]))
        .await
        .unwrap_err();
    assert_eq!(err.command_code(), CommandErrorCode::PersistenceError);
    assert_eq!(f.store.order_count(), 0);
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn test_inventory_failure_not_surfaced() {
    let f = fixture();
    f.store.set_stock("r1", "pizza", 5);
    f.store.fail_inventory(true);

    let id = place(&f, &[("pizza", 2)]).await;
    assert_eq!(f.store.stock("r1", "pizza"), Some(5));

    let order = f.service.cancel_order("r1", &id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Cancelled);
}

#[tokio::test]
async fn test_dashboard_invalidated_by_writes() {
    let f = fixture();
    let empty = f.service.dashboard_stats("r1").await.unwrap();
    assert_eq!(empty.counts.total(), 0);

    let id = place(&f, &[("pizza", 1)]).await;
    let stats = f.service.dashboard_stats("r1").await.unwrap();
    assert_eq!(stats.counts.pending, 1);
    assert_eq!(stats.net_total, dec!(50.00));

    f.service.cancel_order("r1", &id).await.unwrap();
    let stats = f.service.dashboard_stats("r1").await.unwrap();
    assert_eq!(stats.counts.cancelled, 1);
    assert_eq!(stats.net_total, Decimal::ZERO);
}

// ========================================================================
// Queries
// ========================================================================

#[tokio::test]
async fn test_kitchen_window() {
    let f = fixture();
    let first = place(&f, &[("pizza", 1)]).await;
    let second = place(&f, &[("pasta", 1)]).await;
    let done = place(&f, &[("cola", 1)]).await;
    let dropped = place(&f, &[("cola", 1)]).await;

    f.service
        .update_order_status("r1", &second, OrderStatus::Preparing)
        .await
        .unwrap();
    f.service
        .update_order_status("r1", &done, OrderStatus::Preparing)
        .await
        .unwrap();
    f.service
        .update_order_status("r1", &done, OrderStatus::Completed)
        .await
        .unwrap();
    f.service.cancel_order("r1", &dropped).await.unwrap();

    let ids: Vec<String> = f
        .service
        .kitchen_orders("r1")
        .await
        .unwrap()
        .into_iter()
        .map(|o| o.id)
        .collect();
    assert_eq!(ids, vec![first, second, done]);
}

#[tokio::test]
async fn test_list_orders_filters_by_status() {
    let f = fixture();
    let a = place(&f, &[("pizza", 1)]).await;
    place(&f, &[("pasta", 1)]).await;
    f.service
        .update_order_status("r1", &a, OrderStatus::Preparing)
        .await
        .unwrap();

    let preparing = f
        .service
        .list_orders("r1", Some(OrderStatus::Preparing), None)
        .await
        .unwrap();
    assert_eq!(preparing.len(), 1);
    assert_eq!(preparing[0].id, a);

    let limited = f.service.list_orders("r1", None, Some(1)).await.unwrap();
    assert_eq!(limited.len(), 1);
    assert!(f.service.list_orders("r2", None, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_track_order_unscoped() {
    let f = fixture();
    let id = place(&f, &[("pizza", 1)]).await;

    let tracking = f.service.track_order(&id).await.unwrap();
    assert_eq!(tracking.order_id, id);
    assert_eq!(tracking.status, OrderStatus::Pending);
    assert_eq!(tracking.items.len(), 1);

    assert!(matches!(
        f.service.track_order("missing").await,
        Err(OrderError::OrderNotFound(_))
    ));
}

#[tokio::test]
async fn test_commission_summary() {
    let f = fixture();
    place(&f, &[("pizza", 2)]).await;
    let cancelled = place(&f, &[("pasta", 1)]).await;
    f.service.cancel_order("r1", &cancelled).await.unwrap();

    let summary = f.service.commission_summary(None).await.unwrap();
    assert_eq!(summary.len(), 2);
    // Sorted by restaurant name
    assert_eq!(summary[0].restaurant_id, "r2");
    assert_eq!(summary[0].order_count, 0);
    assert_eq!(summary[1].restaurant_id, "r1");
    assert_eq!(summary[1].order_count, 1);
    assert_eq!(summary[1].net_total, dec!(100.00));
    assert_eq!(summary[1].commission_total, dec!(10.00));
}

#[tokio::test]
async fn test_store_reads_match_service() {
    let f = fixture();
    let id = place(&f, &[("pizza", 1)]).await;
    let stored = f.store.find_order_by_id(&id).await.unwrap().unwrap();
    assert_eq!(stored, f.service.get_order("r1", &id).await.unwrap());
}
