//! End-to-end scenarios against an in-memory database: every operation
//! runs through the real engine, repositories, and migrations.

use reparo_core::{
    DebtKind, DebtStatus, DiscountType, PaymentMethod, PaymentStatus, ReferenceType, ReturnKind,
    ServiceStatus, TransactionKind,
};
use reparo_db::{Database, DbConfig};
use reparo_engine::input::{
    ChecklistItemInput, CreateDebtInput, CreatePurchaseInput, CreateReturnInput, CreateSaleInput,
    ItemInput, OperationalExpenseInput, PayDebtInput, PurchaseLineInput, ReturnLineInput,
    SaleLineInput, ServiceOrderInput, ServicePartInput, StockOpnameInput,
};
use reparo_engine::{Engine, EngineError};
use reparo_core::Tenant;

async fn engine() -> Engine {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_test_writer()
        .try_init();

    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    Engine::new(db)
}

fn tenant() -> Tenant {
    Tenant::new("owner-1")
}

async fn seed_item(
    engine: &Engine,
    tenant: &Tenant,
    name: &str,
    stock: i64,
    buy: i64,
    sell: i64,
) -> String {
    engine
        .create_item(
            tenant,
            ItemInput {
                name: name.to_string(),
                category: "Parts".into(),
                brand: String::new(),
                stock,
                min_stock: 1,
                buy_price_cents: buy,
                sell_price_cents: sell,
            },
        )
        .await
        .unwrap()
        .id
}

fn sale_line(inventory_id: &str, qty: i64) -> SaleLineInput {
    SaleLineInput {
        inventory_id: Some(inventory_id.to_string()),
        name: None,
        qty,
        price_cents: None,
    }
}

fn basic_service_input(parts: Vec<ServicePartInput>) -> ServiceOrderInput {
    ServiceOrderInput {
        customer_name: "Budi".into(),
        customer_id: None,
        phone: "0812".into(),
        device_model: "Phone X".into(),
        complaint: "cracked screen".into(),
        cost_estimate_cents: 0,
        down_payment_cents: 0,
        service_fee_cents: 0,
        warranty: String::new(),
        technician: String::new(),
        payment_status: PaymentStatus::Paid,
        payment_method: Some("cash".into()),
        cash_account_id: None,
        notes: String::new(),
        parts,
        qc: vec![],
        completeness: vec![],
    }
}

// ===========================================================================
// Sales
// ===========================================================================

#[tokio::test]
async fn sale_with_percent_discount_books_exactly_one_income_entry() {
    let engine = engine().await;
    let tenant = tenant();
    let screen = seed_item(&engine, &tenant, "Screen", 10, 6_000, 10_000).await;
    let cable = seed_item(&engine, &tenant, "Cable", 10, 2_000, 5_000).await;

    let (sale, items) = engine
        .create_sale(
            &tenant,
            CreateSaleInput {
                customer_name: "Budi".into(),
                customer_id: None,
                discount_type: DiscountType::Percent,
                discount_value: 1000, // 10%
                payment_method: PaymentMethod::Cash,
                cash_account_id: None,
                notes: String::new(),
                items: vec![sale_line(&screen, 2), sale_line(&cable, 1)],
            },
        )
        .await
        .unwrap();

    // 2 x 10000 + 1 x 5000 = 25000, minus 10% = 22500
    assert_eq!(sale.subtotal_cents, 25_000);
    assert_eq!(sale.discount_amount_cents, 2_500);
    assert_eq!(sale.total_cents, 22_500);
    assert_eq!(items.len(), 2);

    // stock moved
    assert_eq!(engine.get_item(&tenant, &screen).await.unwrap().stock, 8);
    assert_eq!(engine.get_item(&tenant, &cable).await.unwrap().stock, 9);

    // exactly one ledger row per sale: the income entry of the total
    let entries = engine
        .transactions_for(&tenant, ReferenceType::Sale, &sale.id)
        .await
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].kind, TransactionKind::Income);
    assert_eq!(entries[0].amount_cents, 22_500);
}

#[tokio::test]
async fn insufficient_stock_rolls_back_the_entire_sale() {
    let engine = engine().await;
    let tenant = tenant();
    let plenty = seed_item(&engine, &tenant, "Plenty", 10, 100, 200).await;
    let scarce = seed_item(&engine, &tenant, "Scarce", 1, 100, 200).await;

    let err = engine
        .create_sale(
            &tenant,
            CreateSaleInput {
                customer_name: String::new(),
                customer_id: None,
                discount_type: DiscountType::Nominal,
                discount_value: 0,
                payment_method: PaymentMethod::Cash,
                cash_account_id: None,
                notes: String::new(),
                items: vec![sale_line(&plenty, 3), sale_line(&scarce, 5)],
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    // the first line's decrement was rolled back with everything else
    assert_eq!(engine.get_item(&tenant, &plenty).await.unwrap().stock, 10);
    assert_eq!(engine.get_item(&tenant, &scarce).await.unwrap().stock, 1);

    let page = engine.list_sales(&tenant, 1, 20).await.unwrap();
    assert_eq!(page.total, 0);

    let summary = engine.finance_summary(&tenant, None, None).await.unwrap();
    assert_eq!(summary.income_cents, 0);
}

#[tokio::test]
async fn empty_sale_is_rejected() {
    let engine = engine().await;
    let err = engine
        .create_sale(
            &tenant(),
            CreateSaleInput {
                customer_name: String::new(),
                customer_id: None,
                discount_type: DiscountType::Nominal,
                discount_value: 0,
                payment_method: PaymentMethod::Cash,
                cash_account_id: None,
                notes: String::new(),
                items: vec![],
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn deleting_a_sale_restores_stock_and_clears_the_ledger() {
    let engine = engine().await;
    let tenant = tenant();
    let item = seed_item(&engine, &tenant, "Widget", 5, 1_000, 2_000).await;

    let (sale, _) = engine
        .create_sale(
            &tenant,
            CreateSaleInput {
                customer_name: String::new(),
                customer_id: None,
                discount_type: DiscountType::Nominal,
                discount_value: 0,
                payment_method: PaymentMethod::Cash,
                cash_account_id: None,
                notes: String::new(),
                items: vec![sale_line(&item, 2)],
            },
        )
        .await
        .unwrap();
    assert_eq!(engine.get_item(&tenant, &item).await.unwrap().stock, 3);

    engine.delete_sale(&tenant, &sale.id).await.unwrap();

    assert_eq!(engine.get_item(&tenant, &item).await.unwrap().stock, 5);
    let entries = engine
        .transactions_for(&tenant, ReferenceType::Sale, &sale.id)
        .await
        .unwrap();
    assert!(entries.is_empty());
    assert!(matches!(
        engine.get_sale(&tenant, &sale.id).await.unwrap_err(),
        EngineError::NotFound { .. }
    ));
}

#[tokio::test]
async fn credit_sale_books_income_and_opens_a_receivable() {
    let engine = engine().await;
    let tenant = tenant();
    let item = seed_item(&engine, &tenant, "Widget", 5, 1_000, 2_000).await;

    let (sale, _) = engine
        .create_sale(
            &tenant,
            CreateSaleInput {
                customer_name: "Andi".into(),
                customer_id: None,
                discount_type: DiscountType::Nominal,
                discount_value: 0,
                payment_method: PaymentMethod::Credit,
                cash_account_id: None,
                notes: String::new(),
                items: vec![sale_line(&item, 1)],
            },
        )
        .await
        .unwrap();

    let summary = engine.finance_summary(&tenant, None, None).await.unwrap();
    assert_eq!(summary.income_cents, sale.total_cents);

    let debts = engine.list_debts(&tenant, Some(DebtKind::Receivable), 1, 20).await.unwrap();
    assert_eq!(debts.total, 1);
    assert_eq!(debts.items[0].amount_cents, sale.total_cents);
    assert_eq!(debts.items[0].reference_id.as_deref(), Some(sale.id.as_str()));
}

// ===========================================================================
// Purchases
// ===========================================================================

#[tokio::test]
async fn cash_purchase_adds_stock_and_books_expense() {
    let engine = engine().await;
    let tenant = tenant();
    let item = seed_item(&engine, &tenant, "Connector", 2, 500, 900).await;

    let (purchase, _) = engine
        .create_purchase(
            &tenant,
            CreatePurchaseInput {
                supplier_id: None,
                supplier_name: "ACME Parts".into(),
                payment_method: PaymentMethod::Cash,
                cash_account_id: None,
                notes: String::new(),
                items: vec![PurchaseLineInput {
                    inventory_id: item.clone(),
                    qty: 10,
                    buy_price_cents: 450,
                }],
            },
        )
        .await
        .unwrap();

    assert_eq!(purchase.total_cents, 4_500);

    let stored = engine.get_item(&tenant, &item).await.unwrap();
    assert_eq!(stored.stock, 12);
    // buy price follows the latest purchase
    assert_eq!(stored.buy_price_cents, 450);

    let summary = engine.finance_summary(&tenant, None, None).await.unwrap();
    assert_eq!(summary.expense_cents, 4_500);
}

#[tokio::test]
async fn credit_purchase_books_expense_and_opens_a_payable() {
    let engine = engine().await;
    let tenant = tenant();
    let item = seed_item(&engine, &tenant, "Connector", 0, 1_000, 1_500).await;

    let (purchase, _) = engine
        .create_purchase(
            &tenant,
            CreatePurchaseInput {
                supplier_id: None,
                supplier_name: "ACME Parts".into(),
                payment_method: PaymentMethod::Credit,
                cash_account_id: None,
                notes: String::new(),
                items: vec![PurchaseLineInput {
                    inventory_id: item.clone(),
                    qty: 5,
                    buy_price_cents: 1_000,
                }],
            },
        )
        .await
        .unwrap();
    assert_eq!(purchase.total_cents, 5_000);

    // 5 x 1000 on credit: the expense entry AND the payable, both 5000
    let summary = engine.finance_summary(&tenant, None, None).await.unwrap();
    assert_eq!(summary.expense_cents, 5_000);

    let debts = engine.list_debts(&tenant, Some(DebtKind::Payable), 1, 20).await.unwrap();
    assert_eq!(debts.total, 1);
    let debt = &debts.items[0];
    assert_eq!(debt.amount_cents, 5_000);
    assert_eq!(debt.remaining_cents, 5_000);
    assert_eq!(debt.status, DebtStatus::Outstanding);
    assert_eq!(debt.party_name, "ACME Parts");
}

#[tokio::test]
async fn deleting_a_purchase_fails_once_units_were_sold_on() {
    let engine = engine().await;
    let tenant = tenant();
    let item = seed_item(&engine, &tenant, "Connector", 0, 1_000, 1_500).await;

    let (purchase, _) = engine
        .create_purchase(
            &tenant,
            CreatePurchaseInput {
                supplier_id: None,
                supplier_name: String::new(),
                payment_method: PaymentMethod::Cash,
                cash_account_id: None,
                notes: String::new(),
                items: vec![PurchaseLineInput {
                    inventory_id: item.clone(),
                    qty: 3,
                    buy_price_cents: 1_000,
                }],
            },
        )
        .await
        .unwrap();

    // sell 2 of the 3 purchased units
    engine
        .create_sale(
            &tenant,
            CreateSaleInput {
                customer_name: String::new(),
                customer_id: None,
                discount_type: DiscountType::Nominal,
                discount_value: 0,
                payment_method: PaymentMethod::Cash,
                cash_account_id: None,
                notes: String::new(),
                items: vec![sale_line(&item, 2)],
            },
        )
        .await
        .unwrap();

    // reversing -3 against a stock of 1 must abort
    let err = engine.delete_purchase(&tenant, &purchase.id).await.unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    // nothing changed: record still there, stock untouched
    assert!(engine.get_purchase(&tenant, &purchase.id).await.is_ok());
    assert_eq!(engine.get_item(&tenant, &item).await.unwrap().stock, 1);
}

// ===========================================================================
// Debts
// ===========================================================================

#[tokio::test]
async fn debt_settles_through_partial_payments() {
    let engine = engine().await;
    let tenant = tenant();

    let debt = engine
        .create_debt(
            &tenant,
            CreateDebtInput {
                kind: DebtKind::Payable,
                party_name: "ACME Parts".into(),
                amount_cents: 10_000,
                notes: String::new(),
            },
        )
        .await
        .unwrap();

    let after_first = engine
        .pay_debt(
            &tenant,
            &debt.id,
            PayDebtInput {
                amount_cents: 4_000,
                cash_account_id: None,
                notes: String::new(),
            },
        )
        .await
        .unwrap();
    assert_eq!(after_first.paid_cents, 4_000);
    assert_eq!(after_first.remaining_cents, 6_000);
    assert_eq!(after_first.status, DebtStatus::Outstanding);

    let after_second = engine
        .pay_debt(
            &tenant,
            &debt.id,
            PayDebtInput {
                amount_cents: 6_000,
                cash_account_id: None,
                notes: String::new(),
            },
        )
        .await
        .unwrap();
    assert_eq!(after_second.paid_cents, 10_000);
    assert_eq!(after_second.remaining_cents, 0);
    assert_eq!(after_second.status, DebtStatus::Settled);

    // paying off a payable is cash out
    let summary = engine.finance_summary(&tenant, None, None).await.unwrap();
    assert_eq!(summary.expense_cents, 10_000);

    let trail = engine.list_debt_payments(&tenant, &debt.id).await.unwrap();
    assert_eq!(trail.len(), 2);
}

#[tokio::test]
async fn overpayment_is_rejected_and_changes_nothing() {
    let engine = engine().await;
    let tenant = tenant();

    let debt = engine
        .create_debt(
            &tenant,
            CreateDebtInput {
                kind: DebtKind::Receivable,
                party_name: "Andi".into(),
                amount_cents: 5_000,
                notes: String::new(),
            },
        )
        .await
        .unwrap();

    let err = engine
        .pay_debt(
            &tenant,
            &debt.id,
            PayDebtInput {
                amount_cents: 6_000,
                cash_account_id: None,
                notes: String::new(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    let stored = engine.get_debt(&tenant, &debt.id).await.unwrap();
    assert_eq!(stored.paid_cents, 0);
    assert_eq!(stored.status, DebtStatus::Outstanding);
}

// ===========================================================================
// Returns
// ===========================================================================

#[tokio::test]
async fn sale_return_restores_stock_and_reverses_income() {
    let engine = engine().await;
    let tenant = tenant();
    let item = seed_item(&engine, &tenant, "Widget", 2, 1_000, 2_000).await;

    let (ret, _) = engine
        .create_return(
            &tenant,
            CreateReturnInput {
                kind: ReturnKind::Sale,
                parent_id: None,
                reason: "defective".into(),
                compensation_cents: 500,
                cash_account_id: None,
                items: vec![ReturnLineInput {
                    inventory_id: Some(item.clone()),
                    name: None,
                    qty: 1,
                    price_cents: 2_000,
                }],
            },
        )
        .await
        .unwrap();
    assert_eq!(ret.total_cents, 2_000);

    assert_eq!(engine.get_item(&tenant, &item).await.unwrap().stock, 3);

    let entries = engine
        .transactions_for(&tenant, ReferenceType::SaleReturn, &ret.id)
        .await
        .unwrap();
    assert_eq!(entries.len(), 2); // value + compensation
    assert!(entries.iter().all(|e| e.kind == TransactionKind::Expense));
    let total: i64 = entries.iter().map(|e| e.amount_cents).sum();
    assert_eq!(total, 2_500);
}

#[tokio::test]
async fn purchase_return_needs_the_stock_it_sends_back() {
    let engine = engine().await;
    let tenant = tenant();
    let item = seed_item(&engine, &tenant, "Widget", 1, 1_000, 2_000).await;

    let err = engine
        .create_return(
            &tenant,
            CreateReturnInput {
                kind: ReturnKind::Purchase,
                parent_id: None,
                reason: "wrong batch".into(),
                compensation_cents: 0,
                cash_account_id: None,
                items: vec![ReturnLineInput {
                    inventory_id: Some(item.clone()),
                    name: None,
                    qty: 3,
                    price_cents: 1_000,
                }],
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
    assert_eq!(engine.get_item(&tenant, &item).await.unwrap().stock, 1);
}

// ===========================================================================
// Service lifecycle
// ===========================================================================

#[tokio::test]
async fn completing_a_service_books_the_settlement() {
    let engine = engine().await;
    let tenant = tenant();
    let part = seed_item(&engine, &tenant, "LCD", 5, 10_000, 15_000).await;

    let mut input = basic_service_input(vec![ServicePartInput {
        inventory_id: Some(part.clone()),
        name: None,
        qty: 2,
        buy_price_cents: None,
        sell_price_cents: None,
    }]);
    input.service_fee_cents = 50_000;

    let detail = engine.create_service(&tenant, input).await.unwrap();
    let id = detail.order.id.clone();

    // parts consumed at intake
    assert_eq!(engine.get_item(&tenant, &part).await.unwrap().stock, 3);

    let order = engine
        .transition_service_status(&tenant, &id, ServiceStatus::Completed)
        .await
        .unwrap();
    assert_eq!(order.status, ServiceStatus::Completed);

    // parts buy 20000, sell 30000, fee 50000:
    //   expense 20000 + profit 10000 (parts) + profit 20000 (service)
    let entries = engine
        .transactions_for(&tenant, ReferenceType::Service, &id)
        .await
        .unwrap();
    assert_eq!(entries.len(), 3);

    let expense: i64 = entries
        .iter()
        .filter(|e| e.kind == TransactionKind::Expense)
        .map(|e| e.amount_cents)
        .sum();
    assert_eq!(expense, 20_000);

    let mut profits: Vec<i64> = entries
        .iter()
        .filter(|e| e.kind == TransactionKind::Profit)
        .map(|e| e.amount_cents)
        .collect();
    profits.sort_unstable();
    assert_eq!(profits, vec![10_000, 20_000]);
}

#[tokio::test]
async fn settlement_fires_exactly_once() {
    let engine = engine().await;
    let tenant = tenant();

    let mut input = basic_service_input(vec![]);
    input.cost_estimate_cents = 30_000;

    let detail = engine.create_service(&tenant, input).await.unwrap();
    let id = detail.order.id.clone();

    engine
        .transition_service_status(&tenant, &id, ServiceStatus::Completed)
        .await
        .unwrap();

    // Completed is terminal: a second completion is rejected, so the
    // settlement cannot double-book.
    let err = engine
        .transition_service_status(&tenant, &id, ServiceStatus::Completed)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Transition(_)));

    let entries = engine
        .transactions_for(&tenant, ReferenceType::Service, &id)
        .await
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].amount_cents, 30_000);
}

#[tokio::test]
async fn backward_transitions_are_rejected() {
    let engine = engine().await;
    let tenant = tenant();

    let detail = engine
        .create_service(&tenant, basic_service_input(vec![]))
        .await
        .unwrap();
    let id = detail.order.id.clone();

    engine
        .transition_service_status(&tenant, &id, ServiceStatus::AwaitingParts)
        .await
        .unwrap();

    let err = engine
        .transition_service_status(&tenant, &id, ServiceStatus::Diagnosing)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Transition(_)));
}

#[tokio::test]
async fn down_payment_is_booked_at_intake() {
    let engine = engine().await;
    let tenant = tenant();

    let mut input = basic_service_input(vec![]);
    input.down_payment_cents = 25_000;

    let detail = engine.create_service(&tenant, input).await.unwrap();

    let entries = engine
        .transactions_for(&tenant, ReferenceType::Service, &detail.order.id)
        .await
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].kind, TransactionKind::Income);
    assert_eq!(entries[0].amount_cents, 25_000);
}

#[tokio::test]
async fn unpaid_completion_books_no_final_settlement() {
    let engine = engine().await;
    let tenant = tenant();

    let mut input = basic_service_input(vec![]);
    input.cost_estimate_cents = 40_000;
    input.payment_status = PaymentStatus::Unpaid;

    let detail = engine.create_service(&tenant, input).await.unwrap();
    engine
        .transition_service_status(&tenant, &detail.order.id, ServiceStatus::Completed)
        .await
        .unwrap();

    let entries = engine
        .transactions_for(&tenant, ReferenceType::Service, &detail.order.id)
        .await
        .unwrap();
    assert!(entries.is_empty());
}

#[tokio::test]
async fn editing_a_service_replays_part_stock() {
    let engine = engine().await;
    let tenant = tenant();
    let lcd = seed_item(&engine, &tenant, "LCD", 5, 10_000, 15_000).await;
    let battery = seed_item(&engine, &tenant, "Battery", 5, 4_000, 7_000).await;

    let detail = engine
        .create_service(
            &tenant,
            basic_service_input(vec![ServicePartInput {
                inventory_id: Some(lcd.clone()),
                name: None,
                qty: 2,
                buy_price_cents: None,
                sell_price_cents: None,
            }]),
        )
        .await
        .unwrap();
    assert_eq!(engine.get_item(&tenant, &lcd).await.unwrap().stock, 3);

    // swap the LCD lines for a battery line
    let updated = engine
        .update_service_order(
            &tenant,
            &detail.order.id,
            basic_service_input(vec![ServicePartInput {
                inventory_id: Some(battery.clone()),
                name: None,
                qty: 1,
                buy_price_cents: None,
                sell_price_cents: None,
            }]),
        )
        .await
        .unwrap();
    assert_eq!(updated.parts.len(), 1);

    // old parts restored, new consumed
    assert_eq!(engine.get_item(&tenant, &lcd).await.unwrap().stock, 5);
    assert_eq!(engine.get_item(&tenant, &battery).await.unwrap().stock, 4);
}

#[tokio::test]
async fn completed_orders_reject_edits() {
    let engine = engine().await;
    let tenant = tenant();

    let detail = engine
        .create_service(&tenant, basic_service_input(vec![]))
        .await
        .unwrap();
    engine
        .transition_service_status(&tenant, &detail.order.id, ServiceStatus::Completed)
        .await
        .unwrap();

    let err = engine
        .update_service_order(&tenant, &detail.order.id, basic_service_input(vec![]))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn deleting_a_service_restores_parts_and_clears_the_ledger() {
    let engine = engine().await;
    let tenant = tenant();
    let part = seed_item(&engine, &tenant, "LCD", 5, 10_000, 15_000).await;

    let mut input = basic_service_input(vec![ServicePartInput {
        inventory_id: Some(part.clone()),
        name: None,
        qty: 2,
        buy_price_cents: None,
        sell_price_cents: None,
    }]);
    input.down_payment_cents = 10_000;

    let detail = engine.create_service(&tenant, input).await.unwrap();
    let id = detail.order.id.clone();

    engine.delete_service(&tenant, &id).await.unwrap();

    assert_eq!(engine.get_item(&tenant, &part).await.unwrap().stock, 5);
    let entries = engine
        .transactions_for(&tenant, ReferenceType::Service, &id)
        .await
        .unwrap();
    assert!(entries.is_empty());
    assert!(matches!(
        engine.get_service(&tenant, &id).await.unwrap_err(),
        EngineError::NotFound { .. }
    ));
}

#[tokio::test]
async fn token_lookup_finds_the_order_without_a_tenant() {
    let engine = engine().await;
    let tenant = tenant();

    let detail = engine
        .create_service(
            &tenant,
            ServiceOrderInput {
                qc: vec![ChecklistItemInput {
                    name: "screen test".into(),
                    checked: true,
                }],
                ..basic_service_input(vec![])
            },
        )
        .await
        .unwrap();

    let found = engine
        .find_service_by_token(&detail.order.token)
        .await
        .unwrap();
    assert_eq!(found.order.id, detail.order.id);
    assert_eq!(found.qc.len(), 1);
}

// ===========================================================================
// Inventory
// ===========================================================================

#[tokio::test]
async fn stock_opname_sets_the_count_and_keeps_the_trail() {
    let engine = engine().await;
    let tenant = tenant();
    let item = seed_item(&engine, &tenant, "Counted", 10, 100, 200).await;

    let entry = engine
        .stock_opname(
            &tenant,
            StockOpnameInput {
                item_id: item.clone(),
                counted_stock: 7,
                notes: "yearly count".into(),
            },
        )
        .await
        .unwrap();

    assert_eq!(entry.old_stock, 10);
    assert_eq!(entry.new_stock, 7);
    assert_eq!(entry.difference, -3);
    assert_eq!(engine.get_item(&tenant, &item).await.unwrap().stock, 7);

    let history = engine.opname_history(&tenant, 1, 20).await.unwrap();
    assert_eq!(history.total, 1);
}

#[tokio::test]
async fn manual_adjustment_cannot_go_below_zero() {
    let engine = engine().await;
    let tenant = tenant();
    let item = seed_item(&engine, &tenant, "Widget", 2, 100, 200).await;

    let err = engine
        .adjust_stock_manually(&tenant, &item, -3)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    let ok = engine.adjust_stock_manually(&tenant, &item, -2).await.unwrap();
    assert_eq!(ok.stock, 0);
}

// ===========================================================================
// Finance & tenancy
// ===========================================================================

#[tokio::test]
async fn finance_summary_nets_across_kinds() {
    let engine = engine().await;
    let tenant = tenant();
    let item = seed_item(&engine, &tenant, "Widget", 10, 1_000, 2_000).await;

    // income 2000
    engine
        .create_sale(
            &tenant,
            CreateSaleInput {
                customer_name: String::new(),
                customer_id: None,
                discount_type: DiscountType::Nominal,
                discount_value: 0,
                payment_method: PaymentMethod::Cash,
                cash_account_id: None,
                notes: String::new(),
                items: vec![sale_line(&item, 1)],
            },
        )
        .await
        .unwrap();

    // expense 700
    engine
        .record_operational_expense(
            &tenant,
            OperationalExpenseInput {
                category: String::new(),
                amount_cents: 700,
                description: "electricity".into(),
                cash_account_id: None,
                date: None,
            },
        )
        .await
        .unwrap();

    // completed no-parts service: income 5000 (final settlement) and
    // profit 3000 (service margin)
    let mut input = basic_service_input(vec![]);
    input.cost_estimate_cents = 5_000;
    input.service_fee_cents = 3_000;
    let detail = engine.create_service(&tenant, input).await.unwrap();
    engine
        .transition_service_status(&tenant, &detail.order.id, ServiceStatus::Completed)
        .await
        .unwrap();

    let summary = engine.finance_summary(&tenant, None, None).await.unwrap();
    assert_eq!(summary.income_cents, 7_000);
    assert_eq!(summary.expense_cents, 700);
    assert_eq!(summary.profit_cents, 3_000);
    assert_eq!(summary.loss_cents, 0);
    assert_eq!(summary.net_cents(), 9_300);
}

#[tokio::test]
async fn tenants_cannot_see_or_touch_each_other() {
    let engine = engine().await;
    let alice = Tenant::new("alice");
    let bob = Tenant::new("bob");

    let item = seed_item(&engine, &alice, "Alice's Widget", 5, 100, 200).await;

    // bob sees nothing
    assert_eq!(engine.list_items(&bob, None, 1, 20).await.unwrap().total, 0);

    // and cannot mutate by id either
    let err = engine.adjust_stock_manually(&bob, &item, 1).await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound { .. }));

    let err = engine.delete_item(&bob, &item).await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound { .. }));

    // alice's data is untouched
    assert_eq!(engine.get_item(&alice, &item).await.unwrap().stock, 5);
}
