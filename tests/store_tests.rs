// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use cateten::db::{DEFAULT_CATEGORIES, SCHEMA_VERSION, Store, ViewScope};
use cateten::models::{
    CategoryUpdate, MAX_AMOUNT, NewCategory, NewTransaction, TransactionFilters, TransactionType,
    TransactionUpdate,
};
use cateten::Error;
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;

fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

fn expense(title: &str, amount: i64, category_id: Option<i64>, when: DateTime<Utc>) -> NewTransaction {
    NewTransaction {
        title: title.into(),
        amount: Decimal::from(amount),
        r#type: TransactionType::Expense,
        category_id,
        note: None,
        occurred_at: when,
    }
}

fn category_id(store: &Store, name: &str) -> i64 {
    store.category_by_name(name).unwrap().unwrap().id
}

#[test]
fn fresh_store_is_seeded_once() {
    let store = Store::open_in_memory().unwrap();
    assert_eq!(store.schema_version().unwrap(), SCHEMA_VERSION);

    let all = store.list_categories(None).unwrap();
    assert_eq!(all.len(), DEFAULT_CATEGORIES.len());
    let names: Vec<&str> = all.iter().map(|c| c.name.as_str()).collect();
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);

    let income = store.list_categories(Some(TransactionType::Income)).unwrap();
    assert_eq!(income.len(), 5);
    assert!(income.iter().all(|c| c.r#type == TransactionType::Income));

    let food = store.category_by_name(" Food ").unwrap().unwrap();
    assert_eq!(food.icon.as_deref(), Some("restaurant"));
    assert_eq!(food.r#type, TransactionType::Expense);
}

#[test]
fn reopening_a_file_keeps_data_and_does_not_reseed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("cateten.sqlite");

    let store = Store::open(&path).unwrap();
    assert_eq!(store.path(), Some(path.as_path()));
    store
        .add_category(&NewCategory {
            name: "Pets".into(),
            r#type: TransactionType::Expense,
            icon: None,
            color: Some("#111111".into()),
        })
        .unwrap();
    let pets = category_id(&store, "Pets");
    store
        .add_transaction(&expense("Vet", 80, Some(pets), at(2025, 2, 1, 9)))
        .unwrap();
    store.close().unwrap();

    let store = Store::open(&path).unwrap();
    assert_eq!(
        store.list_categories(None).unwrap().len(),
        DEFAULT_CATEGORIES.len() + 1
    );
    let txs = store.list_transactions(&TransactionFilters::default()).unwrap();
    assert_eq!(txs.len(), 1);
    assert_eq!(txs[0].amount, Decimal::from(80));
    assert_eq!(txs[0].occurred_at, at(2025, 2, 1, 9));
}

#[test]
fn add_category_rejects_blank_and_duplicate_names() {
    let store = Store::open_in_memory().unwrap();
    let blank = NewCategory {
        name: "  ".into(),
        r#type: TransactionType::Expense,
        icon: None,
        color: None,
    };
    assert!(matches!(store.add_category(&blank), Err(Error::InvalidInput(_))));

    let dup = NewCategory {
        name: "Food".into(),
        ..blank
    };
    assert!(matches!(store.add_category(&dup), Err(Error::Database(_))));
}

#[test]
fn update_category_edits_and_clears_fields() {
    let store = Store::open_in_memory().unwrap();
    let id = category_id(&store, "Shopping");
    store
        .update_category(
            id,
            &CategoryUpdate {
                name: Some("Groceries".into()),
                icon: Some(None),
                color: Some(Some("#000000".into())),
            },
        )
        .unwrap();
    let cat = store.get_category(id).unwrap().unwrap();
    assert_eq!(cat.name, "Groceries");
    assert_eq!(cat.icon, None);
    assert_eq!(cat.color.as_deref(), Some("#000000"));
    assert_eq!(cat.r#type, TransactionType::Expense);

    let missing = store.update_category(
        9_999,
        &CategoryUpdate {
            name: Some("Ghost".into()),
            ..CategoryUpdate::default()
        },
    );
    assert!(matches!(missing, Err(Error::NotFound(_))));
}

#[test]
fn empty_updates_are_no_ops() {
    let store = Store::open_in_memory().unwrap();
    let id = store
        .add_transaction(&expense("Lunch", 12, None, at(2025, 1, 5, 12)))
        .unwrap();
    let revision = store.revision();

    store
        .update_transaction(id, &TransactionUpdate::default())
        .unwrap();
    store
        .update_category(category_id(&store, "Food"), &CategoryUpdate::default())
        .unwrap();
    // Even for an id that does not exist.
    store
        .update_transaction(424_242, &TransactionUpdate::default())
        .unwrap();
    assert_eq!(store.revision(), revision);
}

#[test]
fn deleting_a_category_detaches_its_transactions() {
    let store = Store::open_in_memory().unwrap();
    let food = category_id(&store, "Food");
    let id = store
        .add_transaction(&expense("Dinner", 30, Some(food), at(2025, 1, 5, 19)))
        .unwrap();
    let before = store.get_transaction(id).unwrap().unwrap();
    std::thread::sleep(std::time::Duration::from_millis(5));

    store.delete_category(food).unwrap();
    assert!(store.get_category(food).unwrap().is_none());

    let after = store.get_transaction(id).unwrap().unwrap();
    assert_eq!(after.category_id, None);
    assert!(after.updated_at > before.updated_at);

    assert!(matches!(store.delete_category(food), Err(Error::NotFound(_))));
}

#[test]
fn transaction_crud_round_trip() {
    let store = Store::open_in_memory().unwrap();
    let food = category_id(&store, "Food");
    let id = store
        .add_transaction(&NewTransaction {
            title: " Coffee ".into(),
            amount: "3.75".parse().unwrap(),
            r#type: TransactionType::Expense,
            category_id: Some(food),
            note: Some("oat milk".into()),
            occurred_at: at(2025, 3, 1, 8),
        })
        .unwrap();

    let tx = store.get_transaction(id).unwrap().unwrap();
    assert_eq!(tx.title, "Coffee");
    assert_eq!(tx.amount, "3.75".parse::<Decimal>().unwrap());
    assert_eq!(tx.note.as_deref(), Some("oat milk"));
    assert_eq!(tx.created_at, tx.updated_at);

    std::thread::sleep(std::time::Duration::from_millis(5));
    store
        .update_transaction(
            id,
            &TransactionUpdate {
                amount: Some(Decimal::from(4)),
                note: Some(None),
                category_id: Some(None),
                ..TransactionUpdate::default()
            },
        )
        .unwrap();
    let edited = store.get_transaction(id).unwrap().unwrap();
    assert_eq!(edited.amount, Decimal::from(4));
    assert_eq!(edited.note, None);
    assert_eq!(edited.category_id, None);
    assert_eq!(edited.title, "Coffee");
    assert_eq!(edited.created_at, tx.created_at);
    assert!(edited.updated_at > tx.updated_at);

    store.delete_transaction(id).unwrap();
    assert!(store.get_transaction(id).unwrap().is_none());
    assert!(matches!(store.delete_transaction(id), Err(Error::NotFound(_))));
    assert!(matches!(
        store.update_transaction(
            id,
            &TransactionUpdate {
                title: Some("x".into()),
                ..TransactionUpdate::default()
            }
        ),
        Err(Error::NotFound(_))
    ));
}

#[test]
fn invalid_amounts_and_titles_are_rejected() {
    let store = Store::open_in_memory().unwrap();
    let zero = expense("Nothing", 0, None, at(2025, 1, 1, 0));
    assert!(matches!(store.add_transaction(&zero), Err(Error::InvalidInput(_))));
    let negative = expense("Refund", -5, None, at(2025, 1, 1, 0));
    assert!(matches!(store.add_transaction(&negative), Err(Error::InvalidInput(_))));
    let untitled = expense("   ", 5, None, at(2025, 1, 1, 0));
    assert!(matches!(store.add_transaction(&untitled), Err(Error::InvalidInput(_))));
    assert_eq!(store.revision(), 0);
    let too_large = NewTransaction {
        amount: Decimal::MAX,
        ..expense("Yacht", 1, None, at(2025, 1, 1, 0))
    };
    assert!(matches!(store.add_transaction(&too_large), Err(Error::InvalidInput(_))));
    let at_limit = expense("House", MAX_AMOUNT, None, at(2025, 1, 1, 0));
    let id = store.add_transaction(&at_limit).unwrap();
    let over = TransactionUpdate {
        amount: Some(Decimal::from(MAX_AMOUNT) + Decimal::ONE),
        ..TransactionUpdate::default()
    };
    assert!(matches!(store.update_transaction(id, &over), Err(Error::InvalidInput(_))));
    assert_eq!(store.revision(), 1);
}

#[test]
fn listing_filters_orders_and_pages() {
    let store = Store::open_in_memory().unwrap();
    let food = category_id(&store, "Food");
    let transport = category_id(&store, "Transport");
    for day in 1..=6 {
        let cat = if day % 2 == 0 { food } else { transport };
        store
            .add_transaction(&expense(&format!("day {}", day), day, Some(cat), at(2025, 1, day as u32, 10)))
            .unwrap();
    }
    store
        .add_transaction(&NewTransaction {
            title: "Salary".into(),
            amount: Decimal::from(1_000),
            r#type: TransactionType::Income,
            category_id: None,
            note: None,
            occurred_at: at(2025, 1, 3, 9),
        })
        .unwrap();

    let all = store.list_transactions(&TransactionFilters::default()).unwrap();
    assert_eq!(all.len(), 7);
    assert_eq!(all[0].title, "day 6");
    assert!(all.windows(2).all(|w| w[0].occurred_at >= w[1].occurred_at));

    let page = store
        .list_transactions(&TransactionFilters {
            limit: Some(2),
            offset: 1,
            ..TransactionFilters::default()
        })
        .unwrap();
    let titles: Vec<&str> = page.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, ["day 5", "day 4"]);

    let skipped = store
        .list_transactions(&TransactionFilters {
            offset: 5,
            ..TransactionFilters::default()
        })
        .unwrap();
    assert_eq!(skipped.len(), 2);

    let income = store
        .list_transactions(&TransactionFilters {
            r#type: Some(TransactionType::Income),
            ..TransactionFilters::default()
        })
        .unwrap();
    assert_eq!(income.len(), 1);

    let food_only = store
        .list_transactions_with_category(&TransactionFilters {
            category_id: Some(food),
            ..TransactionFilters::default()
        })
        .unwrap();
    assert_eq!(food_only.len(), 3);
    assert!(food_only.iter().all(|t| t.category_name.as_deref() == Some("Food")));
    assert!(food_only.iter().all(|t| t.category_color.is_some()));

    let window = store
        .list_transactions_in_range(at(2025, 1, 2, 10), at(2025, 1, 4, 10), None, None)
        .unwrap();
    let titles: Vec<&str> = window.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, ["day 4", "day 3", "Salary", "day 2"]);
}

#[test]
fn mutations_bump_revision_and_notify_subscribers() {
    let store = Store::open_in_memory().unwrap();
    let events = store.subscribe();

    let id = store
        .add_transaction(&expense("Taxi", 20, None, at(2025, 1, 1, 1)))
        .unwrap();
    store
        .add_category(&NewCategory {
            name: "Travel".into(),
            r#type: TransactionType::Expense,
            icon: None,
            color: None,
        })
        .unwrap();
    store.delete_category(category_id(&store, "Travel")).unwrap();
    store.delete_transaction(id).unwrap();

    let received: Vec<_> = events.try_iter().collect();
    let scopes: Vec<ViewScope> = received.iter().map(|e| e.scope).collect();
    assert_eq!(
        scopes,
        [
            ViewScope::Transactions,
            ViewScope::Categories,
            ViewScope::All,
            ViewScope::Transactions
        ]
    );
    let revisions: Vec<u64> = received.iter().map(|e| e.revision).collect();
    assert_eq!(revisions, [1, 2, 3, 4]);
    assert_eq!(store.revision(), 4);
}

#[test]
fn dropped_subscribers_are_pruned() {
    let store = Store::open_in_memory().unwrap();
    drop(store.subscribe());
    let live = store.subscribe();
    store.delete_all_transactions().unwrap();
    assert_eq!(live.try_iter().count(), 1);
}

#[test]
fn reset_reopens_and_notifies() {
    let mut store = Store::open_in_memory().unwrap();
    store
        .add_transaction(&expense("Snack", 2, None, at(2025, 1, 1, 1)))
        .unwrap();
    let events = store.subscribe();

    store.reset().unwrap();
    let ev = events.try_recv().unwrap();
    assert_eq!(ev.scope, ViewScope::All);

    // In-memory stores come back with only the defaults.
    assert!(store
        .list_transactions(&TransactionFilters::default())
        .unwrap()
        .is_empty());
    assert_eq!(
        store.list_categories(None).unwrap().len(),
        DEFAULT_CATEGORIES.len()
    );
}

#[test]
fn delete_all_transactions_keeps_categories() {
    let store = Store::open_in_memory().unwrap();
    for i in 1..=3 {
        store
            .add_transaction(&expense("x", i, None, at(2025, 1, i as u32, 1)))
            .unwrap();
    }
    assert_eq!(store.delete_all_transactions().unwrap(), 3);
    assert_eq!(store.delete_all_transactions().unwrap(), 0);
    assert_eq!(
        store.list_categories(None).unwrap().len(),
        DEFAULT_CATEGORIES.len()
    );
}
