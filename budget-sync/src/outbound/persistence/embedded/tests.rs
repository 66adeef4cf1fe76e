//! Tests for the embedded store.

use std::sync::Arc;

use camino::Utf8PathBuf;
use chrono::NaiveDate;
use rstest::{fixture, rstest};

use super::*;
use crate::domain::{
    Amount, Category, EntryType, FailureKind, NewCategory, NewTransaction, Transaction,
    TransactionPatch,
};
use crate::test_support::{MutableClock, temp_store_dir};

struct Store {
    _tmp: tempfile::TempDir,
    path: Utf8PathBuf,
    transactions: EmbeddedStore<Transaction>,
}

fn open_at(path: &Utf8PathBuf, quota: StoreQuota) -> EmbeddedStore<Transaction> {
    EmbeddedStore::open(path, quota, Arc::new(MutableClock::fixed())).expect("open store")
}

#[fixture]
fn store() -> Store {
    let tmp = temp_store_dir();
    let path = Utf8PathBuf::from_path_buf(tmp.path().join("data")).expect("utf-8 temp path");
    let transactions = open_at(&path, StoreQuota::default());
    Store {
        _tmp: tmp,
        path,
        transactions,
    }
}

fn owner(id: &str) -> OwnerId {
    OwnerId::new(id).expect("owner")
}

fn lunch() -> NewTransaction {
    NewTransaction {
        amount: Amount::from_f64(75.5).expect("amount"),
        category: "Food".to_owned(),
        entry_type: EntryType::Expense,
        description: "Lunch".to_owned(),
        occurred_on: NaiveDate::from_ymd_opt(2025, 11, 16).expect("date"),
    }
}

#[rstest]
#[tokio::test]
async fn created_entities_get_canonical_ids_and_survive_reopening(store: Store) {
    let alice = owner("alice");
    let created = store
        .transactions
        .create(&alice, &lunch())
        .await
        .expect("create");

    assert!(!created.id().is_temporary());
    assert_eq!(created.to_draft(), lunch());
    assert_eq!(created.created_at(), MutableClock::fixed().utc());

    let reopened = open_at(&store.path, StoreQuota::default());
    let loaded = reopened.get_all(&alice).await.expect("load");
    assert_eq!(loaded, vec![created]);
}

#[rstest]
#[tokio::test]
async fn owners_never_see_each_other(store: Store) {
    store
        .transactions
        .create(&owner("alice"), &lunch())
        .await
        .expect("create");

    let bob = store
        .transactions
        .get_all(&owner("bob"))
        .await
        .expect("load");
    assert!(bob.is_empty());
}

#[rstest]
#[tokio::test]
async fn update_and_delete_address_entities_by_id(store: Store) {
    let alice = owner("alice");
    let first = store.transactions.create(&alice, &lunch()).await.expect("create");
    let second = store.transactions.create(&alice, &lunch()).await.expect("create");

    let updated = store
        .transactions
        .update(
            &alice,
            first.id(),
            &TransactionPatch {
                description: Some("Dinner".to_owned()),
                ..TransactionPatch::default()
            },
        )
        .await
        .expect("update");
    assert_eq!(updated.description(), "Dinner");

    store
        .transactions
        .delete(&alice, second.id())
        .await
        .expect("delete");

    let loaded = store.transactions.get_all(&alice).await.expect("load");
    assert_eq!(loaded, vec![updated]);
}

#[rstest]
#[tokio::test]
async fn missing_ids_are_client_errors(store: Store) {
    let alice = owner("alice");
    let missing = EntityId::canonical("nope");

    let err = store
        .transactions
        .delete(&alice, &missing)
        .await
        .expect_err("missing");
    assert_eq!(err.kind(), FailureKind::ClientRequest { status: 404 });

    let err = store
        .transactions
        .update(&alice, &missing, &TransactionPatch::default())
        .await
        .expect_err("missing");
    assert_eq!(err.kind(), FailureKind::ClientRequest { status: 404 });
}

#[rstest]
#[tokio::test]
async fn writes_fail_fast_near_the_quota(store: Store) {
    let tiny = open_at(&store.path, StoreQuota::new(64));
    let alice = owner("alice");

    let err = tiny.create(&alice, &lunch()).await.expect_err("over quota");

    assert_eq!(err.kind(), FailureKind::QuotaExceeded);
    assert!(tiny.get_all(&alice).await.expect("load").is_empty());
}

#[rstest]
#[tokio::test]
async fn collections_are_stored_separately(store: Store) {
    let categories: EmbeddedStore<Category> =
        EmbeddedStore::open(&store.path, StoreQuota::default(), Arc::new(MutableClock::fixed()))
            .expect("open");
    let alice = owner("alice");
    store.transactions.create(&alice, &lunch()).await.expect("create");
    categories
        .create(
            &alice,
            &NewCategory {
                name: "Food".to_owned(),
                color: "#ff8800".to_owned(),
                icon: "utensils".to_owned(),
                entry_type: EntryType::Expense,
            },
        )
        .await
        .expect("create category");

    assert_eq!(store.transactions.get_all(&alice).await.expect("load").len(), 1);
    assert_eq!(categories.get_all(&alice).await.expect("load").len(), 1);
}

#[test]
fn document_names_hash_the_owner() {
    let name = document_name("transactions", &owner("../../etc/passwd"));
    assert!(name.starts_with("transactions-"));
    assert!(name.ends_with(".json"));
    assert!(!name.contains('/'));
    assert_eq!(name.len(), "transactions-".len() + 64 + ".json".len());
}

fn food() -> NewCategory {
    NewCategory {
        name: "Food".to_owned(),
        color: "#ff8800".to_owned(),
        icon: "utensils".to_owned(),
        entry_type: EntryType::Expense,
    }
}

fn stored_bytes(path: &Utf8PathBuf) -> u64 {
    std::fs::read_dir(path)
        .expect("list store")
        .map(|entry| entry.expect("entry").metadata().expect("metadata").len())
        .sum()
}

#[rstest]
#[tokio::test]
async fn stores_on_one_directory_share_a_root(store: Store) {
    let categories: EmbeddedStore<Category> =
        EmbeddedStore::open(&store.path, StoreQuota::default(), Arc::new(MutableClock::fixed()))
            .expect("open");
    let elsewhere = temp_store_dir();
    let other = open_at(
        &Utf8PathBuf::from_path_buf(elsewhere.path().to_path_buf()).expect("utf-8 path"),
        StoreQuota::default(),
    );

    assert!(Arc::ptr_eq(&store.transactions.root, &categories.root));
    assert!(!Arc::ptr_eq(&store.transactions.root, &other.root));
}

#[rstest]
#[tokio::test]
async fn concurrent_writes_to_different_collections_respect_one_quota(store: Store) {
    let alice = owner("alice");
    let categories: EmbeddedStore<Category> =
        EmbeddedStore::open(&store.path, StoreQuota::default(), Arc::new(MutableClock::fixed()))
            .expect("open");
    store.transactions.create(&alice, &lunch()).await.expect("create");
    let transaction_bytes = stored_bytes(&store.path);
    categories.create(&alice, &food()).await.expect("create category");
    let category_bytes = stored_bytes(&store.path) - transaction_bytes;

    // Either document fits under the threshold on its own; both do not.
    let largest = transaction_bytes.max(category_bytes);
    let quota = StoreQuota::new((largest * 100).div_ceil(90));
    let bob = owner("bob");
    let fresh = temp_store_dir();
    let path = Utf8PathBuf::from_path_buf(fresh.path().to_path_buf()).expect("utf-8 path");
    let transactions = open_at(&path, quota);
    let categories: EmbeddedStore<Category> =
        EmbeddedStore::open(&path, quota, Arc::new(MutableClock::fixed())).expect("open");

    let lunch = lunch();
    let food = food();
    let (a, b) = tokio::join!(
        transactions.create(&bob, &lunch),
        categories.create(&bob, &food),
    );

    let outcomes = [a.is_ok(), b.is_ok()];
    assert_eq!(outcomes.iter().filter(|ok| **ok).count(), 1);
    let failure = a.err().or(b.err()).expect("one write rejected");
    assert_eq!(failure.kind(), FailureKind::QuotaExceeded);
    assert!(stored_bytes(&path) <= quota.threshold_bytes());
}
