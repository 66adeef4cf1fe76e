//! Tests for the REST backend.

use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::json;

use super::*;
use crate::domain::{
    Amount, Category, EntryType, FailureKind, NewTransaction, SyncEntity, Transaction,
    TransactionPatch,
};
use crate::outbound::http::{
    HttpMethod, IDEMPOTENCY_KEY_HEADER, RawResponse, TransportRuntime, TransportSettings,
};
use crate::test_support::{
    ImmediateSleeper, MutableClock, NoJitter, RecordingLogger, ScriptedExecutor,
};

fn api<E: WireEntity>(executor: &Arc<ScriptedExecutor>) -> RemoteApi<E> {
    let transport = HttpTransport::new(
        executor.clone(),
        Arc::new(RecordingLogger::default()),
        TransportSettings::default(),
        TransportRuntime {
            sleeper: Arc::new(ImmediateSleeper),
            jitter: Arc::new(NoJitter),
            clock: Arc::new(MutableClock::fixed()),
        },
    );
    let base = Url::parse("https://api.example.test/v1/").expect("base url");
    RemoteApi::new(transport, base, RetryPolicy::default())
}

fn owner() -> OwnerId {
    OwnerId::new("user 1").expect("owner")
}

fn wire_transaction(id: &str, user: &str) -> serde_json::Value {
    json!({
        "id": id,
        "userId": user,
        "postedAt": "2025-11-16",
        "amountMinor": 7550,
        "type": "expense",
        "category": "Food",
        "description": "Lunch",
        "createdAt": "2025-11-16T09:00:00Z"
    })
}

#[tokio::test]
async fn lists_under_the_owner_path_and_drops_foreign_entities() {
    let executor = Arc::new(ScriptedExecutor::new([Ok(RawResponse::json(
        200,
        &json!([
            wire_transaction("tx-1", "user 1"),
            wire_transaction("tx-2", "someone-else")
        ]),
    ))]));
    let api = api::<Transaction>(&executor);

    let listed = api.get_all(&owner()).await.expect("listed");

    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id(), &EntityId::canonical("tx-1"));
    let request = &executor.requests()[0];
    assert_eq!(request.method, HttpMethod::Get);
    assert_eq!(
        request.url.as_str(),
        "https://api.example.test/v1/users/user%201/transactions"
    );
}

#[tokio::test]
async fn creates_are_idempotent_posts_in_minor_units() {
    let executor = Arc::new(ScriptedExecutor::new([
        Ok(RawResponse::empty(503)),
        Ok(RawResponse::json(201, &wire_transaction("tx-9", "user 1"))),
    ]));
    let api = api::<Transaction>(&executor);
    let draft = NewTransaction {
        amount: Amount::from_f64(75.5).expect("amount"),
        category: "Food".to_owned(),
        entry_type: EntryType::Expense,
        description: "Lunch".to_owned(),
        occurred_on: NaiveDate::from_ymd_opt(2025, 11, 16).expect("date"),
    };

    let created = api.create(&owner(), &draft).await.expect("created");

    assert_eq!(created.id(), &EntityId::canonical("tx-9"));
    assert_eq!(created.to_draft(), draft);
    let requests = executor.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].method, HttpMethod::Post);
    assert_eq!(
        requests[0].body.as_ref().and_then(|body| body.get("amountMinor")),
        Some(&json!(7550))
    );
    assert!(requests[0].header(IDEMPOTENCY_KEY_HEADER).is_some());
    assert_eq!(
        requests[0].header(IDEMPOTENCY_KEY_HEADER),
        requests[1].header(IDEMPOTENCY_KEY_HEADER)
    );
}

#[tokio::test]
async fn updates_put_the_partial_patch_to_the_entity_path() {
    let executor = Arc::new(ScriptedExecutor::new([Ok(RawResponse::json(
        200,
        &wire_transaction("tx-1", "user 1"),
    ))]));
    let api = api::<Transaction>(&executor);
    let patch = TransactionPatch {
        description: Some("Lunch".to_owned()),
        ..TransactionPatch::default()
    };

    api.update(&owner(), &EntityId::canonical("tx-1"), &patch)
        .await
        .expect("updated");

    let request = &executor.requests()[0];
    assert_eq!(request.method, HttpMethod::Put);
    assert!(request.url.path().ends_with("/users/user%201/transactions/tx-1"));
    assert_eq!(request.body, Some(json!({"description": "Lunch"})));
    assert!(request.header(IDEMPOTENCY_KEY_HEADER).is_some());
}

#[tokio::test]
async fn deletes_accept_empty_bodies() {
    let executor = Arc::new(ScriptedExecutor::new([Ok(RawResponse::empty(204))]));
    let api = api::<Category>(&executor);

    api.delete(&owner(), &EntityId::canonical("cat-1"))
        .await
        .expect("deleted");

    let request = &executor.requests()[0];
    assert_eq!(request.method, HttpMethod::Delete);
    assert_eq!(
        request.url.path(),
        format!("/v1/users/user%201/{}/cat-1", Category::COLLECTION)
    );
}

#[tokio::test]
async fn terminal_statuses_become_domain_errors() {
    let executor = Arc::new(ScriptedExecutor::always(Ok(RawResponse::empty(500))));
    let api = api::<Transaction>(&executor);

    let err = api
        .delete(&owner(), &EntityId::canonical("tx-1"))
        .await
        .expect_err("server down");

    assert_eq!(err.kind(), FailureKind::Unknown);
    assert!(err.is_logged());
    assert!(err.trace_id().is_some());
    assert_eq!(executor.calls(), 4);
}
