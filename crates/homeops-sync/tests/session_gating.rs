mod common;

use common::{
    drain, fixture_records, record, session_for, wait_until, FakeSessionProvider,
    GatedRecordStore,
};
use homeops_sync::{
    Category, Dashboard, NewRecord, ProviderError, StoreError, SyncState, LOAD_FAILED,
    SESSION_UNAVAILABLE,
};

async fn started(
    provider: &std::sync::Arc<FakeSessionProvider>,
    store: &std::sync::Arc<GatedRecordStore>,
) -> Dashboard {
    let dashboard = Dashboard::new(provider.clone(), store.clone());
    dashboard.start().await;
    dashboard
}

#[tokio::test(start_paused = true)]
async fn starts_signed_out_with_nothing_loading() {
    let provider = FakeSessionProvider::immediate();
    let store = GatedRecordStore::new();
    let dashboard = started(&provider, &store).await;

    assert_eq!(dashboard.session(), None);
    assert!(dashboard.records().is_empty());
    assert!(!dashboard.is_auth_loading());
    assert!(!dashboard.is_data_loading());
    assert_eq!(store.fetches(), 0);
}

#[tokio::test(start_paused = true)]
async fn initial_session_triggers_fetch() {
    let provider = FakeSessionProvider::immediate();
    let alice = session_for("alice@example.com");
    provider.set_current(Ok(Some(alice.clone())));
    let store = GatedRecordStore::new();
    let dashboard = started(&provider, &store).await;

    assert_eq!(dashboard.session(), Some(alice.clone()));
    assert!(dashboard.is_data_loading());

    store.answer(&alice, Ok(fixture_records())).await;
    let snapshot = dashboard.settled().await;

    assert_eq!(snapshot.state, SyncState::Loaded);
    assert_eq!(snapshot.records.to_vec(), fixture_records());
    assert_eq!(dashboard.data_error(), None);
}

#[tokio::test(start_paused = true)]
async fn events_ending_in_absence_leave_nothing_behind() {
    let provider = FakeSessionProvider::immediate();
    let store = GatedRecordStore::new();
    let dashboard = started(&provider, &store).await;
    let a = session_for("a@example.com");
    let b = session_for("b@example.com");

    provider.emit(Some(a.clone()));
    provider.emit(Some(b.clone()));
    provider.emit(None);
    wait_until(|| dashboard.session().is_none() && store.fetches() == 2).await;

    store.answer(&a, Ok(vec![record("a1", "From a")])).await;
    store
        .answer(&b, Err(StoreError::Transport("timeout".into())))
        .await;
    drain().await;

    assert!(dashboard.records().is_empty());
    assert_eq!(dashboard.data_error(), None);
    assert!(!dashboard.is_data_loading());
}

#[tokio::test(start_paused = true)]
async fn slow_fetch_for_earlier_session_loses_to_later_one() {
    let provider = FakeSessionProvider::immediate();
    let store = GatedRecordStore::new();
    let dashboard = started(&provider, &store).await;
    let slow = session_for("slow@example.com");
    let fast = session_for("fast@example.com");

    provider.emit(Some(slow.clone()));
    provider.emit(Some(fast.clone()));
    wait_until(|| dashboard.session() == Some(fast.clone())).await;

    store.answer(&fast, Ok(vec![record("f1", "Fast")])).await;
    let snapshot = dashboard.settled().await;
    assert_eq!(snapshot.records.len(), 1);
    assert_eq!(snapshot.records[0].id, "f1");

    store.answer(&slow, Ok(vec![record("s1", "Slow")])).await;
    drain().await;

    let records = dashboard.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, "f1");
    assert_eq!(dashboard.snapshot().state, SyncState::Loaded);
}

#[tokio::test(start_paused = true)]
async fn fetch_failure_shows_message_and_no_records() {
    let provider = FakeSessionProvider::immediate();
    let store = GatedRecordStore::new();
    let dashboard = started(&provider, &store).await;
    let alice = session_for("alice@example.com");

    provider.emit(Some(alice.clone()));
    store
        .answer(
            &alice,
            Err(StoreError::Supabase {
                status: 500,
                message: "relation \"entries\" does not exist".into(),
            }),
        )
        .await;
    let snapshot = dashboard.settled().await;

    assert_eq!(snapshot.state, SyncState::Failed);
    assert!(snapshot.records.is_empty());
    assert_eq!(
        dashboard.data_error().as_deref(),
        Some("relation \"entries\" does not exist")
    );
}

#[tokio::test(start_paused = true)]
async fn non_textual_fetch_failure_uses_generic_label() {
    let provider = FakeSessionProvider::immediate();
    let store = GatedRecordStore::new();
    let dashboard = started(&provider, &store).await;
    let alice = session_for("alice@example.com");

    provider.emit(Some(alice.clone()));
    store.answer(&alice, Err(StoreError::Unknown)).await;
    dashboard.settled().await;

    assert_eq!(dashboard.data_error().as_deref(), Some(LOAD_FAILED));
}

#[tokio::test(start_paused = true)]
async fn new_session_clears_previous_failure() {
    let provider = FakeSessionProvider::immediate();
    let store = GatedRecordStore::new();
    let dashboard = started(&provider, &store).await;
    let a = session_for("a@example.com");
    let b = session_for("b@example.com");

    provider.emit(Some(a.clone()));
    store.answer(&a, Err(StoreError::Unknown)).await;
    dashboard.settled().await;
    assert!(dashboard.data_error().is_some());

    provider.emit(Some(b.clone()));
    wait_until(|| dashboard.session() == Some(b.clone())).await;
    assert_eq!(dashboard.data_error(), None);
    assert!(dashboard.is_data_loading());

    store.answer(&b, Ok(fixture_records())).await;
    let snapshot = dashboard.settled().await;
    assert_eq!(snapshot.records.len(), 3);
    assert_eq!(snapshot.error, None);
}

#[tokio::test(start_paused = true)]
async fn lookup_failure_is_reported_and_recoverable() {
    let provider = FakeSessionProvider::immediate();
    provider.set_current(Err(ProviderError::Unknown));
    let store = GatedRecordStore::new();
    let dashboard = started(&provider, &store).await;

    assert_eq!(dashboard.session(), None);
    assert_eq!(dashboard.auth_error().as_deref(), Some(SESSION_UNAVAILABLE));

    provider.emit(Some(session_for("later@example.com")));
    wait_until(|| dashboard.session().is_some()).await;
    assert_eq!(store.fetches(), 1);
}

#[tokio::test(start_paused = true)]
async fn event_during_lookup_wins_over_lookup_result() {
    let provider = FakeSessionProvider::immediate();
    let release = provider.hold_lookup();
    let store = GatedRecordStore::new();
    let dashboard = std::sync::Arc::new(Dashboard::new(provider.clone(), store.clone()));

    let starting = tokio::spawn({
        let dashboard = dashboard.clone();
        async move { dashboard.start().await }
    });
    wait_until(|| dashboard.is_auth_loading() && provider.subscriber_count() == 1).await;

    let newer = session_for("newer@example.com");
    provider.emit(Some(newer.clone()));
    wait_until(|| dashboard.session().is_some()).await;

    let _ = release.send(());
    starting.await.expect("start panicked");

    assert_eq!(dashboard.session(), Some(newer));
    assert!(!dashboard.is_auth_loading());
}

#[tokio::test(start_paused = true)]
async fn teardown_suppresses_fetches_and_events() {
    let provider = FakeSessionProvider::immediate();
    let alice = session_for("alice@example.com");
    provider.set_current(Ok(Some(alice.clone())));
    let store = GatedRecordStore::new();
    let dashboard = started(&provider, &store).await;
    assert!(dashboard.is_data_loading());

    dashboard.teardown();

    store.answer(&alice, Ok(fixture_records())).await;
    provider.emit(Some(session_for("bob@example.com")));
    drain().await;

    assert_eq!(dashboard.session(), Some(alice));
    assert!(dashboard.records().is_empty());
    assert_eq!(store.fetches(), 1);
    wait_until(|| provider.subscriber_count() == 0).await;
}

#[tokio::test(start_paused = true)]
async fn dropping_the_dashboard_releases_the_subscription() {
    let provider = FakeSessionProvider::immediate();
    let store = GatedRecordStore::new();
    let dashboard = started(&provider, &store).await;
    assert_eq!(provider.subscriber_count(), 1);

    drop(dashboard);
    wait_until(|| provider.subscriber_count() == 0).await;
}

#[tokio::test(start_paused = true)]
async fn teardown_is_idempotent() {
    let provider = FakeSessionProvider::immediate();
    let store = GatedRecordStore::new();
    let dashboard = started(&provider, &store).await;

    dashboard.teardown();
    dashboard.teardown();
    dashboard.start().await;

    provider.emit(Some(session_for("alice@example.com")));
    drain().await;
    assert_eq!(dashboard.session(), None);
}

#[tokio::test(start_paused = true)]
async fn reload_refetches_under_new_generation() {
    let provider = FakeSessionProvider::immediate();
    let alice = session_for("alice@example.com");
    provider.set_current(Ok(Some(alice.clone())));
    let store = GatedRecordStore::new();
    let dashboard = started(&provider, &store).await;

    let first = dashboard.snapshot().generation;
    let second = dashboard.reload().expect("signed in");
    assert!(second > first);

    // The superseded fetch is answered first and ignored.
    store.answer(&alice, Ok(vec![record("old", "Old")])).await;
    store.answer(&alice, Ok(fixture_records())).await;
    drain().await;

    assert_eq!(dashboard.records().to_vec(), fixture_records());
}

#[tokio::test(start_paused = true)]
async fn reload_without_session_does_nothing() {
    let provider = FakeSessionProvider::immediate();
    let store = GatedRecordStore::new();
    let dashboard = started(&provider, &store).await;

    assert_eq!(dashboard.reload(), None);
    assert_eq!(store.fetches(), 0);
}

#[tokio::test(start_paused = true)]
async fn create_record_reloads_entries() {
    let provider = FakeSessionProvider::immediate();
    let alice = session_for("alice@example.com");
    provider.set_current(Ok(Some(alice.clone())));
    let store = GatedRecordStore::new();
    let dashboard = started(&provider, &store).await;
    store.answer(&alice, Ok(fixture_records())).await;
    dashboard.settled().await;

    let created = dashboard
        .create_record(NewRecord::new(Category::Repair, "Gutter bracket").with_value(18.5))
        .await
        .expect("create failed");
    assert_eq!(created.title, "Gutter bracket");
    assert_eq!(store.created().len(), 1);
    assert!(dashboard.is_data_loading());

    let mut refreshed = vec![created.clone()];
    refreshed.extend(fixture_records());
    store.answer(&alice, Ok(refreshed)).await;
    let snapshot = dashboard.settled().await;

    assert_eq!(snapshot.records.len(), 4);
    assert_eq!(snapshot.records[0], created);
}

#[tokio::test(start_paused = true)]
async fn create_record_while_signed_out_fails() {
    let provider = FakeSessionProvider::immediate();
    let store = GatedRecordStore::new();
    let dashboard = started(&provider, &store).await;

    let err = dashboard
        .create_record(NewRecord::new(Category::Todo, "Paint trim"))
        .await
        .unwrap_err();

    assert_eq!(err, StoreError::Unauthenticated);
    assert!(store.created().is_empty());
}
