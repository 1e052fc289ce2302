//! Tests for context cancellation and export collection.


use core::future::pending;
use std::time::Duration;

use serde_json::json;
use strata_output::{
    Context, Dependencies, ExportError, ExportedValue, OutputError, OutputState, all,
};
use test_utils::{CallCounter, deferred};

// ═══════════════════════════════════════════════════════════════════════════════
// CANCELLATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Verifies that a pending resolution settles as cancelled once the context is cancelled.
#[tokio::test]
async fn cancel_settles_pending_outputs() {
    let ctx = Context::new("infra", "dev");
    let never = ctx.from_future(pending::<OutputState<String>>(), &Dependencies::new());

    let waiter = tokio::spawn({
        let never = never.clone();
        async move { never.state().await }
    });
    tokio::time::sleep(Duration::from_millis(10)).await;
    ctx.cancel();

    let state = tokio::time::timeout(Duration::from_secs(1), waiter)
        .await
        .expect("cancellation should settle the output")
        .unwrap();
    assert!(matches!(state, OutputState::Failed(OutputError::Cancelled)));
}

/// Verifies that a value arriving after cancellation is discarded.
#[tokio::test]
async fn value_arriving_after_cancel_is_discarded() {
    let ctx = Context::new("infra", "dev");
    let (tx, rx) = tokio::sync::oneshot::channel::<i32>();
    let late = ctx.from_future(
        async move { rx.await.map_or(OutputState::Unknown, OutputState::Known) },
        &Dependencies::new(),
    );

    let waiter = tokio::spawn({
        let late = late.clone();
        async move { late.state().await }
    });
    tokio::time::sleep(Duration::from_millis(10)).await;

    ctx.cancel();
    tx.send(7).unwrap();

    let state = tokio::time::timeout(Duration::from_secs(1), waiter)
        .await
        .expect("cancellation should settle the output")
        .unwrap();
    assert!(matches!(state, OutputState::Failed(OutputError::Cancelled)));
    assert!(matches!(
        late.state().await,
        OutputState::Failed(OutputError::Cancelled)
    ));
}

/// Verifies that a callback registered before cancellation never runs afterwards.
#[tokio::test]
async fn callbacks_do_not_start_after_cancel() {
    let ctx = Context::new("infra", "dev");
    let counter = CallCounter::default();

    let hits = counter.clone();
    let derived = ctx.known(2).apply(move |n| {
        hits.hit();
        n * 2
    });

    ctx.cancel();

    assert!(matches!(
        derived.state().await,
        OutputState::Failed(OutputError::Cancelled)
    ));
    assert_eq!(counter.count(), 0);
}

/// Verifies that outputs already settled before cancellation keep their value.
#[tokio::test]
async fn settled_outputs_survive_cancel() {
    let ctx = Context::new("infra", "dev");
    let doubled = ctx.known(21).apply(|n| n * 2);
    assert!(matches!(doubled.state().await, OutputState::Known(42)));

    ctx.cancel();
    assert!(matches!(doubled.state().await, OutputState::Known(42)));
}

/// Verifies that joins over context-bound outputs inherit cancellation.
#[tokio::test]
async fn joins_inherit_cancellation() {
    let ctx = Context::new("infra", "dev");
    let (_tx, pending_input) = deferred::<i32>();
    let joined = all((ctx.known(1), pending_input));

    assert!(joined.cancellation().is_some());
    ctx.cancel();
    assert!(matches!(
        joined.state().await,
        OutputState::Failed(OutputError::Cancelled)
    ));
}

// ═══════════════════════════════════════════════════════════════════════════════
// EXPORTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Verifies that known and unknown exports are collected by name.
#[tokio::test]
async fn collects_known_and_unknown_exports() {
    let ctx = Context::new("infra", "dev").with_dry_run(true);

    ctx.export("url", &ctx.known("https://x".to_string())).unwrap();
    ctx.export("count", &ctx.known(3_i64)).unwrap();
    ctx.export("address", &ctx.unknown::<String>()).unwrap();

    let outputs = ctx.collect_exports().await.unwrap();

    assert_eq!(outputs.len(), 3);
    assert!(!outputs.is_complete());
    assert_eq!(outputs.get("url"), Some(&ExportedValue::Known(json!("https://x"))));
    assert_eq!(outputs.get("count"), Some(&ExportedValue::Known(json!(3))));
    assert_eq!(outputs.get("address"), Some(&ExportedValue::Unknown));
    assert_eq!(
        serde_json::to_value(&outputs).unwrap(),
        json!({
            "address": ExportedValue::UNKNOWN_TEXT,
            "count": 3,
            "url": "https://x",
        })
    );
}

/// Verifies that a failed export surfaces with its name.
#[tokio::test]
async fn failed_export_surfaces_with_name() {
    let ctx = Context::new("infra", "dev");
    ctx.export("ok", &ctx.known(1)).unwrap();
    ctx.export("broken", &ctx.failed::<i32>(OutputError::msg("lookup failed")))
        .unwrap();

    let err = ctx.collect_exports().await.unwrap_err();
    assert!(matches!(&err, ExportError::Failed { name, .. } if name == "broken"));
    assert_eq!(err.to_string(), "export 'broken' failed: lookup failed");
}

/// Verifies that cancelling the program reports cancellation rather than a failure.
#[tokio::test]
async fn cancelled_exports_report_cancellation() {
    let ctx = Context::new("infra", "dev");
    let never = ctx.from_future(pending::<OutputState<i32>>(), &Dependencies::new());
    ctx.export("never", &never).unwrap();
    ctx.cancel();

    assert!(matches!(
        ctx.collect_exports().await,
        Err(ExportError::Cancelled)
    ));
}

/// Verifies that the dependency graph records registered resources in order.
#[tokio::test]
async fn resource_graph_tracks_dependencies() {
    let ctx = Context::new("infra", "dev");
    let bucket = ctx.urn_for("pkg:storage:Bucket", "logs");
    let reader = ctx.urn_for("pkg:compute:Reader", "ingest");

    ctx.register_resource(bucket.clone(), Dependencies::new()).unwrap();
    ctx.register_resource(reader.clone(), Dependencies::single(bucket.clone()))
        .unwrap();

    assert!(ctx.contains_resource(&bucket));
    assert!(ctx.dependencies_of(&reader).unwrap().contains(&bucket));
    assert_eq!(ctx.resource_urns(), vec![reader, bucket]);
}
