//! Store wrapper metrics regression tests

use super::helpers::*;
use kv_resilience_store::{MemoryStore, ResilientStore};
use serial_test::serial;

#[tokio::test]
#[serial]
async fn store_operation_metrics_exist() {
    init_recorder();

    let store = ResilientStore::builder(MemoryStore::new())
        .name("test_store")
        .build();

    store.write("k1", "v1").await;
    store.read("k1").await;
    store.read("missing").await;
    store.delete_all().await;

    assert_counter_exists("kv_store_operations_total");
    assert_metric_has_label("kv_store_operations_total", "store", "test_store");
    assert_metric_has_label("kv_store_operations_total", "operation", "write");
    assert_metric_has_label("kv_store_operations_total", "operation", "read");
    assert_metric_has_label("kv_store_operations_total", "operation", "delete_all");
    assert_metric_has_label("kv_store_operations_total", "result", "completed");
    assert_metric_has_label("kv_store_operations_total", "result", "found");
    assert_metric_has_label("kv_store_operations_total", "result", "not_found");
    assert_metric_has_label("kv_store_operations_total", "result", "deleted");
}

#[tokio::test]
#[serial]
async fn store_degraded_metrics() {
    init_recorder();

    let memory = std::sync::Arc::new(MemoryStore::new());
    memory.set_outage(true);
    let store = ResilientStore::builder(std::sync::Arc::clone(&memory))
        .name("degraded_store")
        .build();

    store.write("k1", "v1").await;
    store.read("k1").await;
    store.delete_all().await;

    assert_metric_has_label("kv_store_operations_total", "store", "degraded_store");
    assert_metric_has_label("kv_store_operations_total", "result", "failed");
    assert_metric_has_label("kv_store_operations_total", "result", "fallback");
    assert_metric_has_label("kv_store_operations_total", "result", "error");
}
