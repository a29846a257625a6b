//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 写穿透路径集成测试

#[path = "../common/mod.rs"]
mod common;

use common::{
    setup_logging, test_retry_config, test_sync_config, FlakyCacheStore, MemorySourceStore,
    TestRecord,
};
use regionsync::backend::memory::MemoryCacheStore;
use regionsync::serialization::{JsonSerializer, SerializerEnum};
use regionsync::store::CacheStore;
use regionsync::{CacheCoordinator, SyncError};
use std::sync::atomic::Ordering;
use std::sync::Arc;

#[tokio::test]
async fn upsert_persists_then_updates_cache() {
    setup_logging();

    let cache = Arc::new(MemoryCacheStore::new());
    let source = Arc::new(MemorySourceStore::new());
    let coordinator: CacheCoordinator<TestRecord> = CacheCoordinator::new(
        cache.clone(),
        source.clone(),
        SerializerEnum::Json(JsonSerializer::new()),
        test_sync_config("region"),
        test_retry_config(),
    );

    let saved = coordinator
        .upsert(TestRecord::new("US", "United States"))
        .await
        .expect("upsert");
    assert!(source.contains("US").await);

    let bytes = cache.get("region:US").await.unwrap().expect("cache entry");
    let cached: TestRecord = serde_json::from_slice(&bytes).expect("decodable");
    assert_eq!(cached, saved);

    // 后续读取直接命中缓存，不回源
    let read = coordinator.retrieve("US").await.expect("retrieve");
    assert_eq!(read, saved);
    assert_eq!(source.find_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn source_failure_leaves_cache_untouched() {
    setup_logging();

    let cache = Arc::new(MemoryCacheStore::new());
    let source = Arc::new(MemorySourceStore::new());
    source.seed(vec![TestRecord::new("US", "old name")]).await;

    let coordinator: CacheCoordinator<TestRecord> = CacheCoordinator::new(
        cache.clone(),
        source.clone(),
        SerializerEnum::Json(JsonSerializer::new()),
        test_sync_config("region"),
        test_retry_config(),
    );

    // 预先填充缓存，之后源存储写入开始失败
    coordinator.retrieve("US").await.expect("warm cache");
    let before = cache.get("region:US").await.unwrap().expect("entry");
    source.fail_saves.store(true, Ordering::SeqCst);

    let result = coordinator.upsert(TestRecord::new("US", "new name")).await;
    assert!(matches!(result, Err(SyncError::StoreUnavailable { .. })));

    // 源存储写入失败时缓存不得发生任何变化
    let after = cache.get("region:US").await.unwrap().expect("entry");
    assert_eq!(before, after);
}

#[tokio::test]
async fn cache_failure_after_save_is_swallowed() {
    setup_logging();

    let inner = Arc::new(MemoryCacheStore::new());
    let cache = Arc::new(FlakyCacheStore::new(inner.clone()));
    cache.fail_set_for("region:US");

    let source = Arc::new(MemorySourceStore::new());
    let coordinator: CacheCoordinator<TestRecord> = CacheCoordinator::new(
        cache,
        source.clone(),
        SerializerEnum::Json(JsonSerializer::new()),
        test_sync_config("region"),
        test_retry_config(),
    );

    // 缓存写入失败不阻止upsert成功，记录以源存储为准
    let saved = coordinator
        .upsert(TestRecord::new("US", "United States"))
        .await
        .expect("upsert succeeds despite cache failure");
    assert_eq!(saved.name, "United States");
    assert!(source.contains("US").await);
    assert_eq!(inner.get("region:US").await.unwrap(), None);
}
