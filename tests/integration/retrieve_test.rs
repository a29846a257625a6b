//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 读路径集成测试

#[path = "../common/mod.rs"]
mod common;

use common::{setup_logging, test_retry_config, test_sync_config, MemorySourceStore, TestRecord};
use regionsync::backend::memory::MemoryCacheStore;
use regionsync::serialization::{JsonSerializer, SerializerEnum};
use regionsync::store::CacheStore;
use regionsync::sync::lock::LockManager;
use regionsync::{CacheCoordinator, SyncError};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

fn coordinator(
    cache: Arc<MemoryCacheStore>,
    source: Arc<MemorySourceStore>,
) -> CacheCoordinator<TestRecord> {
    CacheCoordinator::new(
        cache,
        source,
        SerializerEnum::Json(JsonSerializer::new()),
        test_sync_config("region"),
        test_retry_config(),
    )
}

#[tokio::test]
async fn cache_hit_avoids_source_store() {
    setup_logging();

    let cache = Arc::new(MemoryCacheStore::new());
    let source = Arc::new(MemorySourceStore::new());
    source.seed(vec![TestRecord::new("US", "United States")]).await;

    let coordinator = coordinator(cache, source.clone());

    let first = coordinator.retrieve("US").await.expect("first retrieve");
    assert_eq!(first.name, "United States");
    assert_eq!(source.find_calls.load(Ordering::SeqCst), 1);

    // TTL内的第二次读取不应触达源存储
    let second = coordinator.retrieve("US").await.expect("second retrieve");
    assert_eq!(second, first);
    assert_eq!(source.find_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn undecodable_cache_entry_falls_back_to_source() {
    setup_logging();

    let cache = Arc::new(MemoryCacheStore::new());
    let source = Arc::new(MemorySourceStore::new());
    source.seed(vec![TestRecord::new("US", "United States")]).await;

    // 写入无法反序列化的脏数据
    cache
        .set_with_ttl("region:US", b"{not json".to_vec(), 60)
        .await
        .unwrap();

    let coordinator = coordinator(cache.clone(), source.clone());
    let record = coordinator.retrieve("US").await.expect("retrieve");
    assert_eq!(record.name, "United States");
    assert_eq!(source.find_calls.load(Ordering::SeqCst), 1);

    // 脏数据已被正确值覆盖
    let bytes = cache.get("region:US").await.unwrap().expect("entry");
    let decoded: TestRecord = serde_json::from_slice(&bytes).expect("decodable");
    assert_eq!(decoded, record);
}

#[tokio::test]
async fn missing_key_fails_without_looping() {
    setup_logging();

    let cache = Arc::new(MemoryCacheStore::new());
    let source = Arc::new(MemorySourceStore::new());

    let coordinator = coordinator(cache, source.clone());
    let result = coordinator.retrieve("missing-key").await;
    assert!(matches!(result, Err(SyncError::NotFound(_))));
    // 未找到是终态，不应重复回源
    assert_eq!(source.find_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn lock_is_released_after_not_found() {
    setup_logging();

    let cache = Arc::new(MemoryCacheStore::new());
    let source = Arc::new(MemorySourceStore::new());

    let coordinator = coordinator(cache.clone(), source.clone());
    let result = coordinator.retrieve("missing-key").await;
    assert!(matches!(result, Err(SyncError::NotFound(_))));

    // 未找到路径上按键锁同样被释放，临界区立即可重入
    let locks = LockManager::new(cache);
    assert!(locks
        .acquire("lock:region:missing-key", 5)
        .await
        .unwrap()
        .is_some());

    // 记录补齐后同一个键可以正常读取
    source.seed(vec![TestRecord::new("late", "arrived late")]).await;
    let record = coordinator.retrieve("late").await.expect("retrieve");
    assert_eq!(record.name, "arrived late");
}

#[tokio::test]
async fn held_lock_exhausts_attempts_with_contention_error() {
    setup_logging();

    let cache = Arc::new(MemoryCacheStore::new());
    let source = Arc::new(MemorySourceStore::new());
    source.seed(vec![TestRecord::new("US", "United States")]).await;

    // 外部持有按键锁且从不释放
    let locks = LockManager::new(cache.clone());
    let _token = locks
        .acquire("lock:region:US", 60)
        .await
        .unwrap()
        .expect("pre-acquired");

    let mut config = test_sync_config("region");
    config.lock_max_attempts = 3;
    let coordinator: CacheCoordinator<TestRecord> = CacheCoordinator::new(
        cache,
        source.clone(),
        SerializerEnum::Json(JsonSerializer::new()),
        config,
        test_retry_config(),
    );

    let result = coordinator.retrieve("US").await;
    assert!(matches!(result, Err(SyncError::LockContention(_))));
    // 锁从未到手，不应触达源存储
    assert_eq!(source.find_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn final_contention_attempt_fails_without_delay() {
    setup_logging();

    let cache = Arc::new(MemoryCacheStore::new());
    let source = Arc::new(MemorySourceStore::new());

    let locks = LockManager::new(cache.clone());
    let _token = locks
        .acquire("lock:region:US", 60)
        .await
        .unwrap()
        .expect("pre-acquired");

    // 仅一轮尝试、超长重试延迟：失败必须立即返回而不是先睡满延迟
    let mut config = test_sync_config("region");
    config.lock_max_attempts = 1;
    config.lock_retry_delay_ms = 500;
    let coordinator: CacheCoordinator<TestRecord> = CacheCoordinator::new(
        cache,
        source,
        SerializerEnum::Json(JsonSerializer::new()),
        config,
        test_retry_config(),
    );

    let started = Instant::now();
    let result = coordinator.retrieve("US").await;
    assert!(matches!(result, Err(SyncError::LockContention(_))));
    assert!(started.elapsed() < Duration::from_millis(250));
}

#[tokio::test]
async fn zero_lock_attempts_still_serves_cached_value() {
    setup_logging();

    let cache = Arc::new(MemoryCacheStore::new());
    let source = Arc::new(MemorySourceStore::new());
    cache
        .set_with_ttl(
            "region:US",
            serde_json::to_vec(&TestRecord::new("US", "United States")).unwrap(),
            60,
        )
        .await
        .unwrap();

    // 配置为0时至少仍要走一轮缓存查找
    let mut config = test_sync_config("region");
    config.lock_max_attempts = 0;
    let coordinator: CacheCoordinator<TestRecord> = CacheCoordinator::new(
        cache,
        source.clone(),
        SerializerEnum::Json(JsonSerializer::new()),
        config,
        test_retry_config(),
    );

    let record = coordinator.retrieve("US").await.expect("cached value");
    assert_eq!(record.name, "United States");
    assert_eq!(source.find_calls.load(Ordering::SeqCst), 0);
}
