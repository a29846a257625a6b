//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块实现了缓存旁路读取（带击穿保护）和写穿透更新。

use crate::config::{RetryConfig, SyncConfig};
use crate::error::{Result, SyncError};
use crate::metrics::GLOBAL_METRICS;
use crate::serialization::{Serializer, SerializerEnum};
use crate::store::{CacheRecord, CacheStore, SourceStore};
use crate::sync::lock::LockManager;
use crate::sync::retry::RetryPolicy;
use crate::sync::{cache_key, key_lock_name};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// 缓存协调器
///
/// 读路径：缓存旁路查找，未命中时在按键锁保护下回源加载，
/// 保证同一键的并发未命中只产生一次源存储读取；
/// 写路径：先持久化到源存储，成功后写穿透更新缓存
pub struct CacheCoordinator<R: CacheRecord> {
    cache: Arc<dyn CacheStore>,
    source: Arc<dyn SourceStore<R>>,
    serializer: SerializerEnum,
    locks: LockManager,
    retry: RetryPolicy,
    config: SyncConfig,
}

impl<R: CacheRecord> CacheCoordinator<R> {
    /// 创建新的缓存协调器
    pub fn new(
        cache: Arc<dyn CacheStore>,
        source: Arc<dyn SourceStore<R>>,
        serializer: SerializerEnum,
        config: SyncConfig,
        retry: RetryConfig,
    ) -> Self {
        Self {
            locks: LockManager::new(cache.clone()),
            retry: RetryPolicy::new(&retry),
            cache,
            source,
            serializer,
            config,
        }
    }

    /// 按键读取记录
    ///
    /// 缓存命中直接返回；未命中时尝试获取按键锁后回源加载并填充缓存。
    /// 锁被其他调用者持有时等待一个有界延迟后重试整个流程，
    /// 重试次数耗尽返回 LockContention；源存储中不存在返回 NotFound
    #[instrument(skip(self), level = "debug", fields(namespace = %self.config.namespace))]
    pub async fn retrieve(&self, key: &str) -> Result<R> {
        let start = std::time::Instant::now();
        let cache_key = cache_key(&self.config.namespace, key);
        let lock_name = key_lock_name(&self.config.namespace, key);

        // 至少走一轮缓存查找，配置为0时不能绕过缓存直接失败
        let max_attempts = self.config.lock_max_attempts.max(1);
        for attempt in 1..=max_attempts {
            if let Some(record) = self.read_cache(&cache_key).await? {
                GLOBAL_METRICS.record_request(&self.config.namespace, "get", "hit");
                GLOBAL_METRICS.record_duration(
                    &self.config.namespace,
                    "get",
                    start.elapsed().as_secs_f64(),
                );
                return Ok(record);
            }
            GLOBAL_METRICS.record_request(&self.config.namespace, "get", "miss");

            match self.locks.acquire(&lock_name, self.config.lock_ttl).await? {
                Some(token) => {
                    GLOBAL_METRICS.record_request(&self.config.namespace, "lock", "acquired");
                    let result = self.load_and_populate(key, &cache_key).await;
                    if let Err(e) = self.locks.release(&lock_name, &token).await {
                        warn!("Failed to release {}: {}", lock_name, e);
                    }
                    GLOBAL_METRICS.record_duration(
                        &self.config.namespace,
                        "get",
                        start.elapsed().as_secs_f64(),
                    );
                    return result;
                }
                None => {
                    GLOBAL_METRICS.record_request(&self.config.namespace, "lock", "contended");
                    debug!(
                        "Lock {} held elsewhere, attempt {}/{}",
                        lock_name, attempt, max_attempts
                    );
                    // 最后一轮失败后直接放弃，不再做无意义的等待
                    if attempt < max_attempts {
                        tokio::time::sleep(Duration::from_millis(
                            self.config.lock_retry_delay_ms,
                        ))
                        .await;
                    }
                }
            }
        }

        warn!(
            "Giving up on {} after {} lock attempts",
            lock_name, max_attempts
        );
        Err(SyncError::LockContention(lock_name))
    }

    /// 保存记录并更新缓存
    ///
    /// 先写源存储，成功后才写缓存；源存储失败时不触碰缓存并向上传播。
    /// 缓存写入失败仅记录日志，由下次读取未命中或全量刷新自愈
    #[instrument(skip(self, record), level = "debug", fields(namespace = %self.config.namespace))]
    pub async fn upsert(&self, record: R) -> Result<R> {
        let saved = self
            .retry
            .run("source save", || self.source.save(record.clone()))
            .await?;
        GLOBAL_METRICS.record_request(&self.config.namespace, "upsert", "saved");

        let cache_key = cache_key(&self.config.namespace, saved.record_key());
        match self.serializer.serialize(&saved) {
            Ok(bytes) => {
                let write = self
                    .retry
                    .run("cache set", || {
                        self.cache
                            .set_with_ttl(&cache_key, bytes.clone(), self.config.cache_ttl)
                    })
                    .await;
                if let Err(e) = write {
                    // 记录已正确持久化，缓存留待自愈
                    warn!("Cache update after upsert failed for {}: {}", cache_key, e);
                    GLOBAL_METRICS.record_request(
                        &self.config.namespace,
                        "upsert",
                        "cache_failed",
                    );
                }
            }
            Err(e) => {
                warn!("Serialization after upsert failed for {}: {}", cache_key, e);
            }
        }
        Ok(saved)
    }

    /// 读取并解码一个缓存条目
    ///
    /// 解码失败按未命中处理，坏数据由后续回源加载覆盖
    async fn read_cache(&self, cache_key: &str) -> Result<Option<R>> {
        let bytes = self
            .retry
            .run("cache get", || self.cache.get(cache_key))
            .await?;
        match bytes {
            Some(data) => match self.serializer.deserialize::<R>(&data) {
                Ok(record) => Ok(Some(record)),
                Err(e) => {
                    warn!("Discarding undecodable cache entry {}: {}", cache_key, e);
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    /// 持锁回源加载并填充缓存
    async fn load_and_populate(&self, key: &str, cache_key: &str) -> Result<R> {
        // 双重检查：竞争窗口内可能已有其他调用者完成填充
        if let Some(record) = self.read_cache(cache_key).await? {
            GLOBAL_METRICS.record_request(&self.config.namespace, "get", "hit");
            return Ok(record);
        }

        let loaded = self
            .retry
            .run("source find_by_key", || self.source.find_by_key(key))
            .await?;
        let record = match loaded {
            Some(record) => record,
            None => {
                debug!("Key {} absent from source store", key);
                return Err(SyncError::NotFound(key.to_string()));
            }
        };
        GLOBAL_METRICS.record_request(&self.config.namespace, "source_load", "loaded");

        let bytes = self.serializer.serialize(&record)?;
        self.retry
            .run("cache set", || {
                self.cache
                    .set_with_ttl(cache_key, bytes.clone(), self.config.cache_ttl)
            })
            .await?;
        Ok(record)
    }
}
