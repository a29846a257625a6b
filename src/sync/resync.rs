//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块实现了从源存储全量重建缓存的刷新流程。

use crate::config::{FlushConfig, RetryConfig, SyncConfig};
use crate::error::{Result, SyncError};
use crate::metrics::GLOBAL_METRICS;
use crate::serialization::{Serializer, SerializerEnum};
use crate::store::{CacheRecord, CacheStore, SourceStore};
use crate::sync::lock::LockManager;
use crate::sync::retry::RetryPolicy;
use crate::sync::{cache_key, cache_prefix, flush_lock_name};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// 一次全量刷新的统计结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// 扫描的页数
    pub pages: u64,
    /// 成功写入缓存的记录数
    pub written: usize,
    /// 写入或删除失败而被跳过的条目数
    pub failed: usize,
    /// 清理掉的过期键数量
    pub removed: usize,
}

/// 全量刷新管理器
///
/// 在独占的刷新锁下分页扫描源存储、逐批填充缓存，
/// 最后删除缓存中已不存在于源存储的过期键
pub struct ResyncManager<R: CacheRecord> {
    cache: Arc<dyn CacheStore>,
    source: Arc<dyn SourceStore<R>>,
    serializer: SerializerEnum,
    locks: LockManager,
    retry: RetryPolicy,
    sync_config: SyncConfig,
    flush_config: FlushConfig,
}

impl<R: CacheRecord> ResyncManager<R> {
    /// 创建新的全量刷新管理器
    pub fn new(
        cache: Arc<dyn CacheStore>,
        source: Arc<dyn SourceStore<R>>,
        serializer: SerializerEnum,
        sync_config: SyncConfig,
        flush_config: FlushConfig,
        retry: RetryConfig,
    ) -> Self {
        Self {
            locks: LockManager::new(cache.clone()),
            retry: RetryPolicy::new(&retry),
            cache,
            source,
            serializer,
            sync_config,
            flush_config,
        }
    }

    /// 执行一次全量刷新
    ///
    /// 刷新锁获取失败立即返回 FlushInProgress，不排队等待；
    /// 单条记录的写入/删除失败只记录日志并计入统计，不中断整体流程；
    /// 刷新锁在所有退出路径上都会释放
    #[instrument(skip(self), level = "info", fields(namespace = %self.sync_config.namespace))]
    pub async fn flush(&self) -> Result<FlushReport> {
        let lock_name = flush_lock_name(&self.sync_config.namespace);
        let token = match self
            .locks
            .acquire(&lock_name, self.flush_config.lock_ttl)
            .await?
        {
            Some(token) => token,
            None => {
                GLOBAL_METRICS.record_request(&self.sync_config.namespace, "flush", "rejected");
                return Err(SyncError::FlushInProgress);
            }
        };

        let start = std::time::Instant::now();
        let result = self.run_flush().await;
        if let Err(e) = self.locks.release(&lock_name, &token).await {
            warn!("Failed to release {}: {}", lock_name, e);
        }

        match &result {
            Ok(report) => {
                info!(
                    "Flush completed: pages={}, written={}, failed={}, removed={}",
                    report.pages, report.written, report.failed, report.removed
                );
                GLOBAL_METRICS.record_request(&self.sync_config.namespace, "flush", "completed");
                GLOBAL_METRICS.record_flush(
                    &self.sync_config.namespace,
                    report.written,
                    report.failed,
                    report.removed,
                );
                GLOBAL_METRICS.record_duration(
                    &self.sync_config.namespace,
                    "flush",
                    start.elapsed().as_secs_f64(),
                );
            }
            Err(e) => {
                warn!("Flush aborted: {}", e);
                GLOBAL_METRICS.record_request(&self.sync_config.namespace, "flush", "failed");
            }
        }
        result
    }

    /// 刷新主体：分页填充 + 过期键清理
    async fn run_flush(&self) -> Result<FlushReport> {
        let mut report = FlushReport::default();
        let mut processed: HashSet<String> = HashSet::new();

        // 总是从第0页重新开始，不续传上一次未完成的刷新
        let mut page: u64 = 0;
        loop {
            let batch = self
                .retry
                .run("source scan_page", || {
                    self.source.scan_page(page, self.flush_config.page_size)
                })
                .await?;
            if batch.is_empty() {
                break;
            }
            report.pages += 1;

            for record in &batch {
                let cache_key = cache_key(&self.sync_config.namespace, record.record_key());
                match self.write_entry(&cache_key, record).await {
                    Ok(()) => {
                        processed.insert(cache_key);
                        report.written += 1;
                    }
                    Err(e) => {
                        // 留待下次刷新或读取未命中时纠正
                        warn!("Skipping cache write for {}: {}", cache_key, e);
                        report.failed += 1;
                    }
                }
            }
            page += 1;
        }

        self.cleanup_stale(&processed, &mut report).await?;
        Ok(report)
    }

    /// 序列化并写入单条缓存条目
    async fn write_entry(&self, cache_key: &str, record: &R) -> Result<()> {
        let bytes = self.serializer.serialize(record)?;
        self.retry
            .run("cache set", || {
                self.cache
                    .set_with_ttl(cache_key, bytes.clone(), self.sync_config.cache_ttl)
            })
            .await
    }

    /// 删除缓存中存在但本次扫描未覆盖的键
    async fn cleanup_stale(
        &self,
        processed: &HashSet<String>,
        report: &mut FlushReport,
    ) -> Result<()> {
        let prefix = cache_prefix(&self.sync_config.namespace);
        let existing = self
            .retry
            .run("cache keys_with_prefix", || {
                self.cache.keys_with_prefix(&prefix)
            })
            .await?;

        for key in existing {
            if processed.contains(&key) {
                continue;
            }
            match self.cache.delete(&key).await {
                Ok(()) => report.removed += 1,
                Err(e) => {
                    warn!("Failed to delete stale key {}: {}", key, e);
                    report.failed += 1;
                }
            }
        }
        Ok(())
    }
}
