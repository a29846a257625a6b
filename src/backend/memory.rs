//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了进程内缓存后端，支持TTL过期，主要用于测试和单进程部署。

use crate::error::Result;
use crate::store::CacheStore;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

struct Entry {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(deadline) => now >= deadline,
            None => false,
        }
    }
}

/// 进程内缓存存储
///
/// 基于HashMap的TTL键值存储，过期条目在访问时惰性清理
#[derive(Default)]
pub struct MemoryCacheStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryCacheStore {
    /// 创建新的进程内缓存存储
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前未过期条目数量
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        let entries = self.entries.lock().await;
        entries.values().filter(|e| !e.is_expired(now)).count()
    }

    /// 缓存是否为空
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                entries.remove(key);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value.clone())),
            None => Ok(None),
        }
    }

    async fn set_with_ttl(&self, key: &str, value: Vec<u8>, ttl: u64) -> Result<()> {
        let mut entries = self.entries.lock().await;
        entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: Some(Instant::now() + Duration::from_secs(ttl)),
            },
        );
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: Vec<u8>, ttl: u64) -> Result<bool> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        if let Some(existing) = entries.get(key) {
            if !existing.is_expired(now) {
                return Ok(false);
            }
        }
        entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: Some(now + Duration::from_secs(ttl)),
            },
        );
        Ok(true)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().await;
        entries.remove(key);
        Ok(())
    }

    async fn delete_if_equals(&self, key: &str, expected: &[u8]) -> Result<bool> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if !entry.is_expired(now) && entry.value == expected => {
                entries.remove(key);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let now = Instant::now();
        let entries = self.entries.lock().await;
        Ok(entries
            .iter()
            .filter(|(k, e)| k.starts_with(prefix) && !e.is_expired(now))
            .map(|(k, _)| k.clone())
            .collect())
    }
}
