//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块实现了缓存同步引擎的核心逻辑。

pub mod coordinator;
pub mod lock;
pub mod resync;
pub mod retry;

/// 记录键对应的缓存键，例如 namespace="region"、key="US-CA" 生成 "region:US-CA"
pub(crate) fn cache_key(namespace: &str, key: &str) -> String {
    format!("{}:{}", namespace, key)
}

/// 命名空间下缓存键的公共前缀，用于全量刷新时枚举现存键
pub(crate) fn cache_prefix(namespace: &str) -> String {
    format!("{}:", namespace)
}

/// 守护单个缓存键加载的锁名
pub(crate) fn key_lock_name(namespace: &str, key: &str) -> String {
    format!("lock:{}:{}", namespace, key)
}

/// 守护整个全量刷新的锁名
pub(crate) fn flush_lock_name(namespace: &str) -> String {
    format!("lock:{}:flush", namespace)
}
