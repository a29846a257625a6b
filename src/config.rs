//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了同步引擎的配置结构和解析逻辑。

use secrecy::SecretString;
use serde::Deserialize;
use std::path::Path;

use crate::error::{Result, SyncError};

/// 顶层配置
///
/// 可从TOML文件加载，各分节均有合理的默认值
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    /// 同步引擎配置
    #[serde(default)]
    pub sync: SyncConfig,
    /// 全量刷新配置
    #[serde(default)]
    pub flush: FlushConfig,
    /// 重试策略配置
    #[serde(default)]
    pub retry: RetryConfig,
    /// Redis缓存后端配置
    pub redis: Option<RedisCacheConfig>,
    /// 源数据库配置
    pub database: Option<DatabaseConfig>,
}

impl Config {
    /// 从TOML文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw).map_err(|e| SyncError::Config(e.to_string()))
    }
}

/// 同步引擎配置
///
/// 控制读路径缓存TTL和按键锁的行为
#[derive(Debug, Deserialize, Clone)]
pub struct SyncConfig {
    /// 缓存键命名空间前缀，例如 "region" 生成 "region:<key>"
    pub namespace: String,
    /// 缓存条目过期时间（秒）
    pub cache_ttl: u64,
    /// 按键锁的过期时间（秒）
    pub lock_ttl: u64,
    /// 锁竞争时的最大重试次数
    pub lock_max_attempts: u32,
    /// 锁竞争时每次重试前的等待时间（毫秒）
    pub lock_retry_delay_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            namespace: "region".to_string(),
            cache_ttl: 3600,
            lock_ttl: 10,
            lock_max_attempts: 5,
            lock_retry_delay_ms: 100,
        }
    }
}

/// 全量刷新配置
#[derive(Debug, Deserialize, Clone)]
pub struct FlushConfig {
    /// 刷新互斥锁的过期时间（秒），应远大于一次刷新的预期耗时
    pub lock_ttl: u64,
    /// 源存储分页扫描的页大小
    pub page_size: u64,
}

impl Default for FlushConfig {
    fn default() -> Self {
        Self {
            lock_ttl: 300,
            page_size: 20,
        }
    }
}

/// 重试策略配置
///
/// 适用于所有触达缓存存储或源存储的瞬时错误
#[derive(Debug, Deserialize, Clone)]
pub struct RetryConfig {
    /// 最大尝试次数（含首次）
    pub max_attempts: u32,
    /// 首次重试前的基础退避时间（毫秒），之后按指数增长
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 100,
        }
    }
}

/// Redis缓存后端配置
#[derive(Debug, Deserialize, Clone)]
pub struct RedisCacheConfig {
    /// 连接字符串，例如 "redis://127.0.0.1:6379"
    pub connection_string: SecretString,
    /// 单条命令超时时间（毫秒）
    #[serde(default = "default_command_timeout_ms")]
    pub command_timeout_ms: u64,
}

fn default_command_timeout_ms() -> u64 {
    5000
}

/// 源数据库配置
#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// 数据库连接URL
    pub url: SecretString,
}
