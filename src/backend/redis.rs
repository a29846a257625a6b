//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了基于Redis的缓存后端实现。

use crate::config::RedisCacheConfig;
use crate::error::{Result, SyncError};
use crate::store::CacheStore;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use secrecy::ExposeSecret;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, instrument};

/// 在命令超时内执行一条Redis命令
///
/// 超时以 CacheStore 瞬时错误上报，交由重试策略处理
async fn with_timeout<T, F>(timeout: Duration, op: &str, fut: F) -> Result<T>
where
    F: Future<Output = redis::RedisResult<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(SyncError::CacheStore(format!(
            "Redis {} timed out after {:?}",
            op, timeout
        ))),
    }
}

/// Redis缓存存储
///
/// 基于连接管理器的Redis后端，所有操作在连接断开后自动重连，
/// 每条命令受配置的命令超时约束
pub struct RedisCacheStore {
    manager: ConnectionManager,
    command_timeout: Duration,
}

impl RedisCacheStore {
    /// 根据配置建立Redis连接
    pub async fn connect(config: &RedisCacheConfig) -> Result<Self> {
        let client = redis::Client::open(config.connection_string.expose_secret())?;
        let manager = client.get_connection_manager().await?;
        Ok(Self {
            manager,
            command_timeout: Duration::from_millis(config.command_timeout_ms),
        })
    }

    /// Ping Redis，检查连通性
    #[instrument(skip(self), level = "debug")]
    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.manager.clone();
        let _: String = with_timeout(self.command_timeout, "PING", async move {
            redis::cmd("PING").query_async(&mut conn).await
        })
        .await?;
        Ok(())
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    #[instrument(skip(self), level = "debug")]
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.manager.clone();
        let value: Option<Vec<u8>> = with_timeout(self.command_timeout, "GET", async move {
            redis::cmd("GET").arg(key).query_async(&mut conn).await
        })
        .await?;
        Ok(value)
    }

    #[instrument(skip(self, value), level = "debug")]
    async fn set_with_ttl(&self, key: &str, value: Vec<u8>, ttl: u64) -> Result<()> {
        let mut conn = self.manager.clone();
        let _: () = with_timeout(self.command_timeout, "SET", async move {
            redis::cmd("SET")
                .arg(key)
                .arg(value)
                .arg("EX")
                .arg(ttl)
                .query_async(&mut conn)
                .await
        })
        .await?;
        Ok(())
    }

    /// 使用 SET NX PX 实现原子的set-if-absent
    #[instrument(skip(self, value), level = "debug")]
    async fn set_if_absent(&self, key: &str, value: Vec<u8>, ttl: u64) -> Result<bool> {
        let ttl_ms = ttl * 1000;
        let mut conn = self.manager.clone();
        let result: Option<String> = with_timeout(self.command_timeout, "SET NX", async move {
            redis::cmd("SET")
                .arg(key)
                .arg(value)
                .arg("NX")
                .arg("PX")
                .arg(ttl_ms)
                .query_async(&mut conn)
                .await
        })
        .await?;
        debug!("set_if_absent result: success={}", result.is_some());
        Ok(result.is_some())
    }

    #[instrument(skip(self), level = "debug")]
    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.manager.clone();
        let _: i64 = with_timeout(self.command_timeout, "DEL", async move {
            redis::cmd("DEL").arg(key).query_async(&mut conn).await
        })
        .await?;
        Ok(())
    }

    /// 使用 Lua 脚本保证比较并删除的原子性
    #[instrument(skip(self, expected), level = "debug")]
    async fn delete_if_equals(&self, key: &str, expected: &[u8]) -> Result<bool> {
        let script = redis::Script::new(
            r#"
            if redis.call("get", KEYS[1]) == ARGV[1] then
                return redis.call("del", KEYS[1])
            else
                return 0
            end
            "#,
        );
        let mut conn = self.manager.clone();
        let result: i32 = with_timeout(self.command_timeout, "EVAL", async move {
            script
                .key(key)
                .arg(expected)
                .invoke_async(&mut conn)
                .await
        })
        .await?;
        Ok(result == 1)
    }

    /// 使用 SCAN 游标遍历指定前缀下的所有键
    #[instrument(skip(self), level = "debug")]
    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let mut conn = self.manager.clone();
        let pattern = format!("{}*", prefix);
        let mut keys = Vec::new();
        let mut cursor: i64 = 0;
        loop {
            let scan_conn = &mut conn;
            let scan_pattern = &pattern;
            let (next_cursor, batch): (i64, Vec<String>) =
                with_timeout(self.command_timeout, "SCAN", async move {
                    redis::cmd("SCAN")
                        .arg(cursor)
                        .arg("MATCH")
                        .arg(scan_pattern)
                        .arg("COUNT")
                        .arg(100)
                        .query_async(scan_conn)
                        .await
                })
                .await?;
            keys.extend(batch);
            if next_cursor == 0 {
                break;
            }
            cursor = next_cursor;
        }
        debug!("SCAN found {} keys under prefix {}", keys.len(), prefix);
        Ok(keys)
    }
}
