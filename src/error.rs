//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了同步引擎的错误类型和处理机制。

use thiserror::Error;

/// 同步引擎错误类型枚举
///
/// 定义了缓存同步过程中可能发生的各种错误类型
#[derive(Error, Debug)]
pub enum SyncError {
    /// 序列化/反序列化错误
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// 缓存存储操作失败（瞬时）
    #[error("Cache store error: {0}")]
    CacheStore(String),

    /// 源存储操作失败（瞬时）
    #[error("Source store error: {0}")]
    SourceStore(String),

    /// 重试耗尽后存储仍不可用
    #[error("Store unavailable after {attempts} attempts during {op}: {last}")]
    StoreUnavailable {
        op: String,
        attempts: u32,
        last: String,
    },

    /// 锁竞争：重试次数耗尽仍未获取到锁
    #[error("Lock contention on {0}: retry attempts exhausted")]
    LockContention(String),

    /// 全量刷新已在进行中
    #[error("A flush is already in progress")]
    FlushInProgress,

    /// 源存储中不存在指定记录
    #[error("Record not found: {0}")]
    NotFound(String),

    /// 配置错误
    #[error("Configuration error: {0}")]
    Config(String),

    /// Redis错误
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Sea-ORM数据库错误
    #[error("Database error: {0}")]
    Db(#[from] sea_orm::DbErr),

    /// IO错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SyncError {
    /// 判断错误是否为瞬时错误
    ///
    /// 瞬时错误可以在 RetryPolicy 下重试，其余错误直接向调用方传播
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SyncError::CacheStore(_)
                | SyncError::SourceStore(_)
                | SyncError::Redis(_)
                | SyncError::Db(_)
                | SyncError::Io(_)
        )
    }
}

/// 同步操作结果类型别名
///
/// 简化错误处理，所有同步操作都返回此类型
pub type Result<T> = std::result::Result<T, SyncError>;
