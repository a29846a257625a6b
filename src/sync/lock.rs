//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了基于缓存存储原子set-if-absent原语的命名互斥锁。

use crate::error::Result;
use crate::store::CacheStore;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// 锁持有者令牌
///
/// acquire 时生成的不透明令牌，release 时必须出示；
/// 令牌不匹配说明锁已过期并被其他持有者接管，此时拒绝释放
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockToken(String);

impl LockToken {
    fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// 令牌的字符串形式
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// 命名互斥锁管理器
///
/// 锁条目通过TTL自过期，持有者崩溃后不会永久阻塞后续获取
#[derive(Clone)]
pub struct LockManager {
    cache: Arc<dyn CacheStore>,
}

impl LockManager {
    /// 创建新的锁管理器
    pub fn new(cache: Arc<dyn CacheStore>) -> Self {
        Self { cache }
    }

    /// 尝试获取命名锁，不阻塞
    ///
    /// # 参数
    ///
    /// * `name` - 锁名
    /// * `ttl` - 锁的过期时间（秒）
    ///
    /// # 返回值
    ///
    /// 获取成功返回持有者令牌，锁已被占用返回None
    #[instrument(skip(self), level = "debug")]
    pub async fn acquire(&self, name: &str, ttl: u64) -> Result<Option<LockToken>> {
        let token = LockToken::generate();
        let acquired = self
            .cache
            .set_if_absent(name, token.as_str().as_bytes().to_vec(), ttl)
            .await?;
        if acquired {
            debug!("Acquired lock {} with ttl {}s", name, ttl);
            Ok(Some(token))
        } else {
            debug!("Lock {} is held by another owner", name);
            Ok(None)
        }
    }

    /// 释放命名锁
    ///
    /// 仅当锁仍由给定令牌持有时删除锁条目
    ///
    /// # 返回值
    ///
    /// 成功释放返回 true；锁已过期或被他人接管返回 false
    #[instrument(skip(self, token), level = "debug")]
    pub async fn release(&self, name: &str, token: &LockToken) -> Result<bool> {
        let released = self
            .cache
            .delete_if_equals(name, token.as_str().as_bytes())
            .await?;
        if !released {
            warn!(
                "Lock {} was not released: token no longer matches (expired or reassigned)",
                name
            );
        }
        Ok(released)
    }
}
