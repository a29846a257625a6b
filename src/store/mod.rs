//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了同步引擎所依赖的外部存储接口。

use crate::error::Result;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

/// 可缓存记录特征
///
/// 领域记录必须可序列化、可克隆，并能给出自身的唯一键
pub trait CacheRecord: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// 记录的唯一键（不含命名空间前缀）
    fn record_key(&self) -> &str;
}

/// 缓存存储特征
///
/// 定义带TTL的键值存储接口，所有实现必须支持并发访问
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// 获取缓存值
    ///
    /// # 参数
    ///
    /// * `key` - 缓存键
    ///
    /// # 返回值
    ///
    /// 返回缓存值，如果不存在或已过期则返回None
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// 设置缓存值并附带过期时间
    ///
    /// # 参数
    ///
    /// * `key` - 缓存键
    /// * `value` - 缓存值
    /// * `ttl` - 过期时间（秒）
    async fn set_with_ttl(&self, key: &str, value: Vec<u8>, ttl: u64) -> Result<()>;

    /// 仅当键不存在时原子地设置缓存值
    ///
    /// # 返回值
    ///
    /// 设置成功返回 true，键已存在返回 false
    async fn set_if_absent(&self, key: &str, value: Vec<u8>, ttl: u64) -> Result<bool>;

    /// 删除缓存项
    async fn delete(&self, key: &str) -> Result<()>;

    /// 仅当当前值与期望值相等时删除缓存项
    ///
    /// 默认实现为读取-比较-删除，后端可以覆盖为原子实现
    ///
    /// # 返回值
    ///
    /// 删除成功返回 true，值不匹配或键不存在返回 false
    async fn delete_if_equals(&self, key: &str, expected: &[u8]) -> Result<bool> {
        match self.get(key).await? {
            Some(current) if current == expected => {
                self.delete(key).await?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// 枚举指定前缀下的所有缓存键
    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>>;
}

/// 源存储特征
///
/// 定义权威持久化存储的接口：按键查找、保存和分页扫描
#[async_trait]
pub trait SourceStore<R: CacheRecord>: Send + Sync {
    /// 按键查找记录
    ///
    /// # 返回值
    ///
    /// 返回记录，如果不存在则返回None
    async fn find_by_key(&self, key: &str) -> Result<Option<R>>;

    /// 保存记录（插入或更新）
    ///
    /// # 返回值
    ///
    /// 返回持久化后的记录
    async fn save(&self, record: R) -> Result<R>;

    /// 分页扫描记录
    ///
    /// 页码从0开始，返回空列表表示扫描结束
    async fn scan_page(&self, page: u64, page_size: u64) -> Result<Vec<R>>;
}
