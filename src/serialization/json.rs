//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了JSON编解码器的实现。

use super::Serializer;
use crate::error::{Result, SyncError};
use serde::{de::DeserializeOwned, Serialize};

/// JSON编解码器
///
/// 缓存条目以UTF-8 JSON明文存储，可在缓存存储中直接查看和排查。
/// 解码失败以 Serialization 错误上报，读路径将其降级为缓存未命中
#[derive(Clone, Default)]
pub struct JsonSerializer;

impl JsonSerializer {
    /// 创建新的JSON编解码器
    pub fn new() -> Self {
        Self
    }
}

impl Serializer for JsonSerializer {
    fn serialize<T: Serialize>(&self, value: &T) -> Result<Vec<u8>> {
        serde_json::to_vec(value).map_err(|e| SyncError::Serialization(e.to_string()))
    }

    fn deserialize<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T> {
        serde_json::from_slice(data).map_err(|e| SyncError::Serialization(e.to_string()))
    }
}
