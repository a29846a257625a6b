//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块提供缓存存储接口的参考后端实现。

pub mod memory;
pub mod redis;

pub use memory::MemoryCacheStore;
pub use redis::RedisCacheStore;
