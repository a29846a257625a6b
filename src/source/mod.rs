//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块提供源存储接口的sea-orm参考实现。

pub mod entity;
pub mod sea_orm;

pub use entity::region;
pub use sea_orm::RegionStore;
