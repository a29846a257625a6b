//! regionsync - 区域数据缓存同步引擎
//!
//! 提供缓存旁路读取（带击穿保护）、写穿透更新，
//! 以及从源存储全量重建缓存并清理过期键的周期性刷新能力。

#![doc(html_root_url = "https://docs.rs/regionsync/0.1.0")]

pub use serde;
pub use serde::{Deserialize, Serialize};
pub use serde_json;
pub use tokio;

pub mod backend;
pub mod config;
pub mod error;
pub mod metrics;
pub mod serialization;
pub mod source;
pub mod store;
pub mod sync;
pub mod telemetry;

// Re-export commonly used items
pub use config::Config;
pub use error::{Result, SyncError};
pub use store::{CacheRecord, CacheStore, SourceStore};
pub use sync::coordinator::CacheCoordinator;
pub use sync::lock::{LockManager, LockToken};
pub use sync::resync::{FlushReport, ResyncManager};
pub use sync::retry::RetryPolicy;

/// regionsync 版本号
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
