//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了针对瞬时存储错误的有界重试策略。

use crate::config::RetryConfig;
use crate::error::{Result, SyncError};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// 重试策略
///
/// 对瞬时错误进行指数退避重试，非瞬时错误直接透传；
/// 重试耗尽后以 StoreUnavailable 上报
#[derive(Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    /// 根据配置创建重试策略
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            // 至少执行一次
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
        }
    }

    /// 第 attempt 次重试前的退避时间（attempt 从1开始）
    fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
    }

    /// 执行操作，瞬时失败时按退避策略重试
    ///
    /// # 参数
    ///
    /// * `op` - 操作名称，用于日志和错误上报
    /// * `f` - 产生待执行future的闭包，每次尝试调用一次
    pub async fn run<T, F, Fut>(&self, op: &str, mut f: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut last_error: Option<SyncError> = None;
        for attempt in 1..=self.max_attempts {
            if attempt > 1 {
                let delay = self.backoff(attempt - 1);
                debug!("Retrying {} (attempt {}) after {:?}", op, attempt, delay);
                tokio::time::sleep(delay).await;
            }
            match f().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() => {
                    warn!("Transient failure during {} (attempt {}): {}", op, attempt, e);
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }
        Err(SyncError::StoreUnavailable {
            op: op.to_string(),
            attempts: self.max_attempts,
            last: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
        })
    }
}
