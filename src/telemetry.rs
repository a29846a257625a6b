//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块提供tracing日志的初始化入口。

use std::sync::Once;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// 初始化tracing订阅者
///
/// 日志级别由 RUST_LOG 环境变量控制，默认 info；重复调用是安全的
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_span_events(FmtSpan::CLOSE)
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .try_init()
            .ok();
    });
}
