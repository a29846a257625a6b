//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了同步引擎的指标收集功能。

use lazy_static::lazy_static;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// 指标收集器
///
/// 用于收集和存储同步引擎的各种运行时指标
#[derive(Clone, Debug, Default)]
pub struct Metrics {
    /// 请求总数统计
    /// key: "namespace:op:result"
    pub requests_total: Arc<Mutex<HashMap<String, u64>>>,
    /// 操作耗时（累积时间和计数，用于计算平均值）
    /// key: "namespace:op" -> (total_duration_secs, count)
    pub operation_duration: Arc<Mutex<HashMap<String, (f64, u64)>>>,
    /// 最近一次全量刷新的统计
    /// key: namespace -> (written, failed, removed)
    pub last_flush: Arc<Mutex<HashMap<String, (usize, usize, usize)>>>,
}

lazy_static! {
    /// 全局指标实例
    pub static ref GLOBAL_METRICS: Metrics = Metrics::default();
}

impl Metrics {
    /// 记录请求指标
    ///
    /// # 参数
    ///
    /// * `namespace` - 缓存命名空间
    /// * `op` - 操作类型（get/upsert/lock/flush）
    /// * `result` - 操作结果（hit/miss/acquired/contended/...）
    pub fn record_request(&self, namespace: &str, op: &str, result: &str) {
        let key = format!("{}:{}:{}", namespace, op, result);
        let mut map = self.requests_total.lock().unwrap();
        *map.entry(key).or_insert(0) += 1;
    }

    /// 记录操作耗时
    pub fn record_duration(&self, namespace: &str, op: &str, duration_secs: f64) {
        let key = format!("{}:{}", namespace, op);
        let mut map = self.operation_duration.lock().unwrap();
        let entry = map.entry(key).or_insert((0.0, 0));
        entry.0 += duration_secs;
        entry.1 += 1;
    }

    /// 记录一次全量刷新的结果
    pub fn record_flush(&self, namespace: &str, written: usize, failed: usize, removed: usize) {
        let mut map = self.last_flush.lock().unwrap();
        map.insert(namespace.to_string(), (written, failed, removed));
    }
}

/// 获取指标字符串
///
/// 将所有指标格式化为字符串返回，用于监控系统采集
pub fn get_metrics_string() -> String {
    let metrics = &GLOBAL_METRICS;
    let reqs = metrics.requests_total.lock().unwrap();
    let dur = metrics.operation_duration.lock().unwrap();
    let flush = metrics.last_flush.lock().unwrap();

    let mut output = String::new();
    for (k, v) in reqs.iter() {
        output.push_str(&format!("sync_requests_total{{labels=\"{}\"}} {}\n", k, v));
    }
    for (k, (total, count)) in dur.iter() {
        let parts: Vec<&str> = k.split(':').collect();
        if parts.len() == 2 {
            output.push_str(&format!(
                "sync_operation_duration_seconds_sum{{namespace=\"{}\", operation=\"{}\"}} {}\n",
                parts[0], parts[1], total
            ));
            output.push_str(&format!(
                "sync_operation_duration_seconds_count{{namespace=\"{}\", operation=\"{}\"}} {}\n",
                parts[0], parts[1], count
            ));
        }
    }
    for (k, (written, failed, removed)) in flush.iter() {
        output.push_str(&format!(
            "sync_flush_written{{namespace=\"{}\"}} {}\n",
            k, written
        ));
        output.push_str(&format!(
            "sync_flush_failed{{namespace=\"{}\"}} {}\n",
            k, failed
        ));
        output.push_str(&format!(
            "sync_flush_removed{{namespace=\"{}\"}} {}\n",
            k, removed
        ));
    }
    output
}
