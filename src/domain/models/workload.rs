// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// 工作负载
///
/// 一次扫描调用的标识，任务、结果和崩溃恢复都以它为范围
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Workload(String);

impl Workload {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_id(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

impl Default for Workload {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Workload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 扫描统计快照
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanStatistics {
    /// 统计周期内的每秒请求数
    pub rps: f64,
    /// 正在进行的请求数
    #[serde(default)]
    pub in_flight: u64,
    /// 已完成的请求数
    pub finished_requests: u64,
    /// DNS查询次数
    #[serde(default)]
    pub dns_requests: u64,
    /// DNS成功响应次数
    #[serde(default)]
    pub dns_responses: u64,
    /// 超时次数
    #[serde(default)]
    pub timeouts: u64,
}

/// 扫描摘要
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanSummary {
    pub workload: Workload,
    /// 生成的任务数
    pub tasks: usize,
    /// 拿到响应的任务数
    pub fetched: usize,
    /// 判定为命中的结果数
    pub accepted: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_workload_is_uuid() {
        let workload = Workload::new();
        assert!(Uuid::parse_str(workload.id()).is_ok());
        assert_ne!(workload, Workload::new());
    }

    #[test]
    fn test_workload_serializes_as_plain_string() {
        let workload = Workload::from_id("abc");
        assert_eq!(serde_json::to_string(&workload).unwrap(), "\"abc\"");
    }
}
