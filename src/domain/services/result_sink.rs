// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::workload::{ScanStatistics, ScanSummary};
use crate::utils::errors::ScanError;
use async_trait::async_trait;

/// 命中结果的去向
///
/// 单机和源节点写入本地存储并通知，副本节点额外把结果发布给源节点
#[async_trait]
pub trait ResultSink: Send + Sync {
    /// 接收一条命中结果
    ///
    /// # 返回值
    ///
    /// * `Ok(true)` - 结果为新保存
    /// * `Ok(false)` - 结果已存在
    /// * `Err(ScanError)` - 保存或发布失败
    async fn accept(&self, workload_uuid: &str, url: &str, content: &str) -> Result<bool, ScanError>;

    /// 接收周期统计
    async fn statistics(&self, statistics: &ScanStatistics);

    /// 扫描结束
    async fn finish(&self, summary: &ScanSummary);
}
