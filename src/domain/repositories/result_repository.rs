// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::RepositoryError;
use crate::domain::models::fetch_result::ResultRecord;
use async_trait::async_trait;

/// 结果仓库特质
///
/// 同一工作负载下的同一URL最多保存一次
#[async_trait]
pub trait ResultRepository: Send + Sync {
    /// 检查结果是否已存在
    async fn find(&self, workload_uuid: &str, url: &str) -> Result<bool, RepositoryError>;

    /// 保存结果
    ///
    /// # 返回值
    ///
    /// * `Ok(true)` - 新保存了一条结果
    /// * `Ok(false)` - 结果已存在，未做修改
    async fn save(
        &self,
        workload_uuid: &str,
        url: &str,
        content: &str,
    ) -> Result<bool, RepositoryError>;

    /// 列出结果，`workload_uuid` 为空时列出全部
    async fn list(&self, workload_uuid: Option<&str>) -> Result<Vec<ResultRecord>, RepositoryError>;

    /// 删除某个工作负载的所有结果，返回删除的数量
    async fn delete(&self, workload_uuid: &str) -> Result<usize, RepositoryError>;
}
