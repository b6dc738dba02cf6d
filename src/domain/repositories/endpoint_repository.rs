// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::RepositoryError;
use crate::domain::models::task::EndpointRule;
use async_trait::async_trait;

/// 端点仓库特质
#[async_trait]
pub trait EndpointRepository: Send + Sync {
    /// 列出所有端点规则
    async fn list(&self) -> Result<Vec<EndpointRule>, RepositoryError>;

    /// 批量保存端点规则
    ///
    /// 已存在的路径会被跳过，返回实际新增的数量
    async fn save_all(&self, rules: &[EndpointRule]) -> Result<usize, RepositoryError>;

    /// 删除所有端点规则
    async fn delete_all(&self) -> Result<(), RepositoryError>;
}
