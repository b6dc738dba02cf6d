// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::RepositoryError;
use async_trait::async_trait;

/// 404基线仓库特质
#[async_trait]
pub trait BaselineRepository: Send + Sync {
    /// 查找某个源的404样本
    async fn find(&self, origin: &str) -> Result<Option<String>, RepositoryError>;

    /// 保存404样本，仅在不存在时写入
    ///
    /// 并发写入时只有第一份生效，其余返回 `Ok(false)`
    async fn save(&self, origin: &str, content: &str) -> Result<bool, RepositoryError>;
}
