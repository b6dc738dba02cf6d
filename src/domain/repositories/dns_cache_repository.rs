// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::RepositoryError;
use crate::domain::models::fetch_result::DnsCacheEntry;
use async_trait::async_trait;
use std::net::IpAddr;

/// DNS缓存仓库特质
#[async_trait]
pub trait DnsCacheRepository: Send + Sync {
    async fn find(&self, domain: &str) -> Result<Option<IpAddr>, RepositoryError>;

    /// 第一次成功解析的结果生效
    async fn save(&self, domain: &str, ip: IpAddr) -> Result<bool, RepositoryError>;

    async fn list(&self) -> Result<Vec<DnsCacheEntry>, RepositoryError>;
}
