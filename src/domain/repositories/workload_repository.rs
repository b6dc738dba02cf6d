// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::RepositoryError;
use crate::domain::models::workload::Workload;
use async_trait::async_trait;

/// 工作负载仓库特质
#[async_trait]
pub trait WorkloadRepository: Send + Sync {
    async fn save(&self, workload: &Workload) -> Result<bool, RepositoryError>;

    async fn list(&self) -> Result<Vec<Workload>, RepositoryError>;
}
