// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::fetch_result::{DnsCacheEntry, ResultRecord};
use crate::domain::models::task::EndpointRule;
use crate::domain::models::workload::Workload;
use crate::domain::repositories::baseline_repository::BaselineRepository;
use crate::domain::repositories::dns_cache_repository::DnsCacheRepository;
use crate::domain::repositories::endpoint_repository::EndpointRepository;
use crate::domain::repositories::result_repository::ResultRepository;
use crate::domain::repositories::workload_repository::WorkloadRepository;
use crate::domain::repositories::RepositoryError;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use std::net::IpAddr;
use tokio::sync::RwLock;

/// 内存端点仓库
#[derive(Default)]
pub struct InMemoryEndpointRepository {
    rules: RwLock<Vec<EndpointRule>>,
}

impl InMemoryEndpointRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EndpointRepository for InMemoryEndpointRepository {
    async fn list(&self) -> Result<Vec<EndpointRule>, RepositoryError> {
        Ok(self.rules.read().await.clone())
    }

    async fn save_all(&self, rules: &[EndpointRule]) -> Result<usize, RepositoryError> {
        let mut stored = self.rules.write().await;
        let mut inserted = 0;
        for rule in rules {
            if stored.iter().any(|existing| existing.endpoint == rule.endpoint) {
                continue;
            }
            stored.push(rule.clone());
            inserted += 1;
        }
        Ok(inserted)
    }

    async fn delete_all(&self) -> Result<(), RepositoryError> {
        self.rules.write().await.clear();
        Ok(())
    }
}

/// 内存结果仓库
#[derive(Default)]
pub struct InMemoryResultRepository {
    results: DashMap<(String, String), String>,
}

impl InMemoryResultRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResultRepository for InMemoryResultRepository {
    async fn find(&self, workload_uuid: &str, url: &str) -> Result<bool, RepositoryError> {
        Ok(self
            .results
            .contains_key(&(workload_uuid.to_string(), url.to_string())))
    }

    async fn save(
        &self,
        workload_uuid: &str,
        url: &str,
        content: &str,
    ) -> Result<bool, RepositoryError> {
        match self
            .results
            .entry((workload_uuid.to_string(), url.to_string()))
        {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(entry) => {
                entry.insert(content.trim().to_string());
                Ok(true)
            }
        }
    }

    async fn list(&self, workload_uuid: Option<&str>) -> Result<Vec<ResultRecord>, RepositoryError> {
        let mut records = self
            .results
            .iter()
            .filter(|item| workload_uuid.map_or(true, |w| item.key().0 == w))
            .map(|item| ResultRecord {
                workload_uuid: item.key().0.clone(),
                url: item.key().1.clone(),
                content: item.value().clone(),
            })
            .collect::<Vec<_>>();
        records.sort_by(|a, b| (&a.workload_uuid, &a.url).cmp(&(&b.workload_uuid, &b.url)));
        Ok(records)
    }

    async fn delete(&self, workload_uuid: &str) -> Result<usize, RepositoryError> {
        let before = self.results.len();
        self.results.retain(|key, _| key.0 != workload_uuid);
        Ok(before - self.results.len())
    }
}

/// 内存404基线仓库
#[derive(Default)]
pub struct InMemoryBaselineRepository {
    baselines: DashMap<String, String>,
}

impl InMemoryBaselineRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BaselineRepository for InMemoryBaselineRepository {
    async fn find(&self, origin: &str) -> Result<Option<String>, RepositoryError> {
        Ok(self.baselines.get(origin).map(|content| content.clone()))
    }

    async fn save(&self, origin: &str, content: &str) -> Result<bool, RepositoryError> {
        match self.baselines.entry(origin.to_string()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(entry) => {
                entry.insert(content.to_string());
                Ok(true)
            }
        }
    }
}

/// 内存DNS缓存仓库
#[derive(Default)]
pub struct InMemoryDnsCacheRepository {
    entries: DashMap<String, IpAddr>,
}

impl InMemoryDnsCacheRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DnsCacheRepository for InMemoryDnsCacheRepository {
    async fn find(&self, domain: &str) -> Result<Option<IpAddr>, RepositoryError> {
        Ok(self.entries.get(domain).map(|ip| *ip))
    }

    async fn save(&self, domain: &str, ip: IpAddr) -> Result<bool, RepositoryError> {
        match self.entries.entry(domain.to_string()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(entry) => {
                entry.insert(ip);
                Ok(true)
            }
        }
    }

    async fn list(&self) -> Result<Vec<DnsCacheEntry>, RepositoryError> {
        Ok(self
            .entries
            .iter()
            .map(|item| DnsCacheEntry {
                domain: item.key().clone(),
                ip_address: *item.value(),
            })
            .collect())
    }
}

/// 内存工作负载仓库
#[derive(Default)]
pub struct InMemoryWorkloadRepository {
    workloads: DashSet<String>,
}

impl InMemoryWorkloadRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WorkloadRepository for InMemoryWorkloadRepository {
    async fn save(&self, workload: &Workload) -> Result<bool, RepositoryError> {
        Ok(self.workloads.insert(workload.id().to_string()))
    }

    async fn list(&self) -> Result<Vec<Workload>, RepositoryError> {
        let mut ids = self
            .workloads
            .iter()
            .map(|id| id.key().clone())
            .collect::<Vec<_>>();
        ids.sort();
        Ok(ids.into_iter().map(Workload::from_id).collect())
    }
}
