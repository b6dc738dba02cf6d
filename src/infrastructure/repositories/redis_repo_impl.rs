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
use crate::infrastructure::cache::redis_client::RedisClient;
use async_trait::async_trait;
use std::net::IpAddr;

/// Redis键布局
///
/// 所有键共享同一前缀，便于多个部署共用一个Redis实例
#[derive(Clone)]
pub struct RedisKeys {
    prefix: String,
}

impl RedisKeys {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.trim_end_matches(':').to_string(),
        }
    }

    pub fn endpoints(&self) -> String {
        format!("{}:endpoints", self.prefix)
    }

    pub fn results(&self, workload_uuid: &str) -> String {
        format!("{}:results:{}", self.prefix, workload_uuid)
    }

    pub fn result_workloads(&self) -> String {
        format!("{}:result_workloads", self.prefix)
    }

    pub fn baselines(&self) -> String {
        format!("{}:baselines", self.prefix)
    }

    pub fn dns(&self) -> String {
        format!("{}:dns", self.prefix)
    }

    pub fn workloads(&self) -> String {
        format!("{}:workloads", self.prefix)
    }
}

/// 基于Redis的仓库实现
///
/// 端点、基线和DNS缓存各存于一个哈希，结果按工作负载分哈希存放；
/// 写入统一使用 `HSETNX`，保证第一次写入生效
#[derive(Clone)]
pub struct RedisRepository {
    redis: RedisClient,
    keys: RedisKeys,
}

impl RedisRepository {
    pub fn new(redis: RedisClient, prefix: &str) -> Self {
        Self {
            redis,
            keys: RedisKeys::new(prefix),
        }
    }
}

#[async_trait]
impl EndpointRepository for RedisRepository {
    async fn list(&self) -> Result<Vec<EndpointRule>, RepositoryError> {
        let mut rules = self
            .redis
            .hgetall(&self.keys.endpoints())
            .await?
            .into_iter()
            .map(|(endpoint, pattern)| EndpointRule { endpoint, pattern })
            .collect::<Vec<_>>();
        rules.sort_by(|a, b| a.endpoint.cmp(&b.endpoint));
        Ok(rules)
    }

    async fn save_all(&self, rules: &[EndpointRule]) -> Result<usize, RepositoryError> {
        let key = self.keys.endpoints();
        let mut inserted = 0;
        for rule in rules {
            if self.redis.hset_nx(&key, &rule.endpoint, &rule.pattern).await? {
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn delete_all(&self) -> Result<(), RepositoryError> {
        self.redis.del(&self.keys.endpoints()).await?;
        Ok(())
    }
}

#[async_trait]
impl ResultRepository for RedisRepository {
    async fn find(&self, workload_uuid: &str, url: &str) -> Result<bool, RepositoryError> {
        Ok(self.redis.hexists(&self.keys.results(workload_uuid), url).await?)
    }

    async fn save(
        &self,
        workload_uuid: &str,
        url: &str,
        content: &str,
    ) -> Result<bool, RepositoryError> {
        let created = self
            .redis
            .hset_nx(&self.keys.results(workload_uuid), url, content.trim())
            .await?;
        if created {
            self.redis
                .sadd(&self.keys.result_workloads(), workload_uuid)
                .await?;
        }
        Ok(created)
    }

    async fn list(&self, workload_uuid: Option<&str>) -> Result<Vec<ResultRecord>, RepositoryError> {
        let workloads = match workload_uuid {
            Some(workload_uuid) => vec![workload_uuid.to_string()],
            None => self.redis.smembers(&self.keys.result_workloads()).await?,
        };

        let mut records = Vec::new();
        for workload_uuid in workloads {
            let results = self.redis.hgetall(&self.keys.results(&workload_uuid)).await?;
            records.extend(results.into_iter().map(|(url, content)| ResultRecord {
                workload_uuid: workload_uuid.clone(),
                url,
                content,
            }));
        }
        records.sort_by(|a, b| (&a.workload_uuid, &a.url).cmp(&(&b.workload_uuid, &b.url)));
        Ok(records)
    }

    async fn delete(&self, workload_uuid: &str) -> Result<usize, RepositoryError> {
        let key = self.keys.results(workload_uuid);
        let count = self.redis.hlen(&key).await?;
        self.redis.del(&key).await?;
        self.redis
            .srem(&self.keys.result_workloads(), workload_uuid)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl BaselineRepository for RedisRepository {
    async fn find(&self, origin: &str) -> Result<Option<String>, RepositoryError> {
        Ok(self.redis.hget(&self.keys.baselines(), origin).await?)
    }

    async fn save(&self, origin: &str, content: &str) -> Result<bool, RepositoryError> {
        Ok(self
            .redis
            .hset_nx(&self.keys.baselines(), origin, content)
            .await?)
    }
}

#[async_trait]
impl DnsCacheRepository for RedisRepository {
    async fn find(&self, domain: &str) -> Result<Option<IpAddr>, RepositoryError> {
        match self.redis.hget(&self.keys.dns(), domain).await? {
            Some(raw) => raw
                .parse::<IpAddr>()
                .map(Some)
                .map_err(|_| RepositoryError::InvalidData(format!("bad ip {:?} for {}", raw, domain))),
            None => Ok(None),
        }
    }

    async fn save(&self, domain: &str, ip: IpAddr) -> Result<bool, RepositoryError> {
        Ok(self
            .redis
            .hset_nx(&self.keys.dns(), domain, &ip.to_string())
            .await?)
    }

    async fn list(&self) -> Result<Vec<DnsCacheEntry>, RepositoryError> {
        Ok(self
            .redis
            .hgetall(&self.keys.dns())
            .await?
            .into_iter()
            .filter_map(|(domain, raw)| {
                raw.parse::<IpAddr>()
                    .ok()
                    .map(|ip_address| DnsCacheEntry { domain, ip_address })
            })
            .collect())
    }
}

#[async_trait]
impl WorkloadRepository for RedisRepository {
    async fn save(&self, workload: &Workload) -> Result<bool, RepositoryError> {
        Ok(self.redis.sadd(&self.keys.workloads(), workload.id()).await?)
    }

    async fn list(&self) -> Result<Vec<Workload>, RepositoryError> {
        let mut ids = self.redis.smembers(&self.keys.workloads()).await?;
        ids.sort();
        Ok(ids.into_iter().map(Workload::from_id).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        let keys = RedisKeys::new("leakrs:");
        assert_eq!(keys.endpoints(), "leakrs:endpoints");
        assert_eq!(keys.results("w1"), "leakrs:results:w1");
        assert_eq!(keys.baselines(), "leakrs:baselines");
        assert_eq!(keys.dns(), "leakrs:dns");
        assert_eq!(keys.workloads(), "leakrs:workloads");
    }

    #[tokio::test]
    async fn test_client_creation_does_not_connect() {
        // Opening a client only validates the URL
        let redis = RedisClient::new("redis://127.0.0.1:1/").await.unwrap();
        let repo = RedisRepository::new(redis, "test");
        assert_eq!(repo.keys.dns(), "test:dns");
        assert!(RedisClient::new("not a url").await.is_err());
    }
}
