// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::fetch_result::DnsCacheEntry;
use crate::domain::repositories::dns_cache_repository::DnsCacheRepository;
use crate::engines::statistics::ScanCounters;
use crate::engines::traits::{DnsError, NameserverClient};
use dashmap::DashMap;
use rand::seq::IndexedRandom;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// 单个域名的最大查询次数
pub const MAX_DNS_ATTEMPTS: usize = 4;

/// DNS解析器
///
/// 依次查询内存缓存、持久化缓存，最后随机挑选DNS服务器实时查询；
/// 成功的结果会同时写回两层缓存，第一次写入的结果生效
pub struct DnsResolver {
    memory: Arc<DashMap<String, IpAddr>>,
    durable: Option<Arc<dyn DnsCacheRepository>>,
    nameservers: Vec<IpAddr>,
    client: Arc<dyn NameserverClient>,
    counters: Arc<ScanCounters>,
}

impl DnsResolver {
    pub fn new(
        nameservers: Vec<IpAddr>,
        client: Arc<dyn NameserverClient>,
        counters: Arc<ScanCounters>,
    ) -> Self {
        Self {
            memory: Arc::new(DashMap::new()),
            durable: None,
            nameservers,
            client,
            counters,
        }
    }

    /// 使用持久化缓存
    pub fn with_durable_cache(mut self, durable: Arc<dyn DnsCacheRepository>) -> Self {
        self.durable = Some(durable);
        self
    }

    /// 预先写入已知的解析结果
    pub fn seed(&self, entries: &[DnsCacheEntry]) {
        for entry in entries {
            self.memory
                .entry(normalize(&entry.domain))
                .or_insert(entry.ip_address);
        }
    }

    /// 解析域名
    ///
    /// 返回 `None` 表示该域名无法解析，调用方应跳过对应任务
    #[instrument(skip(self))]
    pub async fn resolve(&self, domain: &str) -> Option<IpAddr> {
        let host = normalize(domain);
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Some(ip);
        }

        if let Some(ip) = self.memory.get(&host) {
            return Some(*ip);
        }

        if let Some(durable) = &self.durable {
            match durable.find(&host).await {
                Ok(Some(ip)) => {
                    let ip = *self.memory.entry(host).or_insert(ip);
                    return Some(ip);
                }
                Ok(None) => {}
                Err(e) => warn!("Failed to read DNS cache for {}: {}", host, e),
            }
        }

        for attempt in 1..=MAX_DNS_ATTEMPTS {
            let Some(nameserver) = self.nameservers.choose(&mut rand::rng()).copied() else {
                warn!("No nameservers configured, cannot resolve {}", host);
                return None;
            };

            self.counters.dns_request();
            match self.client.query(&host, nameserver).await {
                Ok(ip) => {
                    self.counters.dns_response();
                    return Some(self.remember(host, ip).await);
                }
                Err(e) if e.is_definitive() => {
                    debug!("{} has no A records", host);
                    return None;
                }
                Err(DnsError::Unreachable(server)) => {
                    warn!("Could not contact DNS server {} (attempt {})", server, attempt);
                }
                Err(e) => {
                    debug!("DNS attempt {} for {} failed: {}", attempt, host, e);
                }
            }
        }

        debug!("Giving up resolving {} after {} attempts", host, MAX_DNS_ATTEMPTS);
        None
    }

    async fn remember(&self, host: String, ip: IpAddr) -> IpAddr {
        let ip = *self.memory.entry(host.clone()).or_insert(ip);
        if let Some(durable) = &self.durable {
            if let Err(e) = durable.save(&host, ip).await {
                warn!("Failed to persist DNS cache entry for {}: {}", host, e);
            }
        }
        ip
    }
}

fn normalize(domain: &str) -> String {
    domain.trim().trim_end_matches('.').to_lowercase()
}

#[cfg(test)]
#[path = "dns_resolver_test.rs"]
mod tests;
