// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::engines::traits::{DnsError, NameserverClient};
use async_trait::async_trait;
use dashmap::DashMap;
use hickory_resolver::config::{
    LookupIpStrategy, NameServerConfigGroup, ResolverConfig, ResolverOpts,
};
use hickory_resolver::error::{ResolveError, ResolveErrorKind};
use hickory_resolver::TokioAsyncResolver;
use std::net::IpAddr;
use std::time::Duration;

/// 基于 hickory-resolver 的DNS客户端
///
/// 每个DNS服务器对应一个单服务器解析器，按需创建；
/// 重试和缓存由 [`crate::engines::dns_resolver::DnsResolver`] 负责
pub struct HickoryNameserverClient {
    resolvers: DashMap<IpAddr, TokioAsyncResolver>,
    timeout: Duration,
}

impl HickoryNameserverClient {
    pub fn new(timeout: Duration) -> Self {
        Self {
            resolvers: DashMap::new(),
            timeout,
        }
    }

    fn resolver_for(&self, nameserver: IpAddr) -> TokioAsyncResolver {
        self.resolvers
            .entry(nameserver)
            .or_insert_with(|| {
                let config = ResolverConfig::from_parts(
                    None,
                    vec![],
                    NameServerConfigGroup::from_ips_clear(&[nameserver], 53, true),
                );
                let mut opts = ResolverOpts::default();
                opts.timeout = self.timeout;
                opts.attempts = 1;
                opts.cache_size = 0;
                opts.ip_strategy = LookupIpStrategy::Ipv4Only;
                TokioAsyncResolver::tokio(config, opts)
            })
            .clone()
    }
}

#[async_trait]
impl NameserverClient for HickoryNameserverClient {
    async fn query(&self, domain: &str, nameserver: IpAddr) -> Result<IpAddr, DnsError> {
        let resolver = self.resolver_for(nameserver);
        match resolver.lookup_ip(domain).await {
            Ok(lookup) => lookup
                .iter()
                .next()
                .ok_or_else(|| DnsError::NoRecords(domain.to_string())),
            Err(e) => Err(map_resolve_error(domain, nameserver, &e)),
        }
    }
}

fn map_resolve_error(domain: &str, nameserver: IpAddr, error: &ResolveError) -> DnsError {
    match error.kind() {
        ResolveErrorKind::NoRecordsFound { .. } => DnsError::NoRecords(domain.to_string()),
        ResolveErrorKind::Timeout | ResolveErrorKind::NoConnections | ResolveErrorKind::Io(_) => {
            DnsError::Unreachable(nameserver)
        }
        _ => DnsError::Query(error.to_string()),
    }
}
