// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::config::settings::ScanSettings;
use crate::domain::models::fetch_result::{DnsCacheEntry, FetchResult};
use crate::domain::models::pattern::Pattern;
use crate::domain::models::task::{longest_matching_rule, EndpointRule};
use crate::domain::models::workload::{ScanSummary, Workload};
use crate::domain::repositories::baseline_repository::BaselineRepository;
use crate::domain::repositories::dns_cache_repository::DnsCacheRepository;
use crate::domain::repositories::result_repository::ResultRepository;
use crate::domain::services::relevance_filter::RelevanceFilter;
use crate::domain::services::result_sink::ResultSink;
use crate::engines::dns_resolver::DnsResolver;
use crate::engines::fetch_engine::FetchEngine;
use crate::engines::statistics::{spawn_reporter, ScanCounters};
use crate::engines::traits::NameserverClient;
use crate::infrastructure::repositories::memory_repo_impl::{
    InMemoryBaselineRepository, InMemoryDnsCacheRepository, InMemoryResultRepository,
};
use crate::queue::task_queue::{build_tasks, normalize_domains};
use crate::utils::errors::ScanError;
use crate::utils::url_utils::baseline_key;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// 扫描使用的存储
#[derive(Clone)]
pub struct ScanStores {
    pub results: Arc<dyn ResultRepository>,
    pub baselines: Arc<dyn BaselineRepository>,
    pub dns_cache: Option<Arc<dyn DnsCacheRepository>>,
}

impl ScanStores {
    /// 全部使用进程内存储
    pub fn in_memory() -> Self {
        Self {
            results: Arc::new(InMemoryResultRepository::new()),
            baselines: Arc::new(InMemoryBaselineRepository::new()),
            dns_cache: Some(Arc::new(InMemoryDnsCacheRepository::new())),
        }
    }
}

/// 扫描工作者
///
/// 负责一次工作负载的完整流程：生成任务、并发抓取、相关性判定，
/// 最后把命中结果交给 [`ResultSink`]
pub struct ScanWorker {
    settings: ScanSettings,
    rules: Vec<EndpointRule>,
    stores: ScanStores,
    nameserver_client: Arc<dyn NameserverClient>,
    sink: Arc<dyn ResultSink>,
    filter: RelevanceFilter,
    dns_seed: Vec<DnsCacheEntry>,
    scan_both_schemes: bool,
}

impl ScanWorker {
    /// 创建新的扫描工作者实例
    pub fn new(
        settings: ScanSettings,
        rules: Vec<EndpointRule>,
        stores: ScanStores,
        nameserver_client: Arc<dyn NameserverClient>,
        sink: Arc<dyn ResultSink>,
    ) -> Self {
        let filter = RelevanceFilter::new(settings.max_result_and_404_percent_diff)
            .with_max_diff_chars(settings.max_diff_chars);
        Self {
            settings,
            rules,
            stores,
            nameserver_client,
            sink,
            filter,
            dns_seed: Vec::new(),
            scan_both_schemes: false,
        }
    }

    /// 预先写入DNS缓存
    pub fn with_dns_seed(mut self, entries: Vec<DnsCacheEntry>) -> Self {
        self.dns_seed = entries;
        self
    }

    /// 每个域名同时以 https 和 http 探测
    pub fn with_both_schemes(mut self, enabled: bool) -> Self {
        self.scan_both_schemes = enabled;
        self
    }

    /// 执行一次工作负载
    ///
    /// # 参数
    ///
    /// * `workload` - 工作负载标识
    /// * `domains` - 原始域名列表
    ///
    /// # 返回值
    ///
    /// * `Ok(ScanSummary)` - 扫描摘要
    /// * `Err(ScanError)` - 没有端点规则、没有可用DNS服务器或抓取引擎无法创建
    #[instrument(skip(self, domains), fields(workload = %workload))]
    pub async fn run(&self, workload: &Workload, domains: &[String]) -> Result<ScanSummary, ScanError> {
        if self.rules.is_empty() {
            return Err(ScanError::NoEndpoints);
        }
        let nameservers = self.settings.nameserver_ips();
        if nameservers.is_empty() {
            return Err(ScanError::NoNameservers);
        }

        let domains = normalize_domains(domains, self.scan_both_schemes);
        let tasks = build_tasks(&domains, &self.rules);
        info!(
            "Scanning {} domains with {} endpoints ({} requests)",
            domains.len(),
            self.rules.len(),
            tasks.len()
        );

        let counters = ScanCounters::new();
        let mut resolver =
            DnsResolver::new(nameservers, self.nameserver_client.clone(), counters.clone());
        if let Some(dns_cache) = &self.stores.dns_cache {
            resolver = resolver.with_durable_cache(dns_cache.clone());
        }
        resolver.seed(&self.dns_seed);

        let engine = Arc::new(
            FetchEngine::new(self.settings.clone(), Arc::new(resolver), counters.clone())?
                .with_baseline_store(self.stores.baselines.clone()),
        );

        let mut summary = ScanSummary {
            workload: workload.clone(),
            tasks: tasks.len(),
            fetched: 0,
            accepted: 0,
        };

        let (reporter, mut statistics) =
            spawn_reporter(counters, self.settings.statistics_interval());
        let mut results = engine.scan(tasks);

        loop {
            tokio::select! {
                fetched = results.recv() => {
                    let Some(result) = fetched else {
                        break;
                    };
                    summary.fetched += 1;
                    if self.handle_result(workload, &result).await {
                        summary.accepted += 1;
                    }
                }
                Some(snapshot) = statistics.recv() => {
                    self.sink.statistics(&snapshot).await;
                }
            }
        }

        reporter.abort();
        self.sink.finish(&summary).await;
        Ok(summary)
    }

    /// 判定并转交一条抓取结果，返回是否新增了命中
    async fn handle_result(&self, workload: &Workload, result: &FetchResult) -> bool {
        match self.evaluate(workload, result).await {
            Ok(true) => match self
                .sink
                .accept(workload.id(), &result.final_url, &result.content)
                .await
            {
                Ok(created) => created,
                Err(e) => {
                    warn!("Failed to hand over {}: {}", result.final_url, e);
                    false
                }
            },
            Ok(false) => false,
            Err(e) => {
                warn!("Failed to evaluate {}: {}", result.final_url, e);
                false
            }
        }
    }

    /// 判断抓取结果是否为真实命中
    async fn evaluate(&self, workload: &Workload, result: &FetchResult) -> Result<bool, ScanError> {
        let url = result.final_url.as_str();
        let pattern = longest_matching_rule(&self.rules, url)
            .map(EndpointRule::pattern)
            .unwrap_or_else(|| Pattern::parse(&result.pattern));

        if !self.filter.is_relevant(url, &result.content, &pattern) {
            return Ok(false);
        }

        if self.stores.results.find(workload.id(), url).await? {
            debug!("{} already stored for this workload", url);
            return Ok(false);
        }

        let key = baseline_key(&result.domain);
        if let Some(sample) = &result.not_found_baseline {
            self.stores.baselines.save(&key, sample).await?;
        }
        let baseline = match self.stores.baselines.find(&key).await? {
            Some(baseline) => Some(baseline),
            None => result.not_found_baseline.clone(),
        };

        let Some(baseline) = baseline else {
            debug!("No not-found page for {}, accepting {}", key, url);
            return Ok(true);
        };

        // Edit distance is quadratic, keep it off the runtime threads
        let filter = self.filter.clone();
        let owned_url = url.to_string();
        let content = result.content.clone();
        let verdict = tokio::task::spawn_blocking(move || {
            filter.compare_with_baseline(&owned_url, &content, &baseline, &pattern)
        })
        .await
        .map_err(|e| ScanError::InternalError(format!("baseline comparison failed: {}", e)))?;
        debug!("Baseline verdict for {}: {:?}", url, verdict);
        Ok(verdict.is_accepted())
    }
}

#[cfg(test)]
#[path = "scan_worker_test.rs"]
mod tests;
