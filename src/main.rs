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

use anyhow::{bail, Context};
use leakrs::config::settings::{ClusterRole, Settings, StorageBackend, StorageSettings};
use leakrs::domain::models::task::EndpointRule;
use leakrs::domain::models::workload::Workload;
use leakrs::domain::repositories::baseline_repository::BaselineRepository;
use leakrs::domain::repositories::dns_cache_repository::DnsCacheRepository;
use leakrs::domain::repositories::endpoint_repository::EndpointRepository;
use leakrs::domain::repositories::result_repository::ResultRepository;
use leakrs::domain::repositories::workload_repository::WorkloadRepository;
use leakrs::domain::services::notification_service::NotificationService;
use leakrs::engines::traits::NameserverClient;
use leakrs::infrastructure::cache::redis_client::RedisClient;
use leakrs::infrastructure::cluster::coordinator::SourceCoordinator;
use leakrs::infrastructure::dns::hickory_client::HickoryNameserverClient;
use leakrs::infrastructure::metrics::init_metrics;
use leakrs::infrastructure::repositories::memory_repo_impl::{
    InMemoryBaselineRepository, InMemoryDnsCacheRepository, InMemoryEndpointRepository,
    InMemoryResultRepository, InMemoryWorkloadRepository,
};
use leakrs::infrastructure::repositories::redis_repo_impl::RedisRepository;
use leakrs::infrastructure::services::webhook_service_impl::WebhookNotifier;
use leakrs::queue::task_queue::normalize_domains;
use leakrs::utils::errors::ScanError;
use leakrs::utils::telemetry;
use leakrs::workers::replica_worker::ReplicaWorker;
use leakrs::workers::result_sink::LocalResultSink;
use leakrs::workers::scan_worker::{ScanStores, ScanWorker};
use leakrs::workers::Worker;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

/// 进程使用的全部存储
struct Stores {
    endpoints: Arc<dyn EndpointRepository>,
    results: Arc<dyn ResultRepository>,
    baselines: Arc<dyn BaselineRepository>,
    dns_cache: Arc<dyn DnsCacheRepository>,
    workloads: Arc<dyn WorkloadRepository>,
}

impl Stores {
    async fn build(storage: &StorageSettings) -> anyhow::Result<Self> {
        match storage.backend {
            StorageBackend::Memory => Ok(Self {
                endpoints: Arc::new(InMemoryEndpointRepository::new()),
                results: Arc::new(InMemoryResultRepository::new()),
                baselines: Arc::new(InMemoryBaselineRepository::new()),
                dns_cache: Arc::new(InMemoryDnsCacheRepository::new()),
                workloads: Arc::new(InMemoryWorkloadRepository::new()),
            }),
            StorageBackend::Redis => {
                let url = storage
                    .redis_url
                    .as_deref()
                    .context("storage.redis_url is required for the redis backend")?;
                let repository = Arc::new(RedisRepository::new(
                    RedisClient::new(url).await?,
                    &storage.key_prefix,
                ));
                info!("Redis client initialized");
                Ok(Self {
                    endpoints: repository.clone(),
                    results: repository.clone(),
                    baselines: repository.clone(),
                    dns_cache: repository.clone(),
                    workloads: repository,
                })
            }
        }
    }

    fn scan_stores(&self) -> ScanStores {
        ScanStores {
            results: self.results.clone(),
            baselines: self.baselines.clone(),
            dns_cache: Some(self.dns_cache.clone()),
        }
    }
}

/// 主函数
///
/// 加载配置后按节点角色运行
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration
    let settings = Settings::new()?;

    // 2. Initialize logging and metrics
    telemetry::init_telemetry(&settings.telemetry.log_level, settings.telemetry.json_logs);
    info!("Starting leakrs as {}", settings.cluster.role);
    init_metrics(settings.telemetry.metrics_addr.as_deref());

    // 3. Storage
    let stores = Stores::build(&settings.storage).await?;

    // 4. Endpoint rules
    if let Some(path) = &settings.input.endpoints_file {
        import_endpoints(path, stores.endpoints.as_ref()).await?;
    }

    let client: Arc<dyn NameserverClient> =
        Arc::new(HickoryNameserverClient::new(settings.scan.dns_timeout()));

    match settings.cluster.role {
        ClusterRole::Replica => run_replica(&settings, &stores, client).await,
        ClusterRole::Source => run_source(&settings, &stores).await,
        ClusterRole::Disabled => run_local(&settings, &stores, client).await,
    }
}

async fn import_endpoints(path: &str, endpoints: &dyn EndpointRepository) -> anyhow::Result<()> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read endpoints file {}", path))?;
    let rules: Vec<EndpointRule> =
        serde_json::from_str(&raw).with_context(|| format!("invalid endpoints file {}", path))?;
    let inserted = endpoints.save_all(&rules).await?;
    info!("Imported {} of {} endpoint rules from {}", inserted, rules.len(), path);
    Ok(())
}

async fn read_domains(settings: &Settings) -> anyhow::Result<Vec<String>> {
    let Some(path) = &settings.input.domains_file else {
        bail!("input.domains_file is required for a scan");
    };
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read domains file {}", path))?;
    Ok(normalize_domains(
        &raw.lines().collect::<Vec<_>>(),
        settings.input.scan_both_schemes,
    ))
}

fn local_sink(settings: &Settings, stores: &Stores) -> Arc<LocalResultSink> {
    let mut sink = LocalResultSink::new(stores.results.clone());
    let notifier = WebhookNotifier::new(settings.notifications.clone(), settings.webhook_secret.clone());
    if !notifier.is_empty() {
        let notifier: Arc<dyn NotificationService> = Arc::new(notifier);
        sink = sink.with_notifier(notifier);
    }
    Arc::new(sink)
}

async fn run_local(
    settings: &Settings,
    stores: &Stores,
    client: Arc<dyn NameserverClient>,
) -> anyhow::Result<()> {
    let domains = read_domains(settings).await?;
    let rules = stores.endpoints.list().await?;

    let workload = Workload::new();
    stores.workloads.save(&workload).await?;

    let worker = ScanWorker::new(
        settings.scan.clone(),
        rules,
        stores.scan_stores(),
        client,
        local_sink(settings, stores),
    );
    let summary = worker.run(&workload, &domains).await?;

    for record in stores.results.list(Some(workload.id())).await? {
        info!("{}", record.url);
    }
    info!(
        "Workload {} done: {} of {} requests accepted",
        summary.workload, summary.accepted, summary.tasks
    );
    Ok(())
}

async fn run_source(settings: &Settings, stores: &Stores) -> anyhow::Result<()> {
    let coordinator = SourceCoordinator::from_settings(&settings.cluster);
    let sink = local_sink(settings, stores);

    let (workload, report) = match &settings.cluster.resume_workload {
        Some(id) => {
            let workload = Workload::from_id(id.clone());
            info!("Resuming workload {}", workload);
            let report = coordinator.resume(&workload, sink).await?;
            (workload, report)
        }
        None => {
            let rules = stores.endpoints.list().await?;
            if rules.is_empty() {
                return Err(ScanError::NoEndpoints.into());
            }
            let domains = read_domains(settings).await?;

            let workload = Workload::new();
            stores.workloads.save(&workload).await?;
            info!(
                "Dispatching workload {} ({} domains) to {} replicas",
                workload,
                domains.len(),
                coordinator.replicas().len()
            );

            let dns_cache = stores.dns_cache.list().await?;
            let report = coordinator
                .dispatch(&workload, &domains, &rules, &settings.scan, dns_cache, sink)
                .await?;
            (workload, report)
        }
    };

    info!(
        "Workload {} aggregated from {} replicas: {} results, {} new",
        workload, report.finished, report.results, report.stored
    );
    Ok(())
}

async fn run_replica(
    settings: &Settings,
    stores: &Stores,
    client: Arc<dyn NameserverClient>,
) -> anyhow::Result<()> {
    let worker = ReplicaWorker::bind(&settings.cluster, stores.scan_stores(), client).await?;
    info!("Starting worker {}", worker.name());

    tokio::select! {
        result = worker.run() => {
            if let Err(e) = &result {
                error!("Worker {} stopped: {}", worker.name(), e);
            }
            result?;
        }
        signal = signal::ctrl_c() => match signal {
            Ok(()) => info!("Shutdown signal received"),
            Err(err) => error!("Unable to listen for shutdown signal: {}", err),
        },
    }
    Ok(())
}
