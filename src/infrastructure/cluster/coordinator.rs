// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::{ClusterSettings, ScanSettings};
use crate::domain::models::cluster_message::ClusterMessage;
use crate::domain::models::fetch_result::DnsCacheEntry;
use crate::domain::models::task::EndpointRule;
use crate::domain::models::workload::Workload;
use crate::domain::services::result_sink::ResultSink;
use crate::infrastructure::cluster::transport::{push, subscribe, ReplicaAddress};
use crate::queue::task_queue::split_into_shards;
use crate::utils::errors::ClusterError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// 一次汇总的结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregationReport {
    /// 收到的 RESULT 消息数
    pub results: usize,
    /// 新保存的结果数
    pub stored: usize,
    /// 收到的 FINISHED 消息数
    pub finished: usize,
    /// 收到的 WEBPAGE_CONTENT 消息数
    pub webpages: usize,
}

/// 源节点协调器
///
/// 切分域名列表并下发到副本，随后汇总各副本发布的消息，
/// 直到每个副本都报告完成
pub struct SourceCoordinator {
    replicas: Vec<ReplicaAddress>,
    topic: String,
    receive_timeout: Duration,
}

impl SourceCoordinator {
    pub fn new(replicas: Vec<ReplicaAddress>, topic: &str, receive_timeout: Duration) -> Self {
        Self {
            replicas,
            topic: topic.to_string(),
            receive_timeout,
        }
    }

    pub fn from_settings(cluster: &ClusterSettings) -> Self {
        let replicas = cluster
            .servers
            .iter()
            .map(|host| host.trim())
            .filter(|host| !host.is_empty())
            .map(|host| ReplicaAddress::new(host, cluster.publish_port, cluster.job_port))
            .collect();
        Self::new(replicas, &cluster.topic, cluster.receive_timeout())
    }

    pub fn replicas(&self) -> &[ReplicaAddress] {
        &self.replicas
    }

    /// 下发新的工作负载并等待所有副本完成
    ///
    /// 先订阅所有副本的广播，再依次向每个副本发送 `RESTART` 和 `JOB`
    pub async fn dispatch(
        &self,
        workload: &Workload,
        domains: &[String],
        endpoints: &[EndpointRule],
        configuration: &ScanSettings,
        dns_cache: Vec<DnsCacheEntry>,
        sink: Arc<dyn ResultSink>,
    ) -> Result<AggregationReport, ClusterError> {
        if self.replicas.is_empty() {
            return Err(ClusterError::NoReplicas);
        }

        let (rx, subscriptions) = self.subscribe_all().await;
        let shards = split_into_shards(domains, self.replicas.len());

        for (index, (replica, shard)) in self.replicas.iter().zip(shards).enumerate() {
            let rank = index + 1;
            info!(
                "Sending {} domains to replica {} ({})",
                shard.len(),
                rank,
                replica.job
            );
            let job = ClusterMessage::Job {
                workload_uuid: workload.id().to_string(),
                domains: shard,
                endpoints: endpoints.to_vec(),
                configuration: configuration.clone(),
                nameservers: configuration.nameservers.clone(),
                rank,
                dns_cache: dns_cache.clone(),
            };

            if let Err(e) = push(&replica.job, &self.topic, &[ClusterMessage::Restart, job]).await {
                warn!("Failed to send job to replica {} ({}): {}", rank, replica.job, e);
                abort_all(&subscriptions);
                return Err(e);
            }
        }

        let report = self.aggregate(workload, rx, sink).await;
        abort_all(&subscriptions);
        Ok(report)
    }

    /// 恢复中断的工作负载
    ///
    /// 要求每个副本重新发布已有结果，并等待它们报告完成
    pub async fn resume(
        &self,
        workload: &Workload,
        sink: Arc<dyn ResultSink>,
    ) -> Result<AggregationReport, ClusterError> {
        if self.replicas.is_empty() {
            return Err(ClusterError::NoReplicas);
        }

        let (rx, subscriptions) = self.subscribe_all().await;
        let request = ClusterMessage::SendFinishedJobs {
            workload_uuid: workload.id().to_string(),
        };
        for replica in &self.replicas {
            if let Err(e) = push(&replica.job, &self.topic, std::slice::from_ref(&request)).await {
                warn!("Failed to ask {} for finished jobs: {}", replica.job, e);
                abort_all(&subscriptions);
                return Err(e);
            }
        }

        let report = self.aggregate(workload, rx, sink).await;
        abort_all(&subscriptions);
        Ok(report)
    }

    /// 向所有副本发送一条不需要回应的命令
    ///
    /// 返回送达的副本数量
    pub async fn broadcast(&self, message: ClusterMessage) -> usize {
        let mut delivered = 0;
        for replica in &self.replicas {
            match push(&replica.job, &self.topic, std::slice::from_ref(&message)).await {
                Ok(()) => delivered += 1,
                Err(e) => warn!("Failed to send {} to {}: {}", message.kind(), replica.job, e),
            }
        }
        delivered
    }

    async fn subscribe_all(
        &self,
    ) -> (mpsc::Receiver<(String, ClusterMessage)>, Vec<JoinHandle<()>>) {
        let (tx, rx) = mpsc::channel(1024);
        let mut subscriptions = Vec::with_capacity(self.replicas.len());
        for replica in &self.replicas {
            subscriptions.push(
                subscribe(
                    replica.publish.clone(),
                    self.topic.clone(),
                    self.receive_timeout,
                    tx.clone(),
                )
                .await,
            );
        }
        (rx, subscriptions)
    }

    async fn aggregate(
        &self,
        workload: &Workload,
        mut rx: mpsc::Receiver<(String, ClusterMessage)>,
        sink: Arc<dyn ResultSink>,
    ) -> AggregationReport {
        let expected = self.replicas.len();
        let mut report = AggregationReport::default();

        while report.finished < expected {
            let Some((server, message)) = rx.recv().await else {
                break;
            };

            match message {
                ClusterMessage::Result {
                    workload_uuid,
                    endpoint,
                    content,
                } => {
                    report.results += 1;
                    match sink.accept(&workload_uuid, &endpoint, &content).await {
                        Ok(true) => report.stored += 1,
                        Ok(false) => debug!("Result {} already stored", endpoint),
                        Err(e) => warn!("Failed to store result {} from {}: {}", endpoint, server, e),
                    }
                }
                ClusterMessage::Statistics(statistics) => {
                    info!(
                        "{}: {:.1} req/s, {} finished, {} in flight, {} timeouts",
                        server,
                        statistics.rps,
                        statistics.finished_requests,
                        statistics.in_flight,
                        statistics.timeouts
                    );
                }
                ClusterMessage::Finished {
                    rank,
                    workload_uuid,
                } => {
                    if workload_uuid
                        .as_deref()
                        .is_some_and(|other| other != workload.id())
                    {
                        debug!("Ignoring FINISHED for workload {:?}", workload_uuid);
                        continue;
                    }
                    report.finished += 1;
                    info!(
                        "Replica {} ({:?}) finished, {}/{}",
                        server, rank, report.finished, expected
                    );
                }
                ClusterMessage::WebpageContent { uuid, zip } => {
                    report.webpages += 1;
                    info!("Received webpage content {} ({} bytes) from {}", uuid, zip.len(), server);
                }
                other => debug!("Ignoring {} from {}", other.kind(), server),
            }
        }

        info!(
            "Workload {} aggregated: {} results, {} new",
            workload, report.results, report.stored
        );
        report
    }
}

fn abort_all(handles: &[JoinHandle<()>]) {
    for handle in handles {
        handle.abort();
    }
}
