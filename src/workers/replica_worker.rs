// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::ClusterSettings;
use crate::domain::models::cluster_message::ClusterMessage;
use crate::domain::models::workload::Workload;
use crate::engines::traits::NameserverClient;
use crate::infrastructure::cluster::transport::{JobListener, ResultPublisher};
use crate::utils::errors::{ClusterError, ScanError};
use crate::workers::result_sink::ClusterResultSink;
use crate::workers::scan_worker::{ScanStores, ScanWorker};
use crate::workers::worker::Worker;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, info, info_span, warn, Instrument};

/// 正在执行的分片任务
struct RunningJob {
    workload_uuid: String,
    rank: usize,
    handle: JoinHandle<()>,
}

/// 副本节点工作器
///
/// 接收源节点推送的命令：`JOB` 启动分片扫描，`RESTART` 中止当前任务，
/// `UPGRADE` 执行升级命令后退出进程，`SEND_FINISHED_JOBS` 重新发布已有结果
pub struct ReplicaWorker {
    publisher: Arc<ResultPublisher>,
    commands: Mutex<JobListener>,
    stores: ScanStores,
    nameserver_client: Arc<dyn NameserverClient>,
    upgrade_command: Option<String>,
    current: Mutex<Option<RunningJob>>,
}

impl ReplicaWorker {
    pub fn new(
        publisher: Arc<ResultPublisher>,
        commands: JobListener,
        stores: ScanStores,
        nameserver_client: Arc<dyn NameserverClient>,
    ) -> Self {
        Self {
            publisher,
            commands: Mutex::new(commands),
            stores,
            nameserver_client,
            upgrade_command: None,
            current: Mutex::new(None),
        }
    }

    /// 按集群配置绑定广播和任务两个端口
    pub async fn bind(
        cluster: &ClusterSettings,
        stores: ScanStores,
        nameserver_client: Arc<dyn NameserverClient>,
    ) -> Result<Self, ClusterError> {
        let publisher = ResultPublisher::bind(
            &format!("{}:{}", cluster.bind_host, cluster.publish_port),
            &cluster.topic,
        )
        .await?;
        let commands = JobListener::bind(
            &format!("{}:{}", cluster.bind_host, cluster.job_port),
            &cluster.topic,
        )
        .await?;

        Ok(Self::new(Arc::new(publisher), commands, stores, nameserver_client)
            .with_upgrade_command(cluster.upgrade_command.clone()))
    }

    pub fn with_upgrade_command(mut self, command: Option<String>) -> Self {
        self.upgrade_command = command.filter(|c| !c.trim().is_empty());
        self
    }

    async fn handle(&self, message: ClusterMessage) -> Result<(), ScanError> {
        match message {
            ClusterMessage::Job {
                workload_uuid,
                domains,
                endpoints,
                mut configuration,
                nameservers,
                rank,
                dns_cache,
            } => {
                self.abort_current().await;
                if !nameservers.is_empty() {
                    configuration.nameservers = nameservers;
                }

                let sink = Arc::new(ClusterResultSink::new(
                    self.stores.results.clone(),
                    self.publisher.clone(),
                    rank,
                ));
                let worker = ScanWorker::new(
                    configuration,
                    endpoints,
                    self.stores.clone(),
                    self.nameserver_client.clone(),
                    sink,
                )
                .with_dns_seed(dns_cache);

                let workload = Workload::from_id(workload_uuid.clone());
                let publisher = self.publisher.clone();
                let span = info_span!("replica_job", role = "replica", rank, workload_uuid = %workload);
                info!(parent: &span, "Starting job with {} domains", domains.len());

                let handle = tokio::spawn(
                    async move {
                        if let Err(e) = worker.run(&workload, &domains).await {
                            error!("Job failed: {}", e);
                            // The source still waits for this replica
                            if let Err(e) = publisher.publish(&ClusterMessage::Finished {
                                rank: Some(rank),
                                workload_uuid: Some(workload.id().to_string()),
                            }) {
                                warn!("Failed to publish FINISHED: {}", e);
                            }
                        }
                    }
                    .instrument(span),
                );

                *self.current.lock().await = Some(RunningJob {
                    workload_uuid,
                    rank,
                    handle,
                });
            }
            ClusterMessage::Restart => {
                info!("Restart requested");
                self.abort_current().await;
            }
            ClusterMessage::Upgrade => self.upgrade().await,
            ClusterMessage::SendFinishedJobs { workload_uuid } => {
                self.send_finished_jobs(&workload_uuid).await?;
            }
            other => warn!("Ignoring unexpected {} command", other.kind()),
        }
        Ok(())
    }

    async fn abort_current(&self) {
        if let Some(job) = self.current.lock().await.take() {
            if !job.handle.is_finished() {
                info!(
                    "Aborting job {} (rank {})",
                    job.workload_uuid, job.rank
                );
            }
            job.handle.abort();
        }
    }

    /// 重新发布某个工作负载的全部结果
    ///
    /// 该工作负载没有仍在运行的任务时随后发布 `FINISHED`
    async fn send_finished_jobs(&self, workload_uuid: &str) -> Result<(), ScanError> {
        let records = self.stores.results.list(Some(workload_uuid)).await?;
        info!(
            "Re-publishing {} results of workload {}",
            records.len(),
            workload_uuid
        );
        for record in records {
            self.publisher.publish(&ClusterMessage::Result {
                workload_uuid: record.workload_uuid,
                endpoint: record.url,
                content: record.content,
            })?;
        }

        let still_running = self.current.lock().await.as_ref().is_some_and(|job| {
            job.workload_uuid == workload_uuid && !job.handle.is_finished()
        });
        if still_running {
            info!("Workload {} is still running, FINISHED will follow", workload_uuid);
        } else {
            self.publisher.publish(&ClusterMessage::Finished {
                rank: None,
                workload_uuid: Some(workload_uuid.to_string()),
            })?;
        }
        Ok(())
    }

    async fn upgrade(&self) {
        let Some(command) = &self.upgrade_command else {
            warn!("Upgrade requested but no upgrade command is configured");
            return;
        };

        info!("Running upgrade command: {}", command);
        match tokio::process::Command::new("sh")
            .arg("-c")
            .arg(command)
            .status()
            .await
        {
            Ok(status) => info!("Upgrade command exited with {}", status),
            Err(e) => error!("Failed to run upgrade command: {}", e),
        }
        std::process::exit(0);
    }
}

#[async_trait]
impl Worker for ReplicaWorker {
    async fn run(&self) -> Result<(), ScanError> {
        info!("Replica ready for jobs");
        loop {
            let next = { self.commands.lock().await.recv().await };
            let Some(message) = next else {
                break;
            };
            let kind = message.kind();
            if let Err(e) = self.handle(message).await {
                warn!("Failed to handle {}: {}", kind, e);
            }
        }
        self.abort_current().await;
        Ok(())
    }

    fn name(&self) -> &str {
        "replica"
    }
}
