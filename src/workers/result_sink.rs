// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::cluster_message::ClusterMessage;
use crate::domain::models::workload::{ScanStatistics, ScanSummary};
use crate::domain::repositories::result_repository::ResultRepository;
use crate::domain::services::notification_service::NotificationService;
use crate::domain::services::result_sink::ResultSink;
use crate::infrastructure::cluster::transport::ResultPublisher;
use crate::utils::errors::ScanError;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

/// 单机和源节点使用的结果去向
///
/// 保存到结果仓库，只有新保存的结果才会触发通知
pub struct LocalResultSink {
    results: Arc<dyn ResultRepository>,
    notifier: Option<Arc<dyn NotificationService>>,
}

impl LocalResultSink {
    pub fn new(results: Arc<dyn ResultRepository>) -> Self {
        Self {
            results,
            notifier: None,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn NotificationService>) -> Self {
        self.notifier = Some(notifier);
        self
    }
}

#[async_trait]
impl ResultSink for LocalResultSink {
    async fn accept(&self, workload_uuid: &str, url: &str, content: &str) -> Result<bool, ScanError> {
        let created = self.results.save(workload_uuid, url, content).await?;
        if created {
            info!("Found {}", url);
            metrics::counter!("leakrs_results_accepted_total").increment(1);
            if let Some(notifier) = &self.notifier {
                if let Err(e) = notifier.send(url).await {
                    warn!("Failed to send notification for {}: {}", url, e);
                }
            }
        }
        Ok(created)
    }

    async fn statistics(&self, statistics: &ScanStatistics) {
        info!(
            "{:.1} req/s, {} finished, {} in flight, {} timeouts, dns {}/{}",
            statistics.rps,
            statistics.finished_requests,
            statistics.in_flight,
            statistics.timeouts,
            statistics.dns_responses,
            statistics.dns_requests
        );
    }

    async fn finish(&self, summary: &ScanSummary) {
        info!(
            "Workload {} finished: {} tasks, {} responses, {} accepted",
            summary.workload, summary.tasks, summary.fetched, summary.accepted
        );
    }
}

/// 副本节点使用的结果去向
///
/// 结果先保存在本地以便源节点恢复时重新发布，再广播给源节点
pub struct ClusterResultSink {
    results: Arc<dyn ResultRepository>,
    publisher: Arc<ResultPublisher>,
    rank: usize,
}

impl ClusterResultSink {
    pub fn new(results: Arc<dyn ResultRepository>, publisher: Arc<ResultPublisher>, rank: usize) -> Self {
        Self {
            results,
            publisher,
            rank,
        }
    }
}

#[async_trait]
impl ResultSink for ClusterResultSink {
    async fn accept(&self, workload_uuid: &str, url: &str, content: &str) -> Result<bool, ScanError> {
        let created = self.results.save(workload_uuid, url, content).await?;
        if created {
            metrics::counter!("leakrs_results_accepted_total").increment(1);
            self.publisher.publish(&ClusterMessage::Result {
                workload_uuid: workload_uuid.to_string(),
                endpoint: url.to_string(),
                content: content.trim().to_string(),
            })?;
        }
        Ok(created)
    }

    async fn statistics(&self, statistics: &ScanStatistics) {
        if let Err(e) = self
            .publisher
            .publish(&ClusterMessage::Statistics(statistics.clone()))
        {
            warn!("Failed to publish statistics: {}", e);
        }
    }

    async fn finish(&self, summary: &ScanSummary) {
        info!(
            "Replica {} finished workload {}: {} accepted",
            self.rank, summary.workload, summary.accepted
        );
        if let Err(e) = self.publisher.publish(&ClusterMessage::Finished {
            rank: Some(self.rank),
            workload_uuid: Some(summary.workload.id().to_string()),
        }) {
            warn!("Failed to publish FINISHED: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::workload::Workload;
    use crate::infrastructure::cluster::transport::subscribe;
    use crate::infrastructure::repositories::memory_repo_impl::InMemoryResultRepository;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::mpsc;

    #[derive(Default)]
    struct CountingNotifier {
        sent: AtomicUsize,
    }

    #[async_trait]
    impl NotificationService for CountingNotifier {
        async fn send(&self, _url: &str) -> anyhow::Result<()> {
            self.sent.fetch_add(1, Ordering::SeqCst);
            anyhow::bail!("webhook down")
        }
    }

    #[tokio::test]
    async fn test_local_sink_notifies_only_new_results() {
        let results = Arc::new(InMemoryResultRepository::new());
        let notifier = Arc::new(CountingNotifier::default());
        let sink = LocalResultSink::new(results.clone()).with_notifier(notifier.clone());

        // A failing notifier never fails the save
        assert!(sink.accept("w1", "https://a.com/.env", "KEY=1").await.unwrap());
        assert!(!sink.accept("w1", "https://a.com/.env", "KEY=1").await.unwrap());

        assert_eq!(notifier.sent.load(Ordering::SeqCst), 1);
        assert_eq!(results.list(Some("w1")).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_cluster_sink_publishes_results_and_finish() {
        let publisher = Arc::new(ResultPublisher::bind("127.0.0.1:0", "t").await.unwrap());
        let (tx, mut rx) = mpsc::channel(8);
        let subscription = subscribe(
            publisher.local_addr().to_string(),
            "t".into(),
            Duration::from_secs(5),
            tx,
        )
        .await;

        let results = Arc::new(InMemoryResultRepository::new());
        let sink = ClusterResultSink::new(results.clone(), publisher, 2);
        assert!(sink.accept("w1", "https://a.com/.env", " KEY=1 ").await.unwrap());
        assert!(!sink.accept("w1", "https://a.com/.env", "KEY=1").await.unwrap());
        sink.finish(&ScanSummary {
            workload: Workload::from_id("w1"),
            tasks: 1,
            fetched: 1,
            accepted: 1,
        })
        .await;

        let (_, first) = rx.recv().await.unwrap();
        assert_eq!(
            first,
            ClusterMessage::Result {
                workload_uuid: "w1".into(),
                endpoint: "https://a.com/.env".into(),
                content: "KEY=1".into(),
            }
        );
        let (_, second) = rx.recv().await.unwrap();
        assert_eq!(
            second,
            ClusterMessage::Finished {
                rank: Some(2),
                workload_uuid: Some("w1".into()),
            }
        );
        assert!(results.find("w1", "https://a.com/.env").await.unwrap());
        subscription.abort();
    }
}
