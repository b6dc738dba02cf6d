// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::workload::ScanStatistics;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// 扫描计数器
///
/// 由所有并发抓取任务共享
#[derive(Debug, Default)]
pub struct ScanCounters {
    in_flight: AtomicU64,
    finished: AtomicU64,
    timeouts: AtomicU64,
    dns_requests: AtomicU64,
    dns_responses: AtomicU64,
}

impl ScanCounters {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn request_started(&self) {
        self.in_flight.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("leakrs_http_requests_total").increment(1);
    }

    pub fn request_finished(&self) {
        self.in_flight.fetch_sub(1, Ordering::Relaxed);
        self.finished.fetch_add(1, Ordering::Relaxed);
    }

    pub fn timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("leakrs_http_timeouts_total").increment(1);
    }

    pub fn dns_request(&self) {
        self.dns_requests.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("leakrs_dns_requests_total").increment(1);
    }

    pub fn dns_response(&self) {
        self.dns_responses.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("leakrs_dns_responses_total").increment(1);
    }

    pub fn finished(&self) -> u64 {
        self.finished.load(Ordering::Relaxed)
    }

    /// 生成统计快照，`rps` 由调用方按时间窗口计算
    pub fn snapshot(&self, rps: f64) -> ScanStatistics {
        ScanStatistics {
            rps,
            in_flight: self.in_flight.load(Ordering::Relaxed),
            finished_requests: self.finished(),
            dns_requests: self.dns_requests.load(Ordering::Relaxed),
            dns_responses: self.dns_responses.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
        }
    }
}

/// 启动周期统计任务
///
/// 每个周期发送一次快照，接收端关闭后任务自行结束
pub fn spawn_reporter(
    counters: Arc<ScanCounters>,
    period: Duration,
) -> (JoinHandle<()>, mpsc::UnboundedReceiver<ScanStatistics>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        // The first tick completes immediately
        ticker.tick().await;
        let mut last_finished = counters.finished();
        let mut last_tick = Instant::now();

        loop {
            ticker.tick().await;
            let finished = counters.finished();
            let elapsed = last_tick.elapsed().as_secs_f64().max(f64::EPSILON);
            let rps = (finished - last_finished) as f64 / elapsed;
            last_finished = finished;
            last_tick = Instant::now();
            metrics::gauge!("leakrs_requests_per_second").set(rps);

            if tx.send(counters.snapshot(rps)).is_err() {
                break;
            }
        }
    });
    (handle, rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_track_in_flight() {
        let counters = ScanCounters::new();
        counters.request_started();
        counters.request_started();
        counters.request_finished();
        counters.timeout();
        counters.dns_request();

        let stats = counters.snapshot(0.0);
        assert_eq!(stats.in_flight, 1);
        assert_eq!(stats.finished_requests, 1);
        assert_eq!(stats.timeouts, 1);
        assert_eq!(stats.dns_requests, 1);
        assert_eq!(stats.dns_responses, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reporter_emits_rate() {
        let counters = ScanCounters::new();
        let (handle, mut rx) = spawn_reporter(counters.clone(), Duration::from_secs(2));
        tokio::time::sleep(Duration::from_secs(1)).await;

        for _ in 0..4 {
            counters.request_started();
            counters.request_finished();
        }

        let stats = rx.recv().await.unwrap();
        assert_eq!(stats.finished_requests, 4);
        assert!((stats.rps - 2.0).abs() < 0.01);

        handle.abort();
    }
}
