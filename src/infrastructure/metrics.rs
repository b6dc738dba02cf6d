// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{info, warn};

/// 初始化指标系统
///
/// `addr` 为空时只注册指标描述，不启动 Prometheus 监听
pub fn init_metrics(addr: Option<&str>) {
    if let Some(addr) = addr {
        match addr.parse::<SocketAddr>() {
            Ok(addr) => {
                // Ignore error if address is already in use (for development/testing)
                if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
                    warn!(
                        "Failed to install Prometheus recorder: {}. This might happen if the port is already in use.",
                        e
                    );
                } else {
                    info!("Metrics exporter listening on {}", addr);
                }
            }
            Err(e) => warn!("Invalid metrics address {:?}: {}", addr, e),
        }
    }

    describe_counter!("leakrs_http_requests_total", "Total number of HTTP requests sent");
    describe_counter!("leakrs_http_timeouts_total", "Total number of HTTP requests that timed out");
    describe_counter!("leakrs_dns_requests_total", "Total number of DNS queries sent");
    describe_counter!("leakrs_dns_responses_total", "Total number of successful DNS answers");
    describe_counter!("leakrs_results_accepted_total", "Total number of accepted results");
    describe_gauge!("leakrs_requests_per_second", "Request rate over the last statistics interval");
}
