// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{loopback_cache, start_site, OfflineClient};
use leakrs::config::settings::ScanSettings;
use leakrs::domain::models::task::EndpointRule;
use leakrs::domain::models::workload::Workload;
use leakrs::infrastructure::cluster::coordinator::SourceCoordinator;
use leakrs::infrastructure::cluster::transport::{JobListener, ReplicaAddress, ResultPublisher};
use leakrs::workers::replica_worker::ReplicaWorker;
use leakrs::workers::result_sink::LocalResultSink;
use leakrs::workers::scan_worker::{ScanStores, ScanWorker};
use leakrs::workers::Worker;
use std::sync::Arc;
use std::time::Duration;

const TOPIC: &str = "leakrs-test";

async fn start_replica() -> (ReplicaAddress, ScanStores) {
    let publisher = ResultPublisher::bind("127.0.0.1:0", TOPIC).await.unwrap();
    let commands = JobListener::bind("127.0.0.1:0", TOPIC).await.unwrap();
    let address = ReplicaAddress {
        publish: publisher.local_addr().to_string(),
        job: commands.local_addr().to_string(),
    };

    let stores = ScanStores::in_memory();
    let replica = ReplicaWorker::new(
        Arc::new(publisher),
        commands,
        stores.clone(),
        Arc::new(OfflineClient),
    );
    tokio::spawn(async move {
        let _ = replica.run().await;
    });
    (address, stores)
}

async fn stored_urls(stores: &ScanStores) -> Vec<String> {
    let mut urls: Vec<String> = stores
        .results
        .list(None)
        .await
        .unwrap()
        .into_iter()
        .map(|record| record.url)
        .collect();
    urls.sort();
    urls
}

#[tokio::test]
async fn test_cluster_scan_matches_standalone_scan() {
    let port = start_site().await;
    let hosts: Vec<String> = (0..10).map(|i| format!("d{}.test", i)).collect();
    let host_refs: Vec<&str> = hosts.iter().map(String::as_str).collect();
    let dns_cache = loopback_cache(&host_refs);
    let domains: Vec<String> = hosts
        .iter()
        .map(|host| format!("http://{}:{}", host, port))
        .collect();
    let rules = vec![EndpointRule::new("/phpinfo.php", "phpinfo()")];

    let standalone_stores = ScanStores::in_memory();
    ScanWorker::new(
        ScanSettings::default(),
        rules.clone(),
        standalone_stores.clone(),
        Arc::new(OfflineClient),
        Arc::new(LocalResultSink::new(standalone_stores.results.clone())),
    )
    .with_dns_seed(dns_cache.clone())
    .run(&Workload::new(), &domains)
    .await
    .unwrap();
    let expected = stored_urls(&standalone_stores).await;
    assert_eq!(expected.len(), 5);

    let (first, first_stores) = start_replica().await;
    let (second, second_stores) = start_replica().await;
    let coordinator = SourceCoordinator::new(vec![first, second], TOPIC, Duration::from_secs(5));

    let source_stores = ScanStores::in_memory();
    let report = tokio::time::timeout(
        Duration::from_secs(30),
        coordinator.dispatch(
            &Workload::new(),
            &domains,
            &rules,
            &ScanSettings::default(),
            dns_cache,
            Arc::new(LocalResultSink::new(source_stores.results.clone())),
        ),
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(report.finished, 2);
    assert_eq!(report.stored, 5);
    assert_eq!(stored_urls(&source_stores).await, expected);

    // d0..d4 go to the first replica, d5..d9 to the second
    assert_eq!(stored_urls(&first_stores).await.len(), 3);
    assert_eq!(stored_urls(&second_stores).await.len(), 2);
}
