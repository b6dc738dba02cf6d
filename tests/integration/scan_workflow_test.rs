// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{loopback_cache, start_site, OfflineClient};
use leakrs::config::settings::{NotificationMethod, NotificationTarget, ScanSettings};
use leakrs::domain::models::task::EndpointRule;
use leakrs::domain::models::workload::Workload;
use leakrs::infrastructure::services::webhook_service_impl::WebhookNotifier;
use leakrs::workers::result_sink::LocalResultSink;
use leakrs::workers::scan_worker::{ScanStores, ScanWorker};
use std::collections::HashMap;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_standalone_scan_notifies_each_hit_once() {
    let port = start_site().await;
    let webhook = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/notify"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&webhook)
        .await;

    let notifier = WebhookNotifier::new(
        vec![NotificationTarget {
            name: "hook".to_string(),
            url: format!("{}/notify?found=*url*", webhook.uri()),
            method: NotificationMethod::Get,
            headers: HashMap::new(),
            data: HashMap::new(),
        }],
        None,
    );
    let stores = ScanStores::in_memory();
    let sink = Arc::new(LocalResultSink::new(stores.results.clone()).with_notifier(Arc::new(notifier)));

    // The redirect lands on the same page, so it must not produce a second hit
    let worker = ScanWorker::new(
        ScanSettings::default(),
        vec![
            EndpointRule::new("/phpinfo.php", "phpinfo()"),
            EndpointRule::new("/old-info", "phpinfo()"),
        ],
        stores.clone(),
        Arc::new(OfflineClient),
        sink,
    )
    .with_dns_seed(loopback_cache(&["d0.test", "d1.test", "d2.test"]));

    let workload = Workload::new();
    let domains: Vec<String> = (0..3).map(|i| format!("http://d{}.test:{}", i, port)).collect();

    let first = worker.run(&workload, &domains).await.unwrap();
    assert_eq!(first.tasks, 6);
    assert_eq!(first.accepted, 2);

    let second = worker.run(&workload, &domains).await.unwrap();
    assert_eq!(second.accepted, 0);

    let mut urls: Vec<String> = stores
        .results
        .list(Some(workload.id()))
        .await
        .unwrap()
        .into_iter()
        .map(|record| record.url)
        .collect();
    urls.sort();
    assert_eq!(
        urls,
        vec![
            format!("http://d0.test:{}/phpinfo.php", port),
            format!("http://d2.test:{}/phpinfo.php", port),
        ]
    );
}

#[tokio::test]
async fn test_redirect_to_another_site_is_not_followed() {
    let port = start_site().await;
    let stores = ScanStores::in_memory();
    let sink = Arc::new(LocalResultSink::new(stores.results.clone()));
    let worker = ScanWorker::new(
        ScanSettings::default(),
        vec![EndpointRule::new("/leave", "phpinfo()")],
        stores.clone(),
        Arc::new(OfflineClient),
        sink,
    )
    .with_dns_seed(loopback_cache(&["d0.test", "evil.test"]));

    let summary = worker
        .run(&Workload::new(), &[format!("http://d0.test:{}", port)])
        .await
        .unwrap();
    assert_eq!(summary.tasks, 1);
    assert_eq!(summary.fetched, 0);
    assert_eq!(summary.accepted, 0);
    assert!(stores.results.list(None).await.unwrap().is_empty());
}
