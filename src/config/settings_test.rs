// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::*;
use std::io::Write;

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_defaults_applied_for_empty_file() {
    let file = write_config("");
    let settings = Settings::from_file(file.path().to_str().unwrap()).unwrap();

    assert_eq!(settings.scan, ScanSettings::default());
    assert_eq!(settings.scan.max_content_size, 1_000_000);
    assert_eq!(settings.scan.max_result_and_404_percent_diff, 60);
    assert_eq!(settings.scan.max_diff_chars, 4096);
    assert!(settings.scan.ignore_multimedia);
    assert_eq!(settings.scan.status, None);
    assert_eq!(settings.cluster.role, ClusterRole::Disabled);
    assert_eq!(settings.cluster.publish_port, 1337);
    assert_eq!(settings.cluster.job_port, 1338);
    assert_eq!(settings.cluster.topic, "leakrs_event");
    assert_eq!(settings.cluster.receive_timeout(), Duration::from_secs(120));
    assert_eq!(settings.storage.backend, StorageBackend::Memory);
    assert!(settings.notifications.is_empty());
    assert!(settings.webhook_secret.is_none());
}

#[test]
fn test_file_overrides_defaults() {
    let file = write_config(
        r#"
[scan]
status = 200
max_concurrency = 5
nameservers = ["1.1.1.1"]

[cluster]
role = "source"
servers = ["10.0.0.1", "10.0.0.2"]

[storage]
backend = "redis"
redis_url = "redis://127.0.0.1:6379"

[[notifications]]
name = "slack"
url = "https://hooks.example.com/notify?u=*url*"
method = "POST"
headers = { "Content-Type" = "application/json" }
data = { text = "found *url*" }
"#,
    );
    let settings = Settings::from_file(file.path().to_str().unwrap()).unwrap();

    assert_eq!(settings.scan.status, Some(200));
    assert_eq!(settings.scan.max_concurrency, 5);
    assert_eq!(settings.scan.timeout_secs, 10);
    assert_eq!(settings.cluster.role, ClusterRole::Source);
    assert_eq!(settings.cluster.servers.len(), 2);
    assert_eq!(settings.storage.backend, StorageBackend::Redis);
    assert_eq!(settings.notifications.len(), 1);
    assert_eq!(settings.notifications[0].method, NotificationMethod::Post);
    assert_eq!(settings.notifications[0].data["text"], "found *url*");
}

#[test]
fn test_nameserver_ips_skip_invalid_entries() {
    let scan = ScanSettings {
        nameservers: vec!["8.8.8.8".into(), "not-an-ip".into(), " 1.1.1.1 ".into()],
        ..ScanSettings::default()
    };
    let ips = scan.nameserver_ips();
    assert_eq!(ips.len(), 2);
    assert_eq!(ips[1].to_string(), "1.1.1.1");
}

#[test]
fn test_scan_settings_partial_json() {
    let scan: ScanSettings = serde_json::from_str(r#"{"status": 200, "timeout_secs": 3}"#).unwrap();
    assert_eq!(scan.status, Some(200));
    assert_eq!(scan.timeout(), Duration::from_secs(3));
    assert_eq!(scan.max_concurrency, 100);
}
