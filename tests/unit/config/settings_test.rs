// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use leakrs::config::settings::{ClusterRole, NotificationMethod, Settings, StorageBackend};
use std::io::Write;

#[test]
fn test_yaml_configuration() {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    file.write_all(
        br#"
scan:
  status: 200
  nameservers: ["1.1.1.1", "9.9.9.9"]
cluster:
  role: replica
  upgrade_command: "git pull && cargo build --release"
storage:
  backend: redis
  redis_url: "redis://127.0.0.1:6379"
notifications:
  - name: slack
    url: "https://hooks.example.com/services/x"
    method: POST
    headers:
      Content-Type: application/json
    data:
      text: "Found *url*"
"#,
    )
    .unwrap();

    let settings = Settings::from_file(file.path().to_str().unwrap()).unwrap();
    assert_eq!(settings.scan.status, Some(200));
    assert_eq!(settings.scan.nameserver_ips().len(), 2);
    assert_eq!(settings.scan.timeout_secs, 10);
    assert_eq!(settings.cluster.role, ClusterRole::Replica);
    assert_eq!(
        settings.cluster.upgrade_command.as_deref(),
        Some("git pull && cargo build --release")
    );
    assert_eq!(settings.storage.backend, StorageBackend::Redis);
    assert_eq!(settings.storage.key_prefix, "leakrs");
    assert_eq!(settings.notifications.len(), 1);
    assert_eq!(settings.notifications[0].method, NotificationMethod::Post);
    assert_eq!(settings.notifications[0].data["text"], "Found *url*");
}

#[test]
fn test_missing_file_is_an_error() {
    assert!(Settings::from_file("/definitely/not/here.toml").is_err());
}
