// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::{NotificationMethod, NotificationTarget};
use crate::domain::services::notification_service::NotificationService;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{info, warn};

type HmacSha256 = Hmac<Sha256>;

/// 通知模板中会被替换为命中URL的占位符
pub const URL_MARKER: &str = "*url*";

/// Webhook通知服务实现
///
/// 对每个配置的目标发送一次请求
pub struct WebhookNotifier {
    /// HTTP 客户端
    client: reqwest::Client,
    /// 通知目标
    targets: Vec<NotificationTarget>,
    /// 签名密钥
    secret: Option<String>,
}

impl WebhookNotifier {
    /// 创建新的 Webhook 通知服务
    pub fn new(targets: Vec<NotificationTarget>, secret: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();

        Self {
            client,
            targets,
            secret: secret.filter(|s| !s.is_empty()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// 为负载生成签名
    fn generate_signature(secret: &str, payload: &str, timestamp: i64) -> Result<String> {
        let message = format!("{}.{}", timestamp, payload);
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| anyhow!("invalid webhook secret: {}", e))?;
        mac.update(message.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    async fn send_to(&self, target: &NotificationTarget, found_url: &str) -> Result<()> {
        let url = target
            .url
            .replace(URL_MARKER, &urlencoding::encode(found_url));

        let mut request = match target.method {
            NotificationMethod::Get => self.client.get(&url),
            NotificationMethod::Post => self.client.post(&url),
        };
        for (name, value) in &target.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let data = target
            .data
            .iter()
            .map(|(key, value)| (key.clone(), value.replace(URL_MARKER, found_url)))
            .collect::<HashMap<_, _>>();

        let signed_payload = match target.method {
            NotificationMethod::Get => url.clone(),
            NotificationMethod::Post => serde_json::to_string(&data)?,
        };
        if target.method == NotificationMethod::Post {
            // The configured headers already carry the JSON content type
            request = if sends_json(&target.headers) {
                request.body(signed_payload.clone())
            } else {
                request.form(&data)
            };
        }

        if let Some(secret) = &self.secret {
            let timestamp = chrono::Utc::now().timestamp();
            let signature = Self::generate_signature(secret, &signed_payload, timestamp)?;
            request = request
                .header("X-Leakrs-Signature", signature)
                .header("X-Leakrs-Timestamp", timestamp.to_string());
        }

        let response = request.send().await?;
        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(anyhow!(
                "Notification {} failed with status {}: {}",
                target.name,
                status,
                body
            ))
        }
    }
}

fn sends_json(headers: &HashMap<String, String>) -> bool {
    headers.iter().any(|(name, value)| {
        name.eq_ignore_ascii_case("content-type") && value.to_lowercase().contains("application/json")
    })
}

#[async_trait]
impl NotificationService for WebhookNotifier {
    async fn send(&self, url: &str) -> Result<()> {
        let mut failures = Vec::new();
        for target in &self.targets {
            match self.send_to(target, url).await {
                Ok(()) => info!("Sent notification {} for {}", target.name, url),
                Err(e) => {
                    warn!("Notification {} for {} failed: {}", target.name, url, e);
                    failures.push(target.name.clone());
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(anyhow!("notification targets failed: {}", failures.join(", ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, body_string_contains, header, header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn target(name: &str, url: String, method: NotificationMethod) -> NotificationTarget {
        NotificationTarget {
            name: name.to_string(),
            url,
            method,
            headers: HashMap::new(),
            data: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn test_get_replaces_url_marker() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/notify"))
            .and(query_param("u", "https://a.com/.env"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = WebhookNotifier::new(
            vec![target("get", format!("{}/notify?u=*url*", server.uri()), NotificationMethod::Get)],
            None,
        );
        notifier.send("https://a.com/.env").await.unwrap();
    }

    #[tokio::test]
    async fn test_post_json_body_is_signed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(header("content-type", "application/json"))
            .and(header_exists("X-Leakrs-Signature"))
            .and(header_exists("X-Leakrs-Timestamp"))
            .and(body_json(serde_json::json!({ "text": "found https://a.com/.env" })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let mut post = target("slack", format!("{}/hook", server.uri()), NotificationMethod::Post);
        post.headers.insert("Content-Type".into(), "application/json".into());
        post.data.insert("text".into(), "found *url*".into());

        let notifier = WebhookNotifier::new(vec![post], Some("secret".into()));
        notifier.send("https://a.com/.env").await.unwrap();
    }

    #[tokio::test]
    async fn test_json_content_type_is_sent_once() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let app = axum::Router::new().route(
            "/hook",
            axum::routing::post(move |headers: axum::http::HeaderMap| {
                let tx = tx.clone();
                async move {
                    let _ = tx.send(headers.get_all(axum::http::header::CONTENT_TYPE).iter().count());
                    axum::http::StatusCode::NO_CONTENT
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let mut post = target("json", format!("http://{}/hook", addr), NotificationMethod::Post);
        post.headers.insert("Content-Type".into(), "application/json".into());
        post.data.insert("text".into(), "*url*".into());

        WebhookNotifier::new(vec![post], None)
            .send("https://a.com/.env")
            .await
            .unwrap();
        assert_eq!(rx.recv().await, Some(1));
    }

    #[tokio::test]
    async fn test_post_without_json_header_sends_form() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/form"))
            .and(body_string_contains("url=https%3A%2F%2Fa.com%2F.env"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let mut post = target("form", format!("{}/form", server.uri()), NotificationMethod::Post);
        post.data.insert("url".into(), "*url*".into());

        WebhookNotifier::new(vec![post], None)
            .send("https://a.com/.env")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_failed_target_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let notifier = WebhookNotifier::new(
            vec![target("broken", format!("{}/x", server.uri()), NotificationMethod::Get)],
            None,
        );
        let err = notifier.send("https://a.com/").await.unwrap_err();
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn test_signature_is_stable() {
        let a = WebhookNotifier::generate_signature("k", "payload", 1).unwrap();
        let b = WebhookNotifier::generate_signature("k", "payload", 1).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }
}
