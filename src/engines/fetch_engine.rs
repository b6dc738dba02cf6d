// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::config::settings::ScanSettings;
use crate::domain::models::fetch_result::FetchResult;
use crate::domain::models::task::ScanTask;
use crate::domain::repositories::baseline_repository::BaselineRepository;
use crate::engines::dns_resolver::DnsResolver;
use crate::engines::statistics::ScanCounters;
use crate::engines::traits::EngineError;
use crate::utils::url_utils::{baseline_key, is_same_site, resolve_url, with_ip};
use rand::seq::SliceRandom;
use reqwest::header::{CONNECTION, CONTENT_TYPE, HOST, LOCATION};
use reqwest::Response;
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, instrument, warn};
use url::Url;

/// 404基线样本路径
pub const NOT_FOUND_PATH: &str = "/not_found_page.html";

/// 视为多媒体的 Content-Type 关键字
const MULTIMEDIA_TYPES: &[&str] = &["audio", "image", "video", "font"];

/// 抓取引擎
///
/// 以信号量限制并发，按IP直连目标并携带原始 `Host` 头，
/// 只跟随同站重定向
pub struct FetchEngine {
    client: reqwest::Client,
    resolver: Arc<DnsResolver>,
    baselines: Option<Arc<dyn BaselineRepository>>,
    settings: ScanSettings,
    counters: Arc<ScanCounters>,
}

impl FetchEngine {
    /// 创建抓取引擎
    ///
    /// # 参数
    ///
    /// * `settings` - 扫描配置
    /// * `resolver` - DNS解析器
    /// * `counters` - 共享计数器
    pub fn new(
        settings: ScanSettings,
        resolver: Arc<DnsResolver>,
        counters: Arc<ScanCounters>,
    ) -> Result<Self, EngineError> {
        // The URL host is an IP, so certificates can never match
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(settings.timeout())
            .redirect(reqwest::redirect::Policy::none())
            .danger_accept_invalid_certs(true)
            .pool_max_idle_per_host(0)
            .build()?;

        Ok(Self {
            client,
            resolver,
            baselines: None,
            settings,
            counters,
        })
    }

    /// 已存在基线的源不再请求404样本
    pub fn with_baseline_store(mut self, baselines: Arc<dyn BaselineRepository>) -> Self {
        self.baselines = Some(baselines);
        self
    }

    pub fn counters(&self) -> Arc<ScanCounters> {
        self.counters.clone()
    }

    /// 并发执行所有任务
    ///
    /// 任务先被打乱顺序；所有任务完成后返回的通道关闭
    pub fn scan(self: Arc<Self>, mut tasks: Vec<ScanTask>) -> mpsc::Receiver<FetchResult> {
        tasks.shuffle(&mut rand::rng());

        let concurrency = self.settings.max_concurrency.max(1);
        let (tx, rx) = mpsc::channel(concurrency);
        let semaphore = Arc::new(Semaphore::new(concurrency));

        tokio::spawn(async move {
            for task in tasks {
                let Ok(permit) = semaphore.clone().acquire_owned().await else {
                    break;
                };
                if tx.is_closed() {
                    debug!("Result receiver dropped, stopping dispatch");
                    break;
                }

                let engine = self.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    let _permit = permit;
                    if let Some(result) = engine.fetch_task(task).await {
                        let _ = tx.send(result).await;
                    }
                });
            }
        });

        rx
    }

    #[instrument(skip(self, task), fields(url = %task.composed_url))]
    async fn fetch_task(&self, task: ScanTask) -> Option<FetchResult> {
        match self.fetch(&task).await {
            Ok(result) => result,
            Err(e) => {
                if e.is_timeout() {
                    self.counters.timeout();
                }
                debug!("Fetching {} failed: {}", task.composed_url, e);
                None
            }
        }
    }

    async fn fetch(&self, task: &ScanTask) -> Result<Option<FetchResult>, EngineError> {
        let mut current = Url::parse(&task.composed_url)?;
        let mut redirects = 0;

        loop {
            let Some(host) = current.host_str().map(str::to_string) else {
                return Ok(None);
            };
            let Some(ip) = self.resolver.resolve(&host).await else {
                debug!("Could not resolve {}, skipping {}", host, current);
                return Ok(None);
            };

            let response = self.send(&current, &host, ip).await?;
            let status = response.status();

            if status.is_redirection() {
                let Some(location) = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|value| value.to_str().ok())
                else {
                    debug!("Redirect from {} without a location header", current);
                    return Ok(None);
                };

                let target = resolve_url(&current, location)?;
                if !is_same_site(&current, &target) {
                    debug!("Not following redirect from {} to {}", current, target);
                    return Ok(None);
                }

                redirects += 1;
                if redirects > self.settings.max_redirects {
                    return Err(EngineError::TooManyRedirects(self.settings.max_redirects));
                }
                current = target;
                continue;
            }

            if let Some(expected) = self.settings.status {
                if status.as_u16() != expected {
                    return Ok(None);
                }
            }

            if self.settings.ignore_multimedia && is_multimedia(&response) {
                debug!("Ignoring multimedia response from {}", current);
                return Ok(None);
            }

            let headers = response
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|v| (name.as_str().to_string(), v.to_string()))
                })
                .collect::<HashMap<_, _>>();

            let Some(content) = self.read_body(response).await? else {
                debug!("Response from {} exceeds the content size limit", current);
                return Ok(None);
            };

            let not_found_baseline = self.fetch_baseline(task, &current, &host, ip).await;

            return Ok(Some(FetchResult {
                original_url: task.composed_url.clone(),
                final_url: current.to_string(),
                domain: task.domain.clone(),
                content,
                headers,
                status: status.as_u16(),
                pattern: task.pattern.clone(),
                not_found_baseline,
            }));
        }
    }

    async fn send(&self, url: &Url, host: &str, ip: IpAddr) -> Result<Response, EngineError> {
        let pinned = with_ip(url, ip)?;
        self.counters.request_started();
        let response = self
            .client
            .get(pinned)
            .header(HOST, host)
            .header(CONNECTION, "close")
            .send()
            .await;
        self.counters.request_finished();
        Ok(response?)
    }

    /// 读取响应体，超过大小限制时返回 `None`
    async fn read_body(&self, mut response: Response) -> Result<Option<String>, EngineError> {
        let limit = self.settings.max_content_size;
        if response
            .content_length()
            .is_some_and(|length| length > limit as u64)
        {
            return Ok(None);
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            body.extend_from_slice(&chunk);
            if body.len() > limit {
                return Ok(None);
            }
        }
        Ok(Some(String::from_utf8_lossy(&body).into_owned()))
    }

    /// 尽力获取同源的404页面样本，失败时返回 `None`
    async fn fetch_baseline(
        &self,
        task: &ScanTask,
        current: &Url,
        host: &str,
        ip: IpAddr,
    ) -> Option<String> {
        if let Some(baselines) = &self.baselines {
            match baselines.find(&baseline_key(&task.domain)).await {
                Ok(Some(_)) => return None,
                Ok(None) => {}
                Err(e) => warn!("Failed to look up not-found page for {}: {}", task.domain, e),
            }
        }

        let url = current.join(NOT_FOUND_PATH).ok()?;
        match self.send(&url, host, ip).await {
            Ok(response) => match self.read_body(response).await {
                Ok(content) => content,
                Err(e) => {
                    debug!("Failed to read not-found page {}: {}", url, e);
                    None
                }
            },
            Err(e) => {
                debug!("Failed to fetch not-found page {}: {}", url, e);
                None
            }
        }
    }
}

fn is_multimedia(response: &Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| {
            let value = value.to_lowercase();
            MULTIMEDIA_TYPES.iter().any(|kind| value.contains(kind))
        })
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "fetch_engine_test.rs"]
mod tests;
