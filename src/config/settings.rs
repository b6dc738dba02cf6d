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

use crate::domain::services::relevance_filter::DEFAULT_MAX_DIFF_CHARS;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

/// 默认浏览器 User-Agent
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// 应用程序配置设置
///
/// 包含扫描、集群、存储、输入、遥测和通知等所有配置项
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 扫描配置
    pub scan: ScanSettings,
    /// 集群配置
    pub cluster: ClusterSettings,
    /// 存储配置
    pub storage: StorageSettings,
    /// 输入配置
    pub input: InputSettings,
    /// 遥测配置
    pub telemetry: TelemetrySettings,
    /// 结果通知目标
    #[serde(default)]
    pub notifications: Vec<NotificationTarget>,
    /// Webhook签名密钥，为空时不签名
    #[serde(default)]
    pub webhook_secret: Option<String>,
}

/// 扫描配置设置
///
/// 会随 `JOB` 消息一起发送给副本节点，所以需要可序列化
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    /// 只保留该状态码的响应，为空时不过滤
    pub status: Option<u16>,
    /// 单个HTTP请求超时时间（秒）
    pub timeout_secs: u64,
    /// 单次DNS查询超时时间（秒）
    pub dns_timeout_secs: u64,
    /// 是否丢弃音频、图片、视频和字体响应
    pub ignore_multimedia: bool,
    /// 响应体最大字节数
    pub max_content_size: usize,
    /// 最大并发请求数
    pub max_concurrency: usize,
    /// 最多跟随的重定向次数
    pub max_redirects: usize,
    /// DNS服务器列表
    pub nameservers: Vec<String>,
    /// 请求使用的 User-Agent
    pub user_agent: String,
    /// 与404基线相似度判定阈值（百分比差异，小于等于即拒绝）
    pub max_result_and_404_percent_diff: u32,
    /// 与404基线比较时最多使用的字符数
    pub max_diff_chars: usize,
    /// 统计信息上报间隔（秒）
    pub statistics_interval_secs: u64,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            status: None,
            timeout_secs: 10,
            dns_timeout_secs: 5,
            ignore_multimedia: true,
            max_content_size: 1_000_000,
            max_concurrency: 100,
            max_redirects: 10,
            nameservers: vec!["8.8.8.8".to_string(), "8.8.4.4".to_string()],
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_result_and_404_percent_diff: 60,
            max_diff_chars: DEFAULT_MAX_DIFF_CHARS,
            statistics_interval_secs: 5,
        }
    }
}

impl ScanSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn dns_timeout(&self) -> Duration {
        Duration::from_secs(self.dns_timeout_secs)
    }

    pub fn statistics_interval(&self) -> Duration {
        Duration::from_secs(self.statistics_interval_secs.max(1))
    }

    /// 解析DNS服务器地址，无法解析的条目会被跳过
    pub fn nameserver_ips(&self) -> Vec<IpAddr> {
        self.nameservers
            .iter()
            .filter_map(|ns| match ns.trim().parse::<IpAddr>() {
                Ok(ip) => Some(ip),
                Err(_) => {
                    tracing::warn!("Ignoring invalid nameserver address: {}", ns);
                    None
                }
            })
            .collect()
    }
}

/// 集群角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusterRole {
    /// 主节点：分发任务并汇总结果
    Source,
    /// 副本节点：执行分片任务
    Replica,
    /// 单机模式
    Disabled,
}

impl fmt::Display for ClusterRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ClusterRole::Source => "source",
            ClusterRole::Replica => "replica",
            ClusterRole::Disabled => "disabled",
        };
        f.write_str(name)
    }
}

/// 集群配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ClusterSettings {
    /// 节点角色
    pub role: ClusterRole,
    /// 副本节点地址（仅主节点使用）
    #[serde(default)]
    pub servers: Vec<String>,
    /// 消息主题
    pub topic: String,
    /// 广播通道端口
    pub publish_port: u16,
    /// 任务通道端口
    pub job_port: u16,
    /// 副本节点监听地址
    pub bind_host: String,
    /// 订阅端接收超时时间（秒），超时后重新订阅
    pub receive_timeout_secs: u64,
    /// 收到 UPGRADE 时执行的命令
    pub upgrade_command: Option<String>,
    /// 需要恢复的工作负载ID（仅主节点使用）
    pub resume_workload: Option<String>,
}

impl ClusterSettings {
    pub fn receive_timeout(&self) -> Duration {
        Duration::from_secs(self.receive_timeout_secs)
    }
}

/// 存储后端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Redis,
}

/// 存储配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// 存储后端类型
    pub backend: StorageBackend,
    /// Redis连接URL
    pub redis_url: Option<String>,
    /// Redis键前缀
    pub key_prefix: String,
}

/// 输入配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct InputSettings {
    /// 域名列表文件，每行一个
    pub domains_file: Option<String>,
    /// 端点规则文件（JSON数组）
    pub endpoints_file: Option<String>,
    /// 是否同时扫描 https 和 http
    pub scan_both_schemes: bool,
}

/// 遥测配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetrySettings {
    /// 日志级别
    pub log_level: String,
    /// 是否输出JSON格式日志
    pub json_logs: bool,
    /// Prometheus 指标监听地址，为空时不启动
    pub metrics_addr: Option<String>,
}

/// 通知请求方法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NotificationMethod {
    Get,
    Post,
}

/// 结果通知目标
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationTarget {
    /// 目标名称
    pub name: String,
    /// 请求地址，`*url*` 会被替换为命中的URL
    pub url: String,
    /// 请求方法
    pub method: NotificationMethod,
    /// 附加请求头
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// POST 请求体字段
    #[serde(default)]
    pub data: HashMap<String, String>,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次加载默认值、配置文件和 `LEAKRS__` 前缀的环境变量
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        Self::builder()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("LEAKRS")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("scan.nameservers")
                    .with_list_parse_key("cluster.servers")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// 从指定配置文件加载（不读取环境变量）
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        Self::builder()?
            .add_source(File::with_name(path))
            .build()?
            .try_deserialize()
    }

    fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        let scan = ScanSettings::default();
        Config::builder()
            // Scan defaults
            .set_default("scan.timeout_secs", scan.timeout_secs)?
            .set_default("scan.dns_timeout_secs", scan.dns_timeout_secs)?
            .set_default("scan.ignore_multimedia", scan.ignore_multimedia)?
            .set_default("scan.max_content_size", scan.max_content_size as u64)?
            .set_default("scan.max_concurrency", scan.max_concurrency as u64)?
            .set_default("scan.max_redirects", scan.max_redirects as u64)?
            .set_default("scan.nameservers", scan.nameservers.clone())?
            .set_default("scan.user_agent", scan.user_agent.clone())?
            .set_default(
                "scan.max_result_and_404_percent_diff",
                scan.max_result_and_404_percent_diff,
            )?
            .set_default("scan.max_diff_chars", scan.max_diff_chars as u64)?
            .set_default("scan.statistics_interval_secs", scan.statistics_interval_secs)?
            // Cluster defaults
            .set_default("cluster.role", "disabled")?
            .set_default("cluster.topic", "leakrs_event")?
            .set_default("cluster.publish_port", 1337)?
            .set_default("cluster.job_port", 1338)?
            .set_default("cluster.bind_host", "0.0.0.0")?
            .set_default("cluster.receive_timeout_secs", 120)?
            // Storage defaults
            .set_default("storage.backend", "memory")?
            .set_default("storage.key_prefix", "leakrs")?
            // Input defaults
            .set_default("input.scan_both_schemes", false)?
            // Telemetry defaults
            .set_default("telemetry.log_level", "info")?
            .set_default("telemetry.json_logs", false)
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
