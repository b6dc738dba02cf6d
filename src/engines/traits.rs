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

use async_trait::async_trait;
use std::net::IpAddr;
use thiserror::Error;

/// 引擎错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    /// 请求失败
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    /// URL无效
    #[error("Invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// 重定向次数过多
    #[error("Too many redirects ({0})")]
    TooManyRedirects(usize),
    /// 其他错误
    #[error("Other error: {0}")]
    Other(String),
}

impl EngineError {
    /// 判断错误是否为超时
    pub fn is_timeout(&self) -> bool {
        match self {
            EngineError::RequestFailed(e) => e.is_timeout(),
            _ => false,
        }
    }
}

/// DNS查询错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DnsError {
    /// 应答为空，属于确定的否定结果，不再重试
    #[error("No records found for {0}")]
    NoRecords(String),
    /// 无法连接DNS服务器
    #[error("Could not contact DNS server {0}")]
    Unreachable(IpAddr),
    /// 其他可重试的查询错误
    #[error("DNS query failed: {0}")]
    Query(String),
}

impl DnsError {
    /// 判断是否为确定的否定结果
    pub fn is_definitive(&self) -> bool {
        matches!(self, DnsError::NoRecords(_))
    }
}

/// DNS服务器客户端特质
///
/// 向指定的DNS服务器查询一次A记录
#[async_trait]
pub trait NameserverClient: Send + Sync {
    async fn query(&self, domain: &str, nameserver: IpAddr) -> Result<IpAddr, DnsError>;
}
