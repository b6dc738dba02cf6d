// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::pattern::Pattern;
use crate::utils::url_utils::compose_url;
use serde::{Deserialize, Serialize};

/// 端点规则
///
/// 待探测的路径以及判断命中所需的模式
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EndpointRule {
    /// 路径，例如 `/.git/config`
    pub endpoint: String,
    /// 内容类型标签或字面字符串
    pub pattern: String,
}

impl EndpointRule {
    pub fn new(endpoint: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            pattern: pattern.into(),
        }
    }

    pub fn pattern(&self) -> Pattern {
        Pattern::parse(&self.pattern)
    }
}

/// 扫描任务
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanTask {
    /// 带协议的域名
    pub domain: String,
    /// 原始端点路径
    pub raw_endpoint: String,
    /// 拼接后的完整URL
    pub composed_url: String,
    /// 模式字符串
    pub pattern: String,
}

impl ScanTask {
    pub fn new(domain: &str, rule: &EndpointRule) -> Self {
        Self {
            domain: domain.to_string(),
            raw_endpoint: rule.endpoint.clone(),
            composed_url: compose_url(domain, &rule.endpoint),
            pattern: rule.pattern.clone(),
        }
    }
}

/// 为URL挑选最匹配的端点规则
///
/// 所有路径（去掉末尾 `/`）出现在URL中的规则里，路径最长者胜出；
/// 长度相同时取排在前面的规则
pub fn longest_matching_rule<'a>(rules: &'a [EndpointRule], url: &str) -> Option<&'a EndpointRule> {
    let url = url.trim_end_matches('/');
    rules
        .iter()
        .filter(|rule| {
            let endpoint = rule.endpoint.trim_end_matches('/');
            !endpoint.is_empty() && url.contains(endpoint)
        })
        .rev()
        .max_by_key(|rule| rule.endpoint.trim_end_matches('/').len())
}
