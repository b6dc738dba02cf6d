// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::task::{EndpointRule, ScanTask};
use crate::utils::url_utils::ensure_scheme;
use std::collections::HashSet;

/// 规范化域名列表
///
/// 去掉首尾空白和空行，缺少协议时补上 `https://`；
/// `scan_both_schemes` 为真时每个域名同时以 `https://` 和 `http://` 探测。
/// 结果去重并保持输入顺序
pub fn normalize_domains<S: AsRef<str>>(raw: &[S], scan_both_schemes: bool) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut domains = Vec::new();

    for domain in raw {
        let domain = domain.as_ref().trim();
        if domain.is_empty() {
            continue;
        }

        let candidates = if scan_both_schemes {
            let bare = domain
                .split_once("://")
                .map(|(_, rest)| rest)
                .unwrap_or(domain);
            vec![format!("https://{}", bare), format!("http://{}", bare)]
        } else {
            vec![ensure_scheme(domain, "https")]
        };

        for candidate in candidates {
            if seen.insert(candidate.clone()) {
                domains.push(candidate);
            }
        }
    }
    domains
}

/// 生成域名与端点规则的笛卡尔积
///
/// 较短的列表作为外层循环
pub fn build_tasks(domains: &[String], rules: &[EndpointRule]) -> Vec<ScanTask> {
    let mut tasks = Vec::with_capacity(domains.len() * rules.len());
    if domains.len() <= rules.len() {
        for domain in domains {
            tasks.extend(rules.iter().map(|rule| ScanTask::new(domain, rule)));
        }
    } else {
        for rule in rules {
            tasks.extend(domains.iter().map(|domain| ScanTask::new(domain, rule)));
        }
    }
    tasks
}

/// 把列表切成 `shards` 个连续分片
///
/// 分片大小最多相差一，靠前的分片更大；元素不足时允许出现空分片
pub fn split_into_shards<T: Clone>(items: &[T], shards: usize) -> Vec<Vec<T>> {
    if shards == 0 {
        return Vec::new();
    }

    let base = items.len() / shards;
    let extra = items.len() % shards;
    let mut result = Vec::with_capacity(shards);
    let mut start = 0;
    for index in 0..shards {
        let size = base + usize::from(index < extra);
        result.push(items[start..start + size].to_vec());
        start += size;
    }
    result
}
