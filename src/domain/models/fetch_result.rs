// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::IpAddr;

/// 抓取结果
///
/// 一个任务经过DNS解析、请求和重定向处理后的最终响应
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// 任务原始URL
    pub original_url: String,
    /// 跟随重定向后的最终URL
    pub final_url: String,
    /// 带协议的域名
    pub domain: String,
    /// 解码后的响应内容
    pub content: String,
    /// 响应头
    pub headers: HashMap<String, String>,
    /// HTTP状态码
    pub status: u16,
    /// 任务模式字符串
    pub pattern: String,
    /// 同一源的404页面样本
    pub not_found_baseline: Option<String>,
}

/// DNS缓存条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsCacheEntry {
    pub domain: String,
    pub ip_address: IpAddr,
}

/// 已保存的命中结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub workload_uuid: String,
    pub url: String,
    pub content: String,
}
