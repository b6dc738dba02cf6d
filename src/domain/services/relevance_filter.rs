// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::pattern::Pattern;
use crate::domain::services::content_classifier::ContentClassifier;
use crate::domain::services::diff::bounded_diff_percent;
use tracing::{debug, info};

/// 整体等于这些内容的响应一律视为无效
const DENIED_BODIES: &[&str] = &[
    "forbidden",
    "ok",
    "{}",
    "invalid request!",
    "400 bad request",
    "404",
    "",
];

/// 包含这些短语的响应一律视为无效
const DENIED_PHRASES: &[&str] = &[
    "access denied",
    "not found",
    "unauthorized",
    "error 404",
    "error 403",
    "does not exist",
    "deny_pc",
    "the requested url was rejected",
];

/// 与基线比较时默认使用的最大字符数
pub const DEFAULT_MAX_DIFF_CHARS: usize = 4096;

/// 与404基线比较的结论
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaselineVerdict {
    /// 通过比较，接受结果
    Accept,
    /// 字面模式恰好与基线类型相同，不做比较直接拒绝
    CoincidentalType,
    /// 与基线过于相似
    TooSimilar { percent: u32 },
}

impl BaselineVerdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, BaselineVerdict::Accept)
    }
}

/// 相关性过滤器
///
/// 先按黑名单做词法拒绝，再用模式测试内容；
/// 与404基线的比较由 [`RelevanceFilter::compare_with_baseline`] 完成
#[derive(Debug, Clone)]
pub struct RelevanceFilter {
    classifier: ContentClassifier,
    max_percent_diff: u32,
    max_diff_chars: usize,
}

impl RelevanceFilter {
    pub fn new(max_percent_diff: u32) -> Self {
        Self {
            classifier: ContentClassifier::new(),
            max_percent_diff,
            max_diff_chars: DEFAULT_MAX_DIFF_CHARS,
        }
    }

    /// 限制与基线比较时使用的字符数
    pub fn with_max_diff_chars(mut self, max_diff_chars: usize) -> Self {
        self.max_diff_chars = max_diff_chars;
        self
    }

    /// 判断响应内容是否可能是真实命中
    pub fn is_relevant(&self, url: &str, content: &str, pattern: &Pattern) -> bool {
        let content = content.trim().to_lowercase();

        if let Some(body) = DENIED_BODIES.iter().find(|body| **body == content) {
            info!("Found denied body {:?} in {}, skipping", body, url);
            return false;
        }
        if let Some(phrase) = DENIED_PHRASES.iter().find(|phrase| content.contains(**phrase)) {
            debug!("Found denied phrase {:?} in {}, skipping", phrase, url);
            return false;
        }

        match pattern {
            Pattern::Type(expected) => {
                let actual = self.classifier.classify(&content);
                let matched = actual == Some(*expected);
                info!(
                    "Tested if url {} is {} - evaluated to {}",
                    url, expected, matched
                );
                matched
            }
            Pattern::Literal(literal) => content.contains(&literal.to_lowercase()),
        }
    }

    /// 与同源的404基线比较
    pub fn compare_with_baseline(
        &self,
        url: &str,
        content: &str,
        baseline: &str,
        pattern: &Pattern,
    ) -> BaselineVerdict {
        match pattern {
            Pattern::Literal(literal) => {
                let baseline_type = self.classifier.classify(baseline);
                if baseline_type.is_some_and(|t| literal.eq_ignore_ascii_case(t.as_str())) {
                    debug!(
                        "Literal pattern {:?} for {} coincides with the not-found page type",
                        literal, url
                    );
                    return BaselineVerdict::CoincidentalType;
                }
                BaselineVerdict::Accept
            }
            Pattern::Type(_) => {
                let percent = bounded_diff_percent(content, baseline, self.max_diff_chars);
                debug!(
                    "Text difference between {} and its not-found page: {}%",
                    url, percent
                );
                if percent <= self.max_percent_diff {
                    BaselineVerdict::TooSimilar { percent }
                } else {
                    BaselineVerdict::Accept
                }
            }
        }
    }
}
