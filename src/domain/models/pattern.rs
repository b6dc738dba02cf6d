// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 内容类型标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentType {
    Xml,
    Yml,
    Json,
    Text,
    NoSpaces,
    Html,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Xml => "XML",
            ContentType::Yml => "YML",
            ContentType::Json => "JSON",
            ContentType::Text => "TEXT",
            ContentType::NoSpaces => "NO_SPACES",
            ContentType::Html => "HTML",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "XML" => Ok(ContentType::Xml),
            "YML" => Ok(ContentType::Yml),
            "JSON" => Ok(ContentType::Json),
            "TEXT" => Ok(ContentType::Text),
            "NO_SPACES" => Ok(ContentType::NoSpaces),
            "HTML" => Ok(ContentType::Html),
            _ => Err(()),
        }
    }
}

/// 端点匹配模式
///
/// 模式字符串恰好是内容类型标签时按类型匹配，否则按子串匹配
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    /// 响应内容必须被分类为该类型
    Type(ContentType),
    /// 响应内容必须包含该字符串（不区分大小写）
    Literal(String),
}

impl Pattern {
    pub fn parse(raw: &str) -> Self {
        match raw.parse::<ContentType>() {
            Ok(content_type) => Pattern::Type(content_type),
            Err(()) => Pattern::Literal(raw.to_string()),
        }
    }

    pub fn is_content_type(&self) -> bool {
        matches!(self, Pattern::Type(_))
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Type(content_type) => write!(f, "{}", content_type),
            Pattern::Literal(literal) => f.write_str(literal),
        }
    }
}
