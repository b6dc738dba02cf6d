// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::pattern::ContentType;
use scraper::{ElementRef, Html};

/// 标准 HTML5 标签集合
const STANDARD_HTML_TAGS: &[&str] = &[
    "a", "abbr", "address", "area", "article", "aside", "audio", "b", "base", "bdi", "bdo",
    "blockquote", "body", "br", "button", "canvas", "caption", "cite", "code", "col",
    "colgroup", "data", "datalist", "dd", "del", "details", "dfn", "dialog", "div", "dl", "dt",
    "em", "embed", "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4",
    "h5", "h6", "head", "header", "hgroup", "hr", "html", "i", "iframe", "img", "input", "ins",
    "kbd", "label", "legend", "li", "link", "main", "map", "mark", "math", "menu", "menuitem",
    "meta", "meter", "nav", "noscript", "object", "ol", "optgroup", "option", "output", "p",
    "param", "picture", "pre", "progress", "q", "rb", "rp", "rt", "rtc", "ruby", "samp",
    "script", "section", "select", "slot", "small", "source", "span", "strong", "style", "sub",
    "summary", "sup", "svg", "table", "tbody", "td", "template", "textarea", "tfoot", "th",
    "thead", "time", "title", "tr", "track", "u", "ul", "var", "video", "wbr",
];

/// 内容分类器
///
/// 按固定顺序判断文本的类型，第一个命中的类型生效：
/// JSON → YML → XML → HTML → NO_SPACES → TEXT
#[derive(Debug, Default, Clone, Copy)]
pub struct ContentClassifier;

impl ContentClassifier {
    pub fn new() -> Self {
        Self
    }

    /// 判断内容类型
    ///
    /// 空白内容返回 `None`，调用方应将其视为"不匹配"
    pub fn classify(&self, content: &str) -> Option<ContentType> {
        if content.trim().is_empty() {
            return None;
        }
        if self.is_json(content) {
            return Some(ContentType::Json);
        }
        if self.is_yaml(content) {
            return Some(ContentType::Yml);
        }
        if self.is_xml(content) {
            return Some(ContentType::Xml);
        }
        if self.is_html(content) {
            return Some(ContentType::Html);
        }
        if self.is_no_spaces(content) {
            return Some(ContentType::NoSpaces);
        }
        Some(ContentType::Text)
    }

    pub fn is_json(&self, content: &str) -> bool {
        content.trim_start().starts_with('{')
    }

    pub fn is_yaml(&self, content: &str) -> bool {
        if self.is_html(content) || self.is_xml(content) || self.is_json(content) {
            return false;
        }
        if !content.contains(':') {
            return false;
        }
        matches!(
            serde_yaml::from_str::<serde_yaml::Value>(content),
            Ok(serde_yaml::Value::Mapping(_))
        )
    }

    pub fn is_xml(&self, content: &str) -> bool {
        let lowered = content.to_lowercase();
        !has_html_marker(&lowered) && lowered.contains("<?xml")
    }

    pub fn is_html(&self, content: &str) -> bool {
        let lowered = content.to_lowercase();
        if has_html_marker(&lowered) {
            return true;
        }
        if lowered.contains("<?xml") || !lowered.contains('<') {
            return false;
        }

        let fragment = Html::parse_fragment(&lowered);
        // The first descendant is the synthetic <html> root of the fragment
        fragment
            .root_element()
            .descendants()
            .skip(1)
            .filter_map(ElementRef::wrap)
            .any(|element| STANDARD_HTML_TAGS.contains(&element.value().name()))
    }

    pub fn is_no_spaces(&self, content: &str) -> bool {
        content
            .lines()
            .filter(|line| !line.trim_start().starts_with('#'))
            .all(|line| !line.trim().contains(' '))
    }
}

fn has_html_marker(lowered: &str) -> bool {
    lowered.contains("<html") || lowered.contains("<!doctype html")
}

#[cfg(test)]
#[path = "content_classifier_test.rs"]
mod tests;
