// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 计算两段文本的差异百分比
///
/// `100 * levenshtein(a, b) / max(len(a), len(b))`，按字符计算并向下取整；
/// 两段都为空时返回 0
pub fn diff_percent(a: &str, b: &str) -> u32 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 0;
    }
    let distance = strsim::levenshtein(a, b);
    ((distance * 100) / longest) as u32
}

/// 只比较两段文本的前 `max_chars` 个字符
///
/// 编辑距离的开销与两段长度之积成正比，截断后单次比较的耗时有上限
pub fn bounded_diff_percent(a: &str, b: &str, max_chars: usize) -> u32 {
    diff_percent(truncate_chars(a, max_chars), truncate_chars(b, max_chars))
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}
