// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 内容分类、文本差异、相关性过滤，以及命中结果去向和通知的抽象
pub mod content_classifier;
pub mod diff;
pub mod notification_service;
pub mod relevance_filter;
pub mod result_sink;
