// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了系统的核心业务实体，包括：
/// - 端点规则与扫描任务（task）
/// - 匹配模式与内容类型（pattern）
/// - 抓取结果、DNS缓存条目和已保存结果（fetch_result）
/// - 工作负载与统计快照（workload）
/// - 集群消息（cluster_message）
pub mod cluster_message;
pub mod fetch_result;
pub mod pattern;
pub mod task;
pub mod workload;
