// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施层模块
///
/// 该模块包含系统的技术实现细节，为领域层的抽象接口提供具体实现。
///
/// 包含的子模块：
/// - 缓存（cache）：Redis客户端
/// - 集群（cluster）：源节点与副本节点之间的消息传输和任务分发
/// - DNS（dns）：直接向指定名称服务器发起查询的客户端
/// - 指标（metrics）：Prometheus 指标导出
/// - 仓库实现（repositories）：内存与Redis两种存储后端
/// - 服务（services）：Webhook 通知
pub mod cache;
pub mod cluster;
pub mod dns;
pub mod metrics;
pub mod repositories;
pub mod services;
