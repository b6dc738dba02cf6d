// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// 该模块包含系统的核心业务逻辑，包括：
/// - 领域模型（models）：任务、抓取结果、工作负载和集群消息
/// - 仓库接口（repositories）：端点、结果、404基线和DNS缓存的持久化抽象
/// - 服务（services）：内容分类、差异计算、相关性过滤和结果通知
///
/// 领域层不依赖于任何外部实现
pub mod models;
pub mod repositories;
pub mod services;
