// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 包含核心实体、相关性判定服务和仓库接口
pub mod domain;

/// 引擎模块
///
/// DNS解析、并发抓取和扫描统计
pub mod engines;

/// 基础设施模块
///
/// 提供外部服务集成，如Redis、DNS服务器、集群通信和Webhook
pub mod infrastructure;

/// 队列模块
///
/// 生成扫描任务并切分分片
pub mod queue;

/// 工具模块
///
/// 提供通用的工具函数和辅助功能
pub mod utils;

/// 工作器模块
///
/// 编排单次扫描以及副本节点的命令处理
pub mod workers;
