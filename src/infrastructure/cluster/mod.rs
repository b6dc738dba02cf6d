// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 集群模块
///
/// 源节点与副本节点之间基于TCP的两条通道：
/// 副本广播结果和统计，源节点推送任务和维护命令
pub mod coordinator;
pub mod transport;
