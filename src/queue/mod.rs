// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 队列模块
///
/// 负责生成扫描任务以及在集群节点间切分域名列表
pub mod task_queue;
