// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工作器模块
///
/// 扫描流程的编排、命中结果的去向，以及副本节点的命令处理
pub mod replica_worker;
pub mod result_sink;
pub mod scan_worker;
pub mod worker;

pub use worker::Worker;
