// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库接口模块
///
/// 该模块定义了领域层的仓库接口，具体实现由基础设施层提供。
///
/// 包含的仓库接口：
/// - 端点仓库（endpoint_repository）：管理端点规则
/// - 结果仓库（result_repository）：按工作负载保存命中结果，保证幂等
/// - 404基线仓库（baseline_repository）：每个源只保存第一份样本
/// - DNS缓存仓库（dns_cache_repository）：持久化的域名解析结果
/// - 工作负载仓库（workload_repository）：记录已启动的工作负载
pub mod baseline_repository;
pub mod dns_cache_repository;
pub mod endpoint_repository;
pub mod result_repository;
pub mod workload_repository;

pub use crate::utils::errors::RepositoryError;
