// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库实现模块
///
/// 提供领域仓库接口的具体实现
/// 包括进程内存储和Redis存储
pub mod memory_repo_impl;
pub mod redis_repo_impl;
