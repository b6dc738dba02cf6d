// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use thiserror::Error;

/// 仓库层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("存储错误: {0}")]
    Storage(String),

    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("无效数据: {0}")]
    InvalidData(String),
}

impl From<anyhow::Error> for RepositoryError {
    fn from(err: anyhow::Error) -> Self {
        RepositoryError::Storage(err.to_string())
    }
}

/// 集群通信错误类型
#[derive(Error, Debug)]
pub enum ClusterError {
    #[error("网络错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("消息编解码失败: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("无效消息: {0}")]
    InvalidMessage(String),

    #[error("没有可用的副本节点")]
    NoReplicas,

    #[error("仓库错误: {0}")]
    Repository(#[from] RepositoryError),
}

/// 扫描调用错误类型
///
/// 只会中止当前这一次扫描，不影响进程内的其他工作负载
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("没有可扫描的端点规则")]
    NoEndpoints,

    #[error("没有可用的DNS服务器")]
    NoNameservers,

    #[error("仓库错误: {0}")]
    Repository(#[from] RepositoryError),

    #[error("集群错误: {0}")]
    Cluster(#[from] ClusterError),

    #[error("抓取引擎初始化失败: {0}")]
    Engine(#[from] crate::engines::traits::EngineError),

    #[error("内部错误: {0}")]
    InternalError(String),
}
