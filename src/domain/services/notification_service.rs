// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use anyhow::Result;
use async_trait::async_trait;

/// 结果通知服务特质
///
/// 每条新保存的命中结果调用一次
#[async_trait]
pub trait NotificationService: Send + Sync {
    /// 发送命中通知
    ///
    /// # 参数
    ///
    /// * `url` - 命中的URL
    ///
    /// # 返回值
    ///
    /// * `Ok(())` - 所有目标都发送成功
    /// * `Err(anyhow::Error)` - 至少一个目标发送失败
    async fn send(&self, url: &str) -> Result<()>;
}
