// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use anyhow::Result;
use redis::AsyncCommands;
use std::collections::HashMap;

/// Redis客户端
///
/// 提供对Redis哈希和集合的异步操作接口
#[derive(Clone)]
pub struct RedisClient {
    /// Redis客户端
    client: redis::Client,
}

impl RedisClient {
    /// 创建新的Redis客户端实例
    ///
    /// # 参数
    ///
    /// * `redis_url` - Redis连接URL
    ///
    /// # 返回值
    ///
    /// * `Ok(RedisClient)` - Redis客户端实例
    /// * `Err(anyhow::Error)` - 创建过程中出现的错误
    pub async fn new(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self { client })
    }

    /// 仅在字段不存在时写入哈希
    ///
    /// # 返回值
    ///
    /// * `Ok(true)` - 写入成功
    /// * `Ok(false)` - 字段已存在，未修改
    /// * `Err(anyhow::Error)` - 写入过程中出现的错误
    pub async fn hset_nx(&self, key: &str, field: &str, value: &str) -> Result<bool> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        let created: bool = con.hset_nx(key, field, value).await?;
        Ok(created)
    }

    /// 获取哈希字段的值
    pub async fn hget(&self, key: &str, field: &str) -> Result<Option<String>> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        let value: Option<String> = con.hget(key, field).await?;
        Ok(value)
    }

    /// 判断哈希字段是否存在
    pub async fn hexists(&self, key: &str, field: &str) -> Result<bool> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        let exists: bool = con.hexists(key, field).await?;
        Ok(exists)
    }

    /// 获取整个哈希
    pub async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        let values: HashMap<String, String> = con.hgetall(key).await?;
        Ok(values)
    }

    /// 获取哈希字段数量
    pub async fn hlen(&self, key: &str) -> Result<usize> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        let len: usize = con.hlen(key).await?;
        Ok(len)
    }

    /// 删除键
    pub async fn del(&self, key: &str) -> Result<()> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        con.del::<_, ()>(key).await?;
        Ok(())
    }

    /// 向集合添加成员，返回成员是否为新增
    pub async fn sadd(&self, key: &str, member: &str) -> Result<bool> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        let added: i64 = con.sadd(key, member).await?;
        Ok(added > 0)
    }

    /// 从集合移除成员
    pub async fn srem(&self, key: &str, member: &str) -> Result<()> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        con.srem::<_, _, ()>(key, member).await?;
        Ok(())
    }

    /// 获取集合所有成员
    pub async fn smembers(&self, key: &str) -> Result<Vec<String>> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        let members: Vec<String> = con.smembers(key).await?;
        Ok(members)
    }
}
