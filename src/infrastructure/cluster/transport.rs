// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::cluster_message::ClusterMessage;
use crate::utils::errors::ClusterError;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// 广播通道容量
const PUBLISH_BUFFER: usize = 4096;

/// 单条命令的读取超时
const COMMAND_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// 订阅连接断开后的重连间隔
const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// 副本节点的两个监听地址
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicaAddress {
    /// 结果广播地址
    pub publish: String,
    /// 任务接收地址
    pub job: String,
}

impl ReplicaAddress {
    pub fn new(host: &str, publish_port: u16, job_port: u16) -> Self {
        Self {
            publish: format!("{}:{}", host, publish_port),
            job: format!("{}:{}", host, job_port),
        }
    }
}

/// 副本节点的结果广播端
///
/// 每个连入的订阅者都会收到之后发布的所有消息；
/// 连接建立后先写一个空行，表示订阅已生效
pub struct ResultPublisher {
    topic: String,
    sender: broadcast::Sender<String>,
    local_addr: SocketAddr,
    accept_task: JoinHandle<()>,
}

impl ResultPublisher {
    /// 绑定监听地址并开始接受订阅
    pub async fn bind(addr: &str, topic: &str) -> Result<Self, ClusterError> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        let (sender, _) = broadcast::channel(PUBLISH_BUFFER);

        let fan_out = sender.clone();
        let accept_task = tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((stream, peer)) => {
                        info!("Subscriber {} connected", peer);
                        let receiver = fan_out.subscribe();
                        tokio::spawn(serve_subscriber(stream, peer, receiver));
                    }
                    Err(e) => {
                        warn!("Failed to accept subscriber: {}", e);
                        tokio::time::sleep(RECONNECT_DELAY).await;
                    }
                }
            }
        });

        info!("Publishing results on {}", local_addr);
        Ok(Self {
            topic: topic.to_string(),
            sender,
            local_addr,
            accept_task,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// 当前订阅者数量
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// 发布一条消息
    ///
    /// 没有订阅者时消息被丢弃
    pub fn publish(&self, message: &ClusterMessage) -> Result<(), ClusterError> {
        let line = message.encode(&self.topic)?;
        if self.sender.send(line).is_err() {
            debug!("No subscribers, dropping {} message", message.kind());
        }
        Ok(())
    }
}

impl Drop for ResultPublisher {
    fn drop(&mut self) {
        self.accept_task.abort();
    }
}

async fn serve_subscriber(
    mut stream: TcpStream,
    peer: SocketAddr,
    mut receiver: broadcast::Receiver<String>,
) {
    if stream.write_all(b"\n").await.is_err() {
        return;
    }

    loop {
        match receiver.recv().await {
            Ok(mut line) => {
                line.push('\n');
                if let Err(e) = stream.write_all(line.as_bytes()).await {
                    info!("Subscriber {} disconnected: {}", peer, e);
                    return;
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!("Subscriber {} lagged, {} messages dropped", peer, skipped);
            }
            Err(broadcast::error::RecvError::Closed) => return,
        }
    }
}

/// 副本节点的任务接收端
///
/// 连接按顺序逐个处理，同一连接内的多条命令保持发送顺序
pub struct JobListener {
    local_addr: SocketAddr,
    commands: mpsc::Receiver<ClusterMessage>,
    accept_task: JoinHandle<()>,
}

impl JobListener {
    pub async fn bind(addr: &str, topic: &str) -> Result<Self, ClusterError> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        let (tx, commands) = mpsc::channel(64);
        let topic = topic.to_string();

        let accept_task = tokio::spawn(async move {
            loop {
                let (stream, peer) = match listener.accept().await {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        warn!("Failed to accept command connection: {}", e);
                        tokio::time::sleep(RECONNECT_DELAY).await;
                        continue;
                    }
                };

                let mut lines = BufReader::new(stream).lines();
                loop {
                    match tokio::time::timeout(COMMAND_READ_TIMEOUT, lines.next_line()).await {
                        Ok(Ok(Some(line))) if line.trim().is_empty() => continue,
                        Ok(Ok(Some(line))) => match ClusterMessage::decode(&topic, &line) {
                            Ok(Some(message)) => {
                                debug!("Received {} from {}", message.kind(), peer);
                                if tx.send(message).await.is_err() {
                                    return;
                                }
                            }
                            Ok(None) => debug!("Ignoring command for another topic from {}", peer),
                            Err(e) => warn!("Dropping undecodable command from {}: {}", peer, e),
                        },
                        Ok(Ok(None)) => break,
                        Ok(Err(e)) => {
                            warn!("Command connection from {} failed: {}", peer, e);
                            break;
                        }
                        Err(_) => {
                            warn!("Command connection from {} timed out", peer);
                            break;
                        }
                    }
                }
            }
        });

        info!("Listening for jobs on {}", local_addr);
        Ok(Self {
            local_addr,
            commands,
            accept_task,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// 等待下一条命令
    pub async fn recv(&mut self) -> Option<ClusterMessage> {
        self.commands.recv().await
    }
}

impl Drop for JobListener {
    fn drop(&mut self) {
        self.accept_task.abort();
    }
}

/// 向副本推送命令
///
/// 建立连接，逐行写入后关闭
pub async fn push(addr: &str, topic: &str, messages: &[ClusterMessage]) -> Result<(), ClusterError> {
    let mut stream = TcpStream::connect(addr).await?;
    for message in messages {
        let mut line = message.encode(topic)?;
        line.push('\n');
        stream.write_all(line.as_bytes()).await?;
    }
    stream.shutdown().await?;
    Ok(())
}

type SubscriberLines = Lines<BufReader<TcpStream>>;

/// 连接广播端并等待就绪标记
async fn connect_subscriber(addr: &str, wait: Duration) -> Result<SubscriberLines, ClusterError> {
    let stream = tokio::time::timeout(wait, TcpStream::connect(addr))
        .await
        .map_err(|_| ClusterError::InvalidMessage(format!("connecting to {} timed out", addr)))??;
    let mut lines = BufReader::new(stream).lines();

    match tokio::time::timeout(wait, lines.next_line()).await {
        Ok(Ok(Some(marker))) if marker.trim().is_empty() => Ok(lines),
        Ok(Ok(Some(other))) => Err(ClusterError::InvalidMessage(format!(
            "unexpected greeting from {}: {:.64}",
            addr, other
        ))),
        Ok(Ok(None)) => Err(ClusterError::InvalidMessage(format!("{} closed the subscription", addr))),
        Ok(Err(e)) => Err(e.into()),
        Err(_) => Err(ClusterError::InvalidMessage(format!("no greeting from {}", addr))),
    }
}

/// 订阅一个副本的广播
///
/// 首次连接在返回前完成；此后在后台读取消息，超过 `receive_timeout`
/// 没有消息或连接断开时重新订阅。接收端关闭后任务结束
pub async fn subscribe(
    addr: String,
    topic: String,
    receive_timeout: Duration,
    tx: mpsc::Sender<(String, ClusterMessage)>,
) -> JoinHandle<()> {
    let mut pending = match connect_subscriber(&addr, receive_timeout).await {
        Ok(lines) => {
            info!("Subscribed to {}", addr);
            Some(lines)
        }
        Err(e) => {
            warn!("Could not subscribe to {}: {}, retrying in background", addr, e);
            None
        }
    };

    tokio::spawn(async move {
        loop {
            let mut lines = match pending.take() {
                Some(lines) => lines,
                None => match connect_subscriber(&addr, receive_timeout).await {
                    Ok(lines) => {
                        info!("Resubscribed to {}", addr);
                        lines
                    }
                    Err(e) => {
                        debug!("Resubscribing to {} failed: {}", addr, e);
                        if tx.is_closed() {
                            return;
                        }
                        tokio::time::sleep(RECONNECT_DELAY).await;
                        continue;
                    }
                },
            };

            loop {
                match tokio::time::timeout(receive_timeout, lines.next_line()).await {
                    Ok(Ok(Some(line))) if line.trim().is_empty() => continue,
                    Ok(Ok(Some(line))) => match ClusterMessage::decode(&topic, &line) {
                        Ok(Some(message)) => {
                            if tx.send((addr.clone(), message)).await.is_err() {
                                return;
                            }
                        }
                        Ok(None) => {}
                        Err(e) => warn!("Dropping undecodable message from {}: {}", addr, e),
                    },
                    Ok(Ok(None)) => {
                        warn!("{} closed the subscription, resubscribing", addr);
                        break;
                    }
                    Ok(Err(e)) => {
                        warn!("Reading from {} failed: {}, resubscribing", addr, e);
                        break;
                    }
                    Err(_) => {
                        warn!(
                            "No message from {} within {:?}, resubscribing",
                            addr, receive_timeout
                        );
                        break;
                    }
                }
            }

            if tx.is_closed() {
                return;
            }
        }
    })
}
