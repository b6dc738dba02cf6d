// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::ScanSettings;
use crate::domain::models::fetch_result::DnsCacheEntry;
use crate::domain::models::task::EndpointRule;
use crate::domain::models::workload::ScanStatistics;
use crate::utils::errors::ClusterError;
use serde::{Deserialize, Serialize};

/// 集群消息
///
/// 线上格式为 `"{topic} {json}"`，JSON负载中的 `type` 字段区分变体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClusterMessage {
    /// 主节点下发的分片任务
    Job {
        workload_uuid: String,
        domains: Vec<String>,
        endpoints: Vec<EndpointRule>,
        configuration: ScanSettings,
        nameservers: Vec<String>,
        rank: usize,
        #[serde(default)]
        dns_cache: Vec<DnsCacheEntry>,
    },
    /// 副本节点上报的命中结果
    Result {
        workload_uuid: String,
        endpoint: String,
        content: String,
    },
    /// 副本节点的周期统计
    Statistics(ScanStatistics),
    /// 副本节点完成分片
    Finished {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rank: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        workload_uuid: Option<String>,
    },
    /// 网页内容归档
    WebpageContent { uuid: String, zip: String },
    /// 中止当前任务并重置工作状态
    Restart,
    /// 执行升级命令后退出
    Upgrade,
    /// 要求副本重新发布某个工作负载的已有结果
    SendFinishedJobs { workload_uuid: String },
}

impl ClusterMessage {
    /// 编码为一帧文本（不含换行符）
    pub fn encode(&self, topic: &str) -> Result<String, ClusterError> {
        Ok(format!("{} {}", topic, serde_json::to_string(self)?))
    }

    /// 解码一帧文本
    ///
    /// 主题不匹配时返回 `Ok(None)`
    pub fn decode(topic: &str, frame: &str) -> Result<Option<Self>, ClusterError> {
        let frame = frame.trim_end_matches(['\r', '\n']);
        let Some((frame_topic, payload)) = frame.split_once(' ') else {
            return Err(ClusterError::InvalidMessage(format!(
                "frame without payload: {:.64}",
                frame
            )));
        };
        if frame_topic != topic {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(payload)?))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ClusterMessage::Job { .. } => "JOB",
            ClusterMessage::Result { .. } => "RESULT",
            ClusterMessage::Statistics(_) => "STATISTICS",
            ClusterMessage::Finished { .. } => "FINISHED",
            ClusterMessage::WebpageContent { .. } => "WEBPAGE_CONTENT",
            ClusterMessage::Restart => "RESTART",
            ClusterMessage::Upgrade => "UPGRADE",
            ClusterMessage::SendFinishedJobs { .. } => "SEND_FINISHED_JOBS",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_wire_format() {
        let message = ClusterMessage::Result {
            workload_uuid: "w1".into(),
            endpoint: "https://a.com/.env".into(),
            content: "KEY=1".into(),
        };
        let frame = message.encode("leakrs_event").unwrap();
        assert!(frame.starts_with("leakrs_event {\"type\":\"RESULT\""));
        assert_eq!(
            ClusterMessage::decode("leakrs_event", &frame).unwrap(),
            Some(message)
        );
    }

    #[test]
    fn test_unit_variants_carry_type_only() {
        let frame = ClusterMessage::Restart.encode("t").unwrap();
        assert_eq!(frame, r#"t {"type":"RESTART"}"#);
        let frame = ClusterMessage::Finished { rank: None, workload_uuid: None }
            .encode("t")
            .unwrap();
        assert_eq!(frame, r#"t {"type":"FINISHED"}"#);
    }

    #[test]
    fn test_statistics_fields_are_inlined() {
        let decoded = ClusterMessage::decode(
            "t",
            r#"t {"type":"STATISTICS","rps":12.5,"finished_requests":40}"#,
        )
        .unwrap()
        .unwrap();
        match decoded {
            ClusterMessage::Statistics(stats) => {
                assert_eq!(stats.finished_requests, 40);
                assert_eq!(stats.timeouts, 0);
            }
            other => panic!("unexpected message {:?}", other),
        }
    }

    #[test]
    fn test_job_decodes_with_partial_configuration() {
        let frame = r#"t {"type":"JOB","workload_uuid":"w","domains":["https://a.com"],"endpoints":[{"endpoint":"/.env","pattern":"NO_SPACES"}],"configuration":{"status":200},"nameservers":["8.8.8.8"],"rank":1}"#;
        match ClusterMessage::decode("t", frame).unwrap().unwrap() {
            ClusterMessage::Job { configuration, dns_cache, rank, .. } => {
                assert_eq!(configuration.status, Some(200));
                assert_eq!(configuration.max_concurrency, 100);
                assert!(dns_cache.is_empty());
                assert_eq!(rank, 1);
            }
            other => panic!("unexpected message {:?}", other),
        }
    }

    #[test]
    fn test_other_topic_is_ignored() {
        let frame = ClusterMessage::Upgrade.encode("other").unwrap();
        assert_eq!(ClusterMessage::decode("leakrs_event", &frame).unwrap(), None);
    }

    #[test]
    fn test_garbage_is_an_error() {
        assert!(ClusterMessage::decode("t", "t not-json").is_err());
        assert!(ClusterMessage::decode("t", "no_space_at_all").is_err());
    }
}
