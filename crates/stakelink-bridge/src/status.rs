//! Status server client
//!
//! Alarms go out as `GET /warn/warnInfo` with query parameters, heartbeats as a
//! JSON `POST /equipmentfailure/sendBeat`. Timestamps use the reference offset.

use async_trait::async_trait;
use chrono::{FixedOffset, Utc};
use serde::Serialize;
use tracing::debug;

use crate::config::StatusServerConfig;
use crate::traits::{StatusSink, WarnType};
use crate::{BridgeError, Result};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Heartbeat<'a> {
    stake_no: &'a str,
    update_date: String,
    lora_status: &'static str,
}

pub struct StatusServerClient {
    client: reqwest::Client,
    base_url: String,
    offset: FixedOffset,
}

impl StatusServerClient {
    pub fn new(config: &StatusServerConfig, offset: FixedOffset) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| BridgeError::Config(format!("HTTP client error: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            offset,
        })
    }

    fn timestamp(&self) -> String {
        Utc::now()
            .with_timezone(&self.offset)
            .format(TIMESTAMP_FORMAT)
            .to_string()
    }

    fn check(url: &str, status: reqwest::StatusCode) -> Result<()> {
        debug!("{} -> {}", url, status);
        if status != reqwest::StatusCode::OK {
            return Err(BridgeError::Downstream(format!(
                "status server returned {}",
                status
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl StatusSink for StatusServerClient {
    async fn send_warning(&self, device_id: &str, warn_type: WarnType) -> Result<()> {
        let url = format!("{}/warn/warnInfo", self.base_url);
        let warn_type = warn_type.code().to_string();
        let event_date = self.timestamp();
        let response = self
            .client
            .get(&url)
            .query(&[
                ("stakeNo", device_id),
                ("eventDate", event_date.as_str()),
                ("warnType", warn_type.as_str()),
            ])
            .send()
            .await?;
        Self::check(&url, response.status())
    }

    async fn send_heartbeat(&self, device_id: &str) -> Result<()> {
        let url = format!("{}/equipmentfailure/sendBeat", self.base_url);
        let body = Heartbeat {
            stake_no: device_id,
            update_date: self.timestamp(),
            lora_status: "Online",
        };
        let response = self.client.post(&url).json(&body).send().await?;
        Self::check(&url, response.status())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heartbeat_json_shape() {
        let body = Heartbeat {
            stake_no: "K12+300",
            update_date: "2024-03-01 08:00:00".to_string(),
            lora_status: "Online",
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({
                "stakeNo": "K12+300",
                "updateDate": "2024-03-01 08:00:00",
                "loraStatus": "Online"
            })
        );
    }

    #[test]
    fn test_timestamp_format() {
        let client = StatusServerClient::new(
            &StatusServerConfig::default(),
            FixedOffset::east_opt(8 * 3600).unwrap(),
        )
        .unwrap();
        let ts = client.timestamp();
        assert_eq!(ts.len(), 19);
        assert_eq!(&ts[4..5], "-");
        assert_eq!(&ts[10..11], " ");
    }
}
