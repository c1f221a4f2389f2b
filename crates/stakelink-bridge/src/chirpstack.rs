//! ChirpStack device queue client
//!
//! Talks to the network server's REST gateway. Queue items use the gRPC-gateway
//! JSON mapping, so binary payloads travel as base64 strings. Device and group
//! ids are pushed as escaped path segments, never spliced into the URL text.

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use bytes::Bytes;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ChirpStackConfig;
use crate::traits::DeviceQueue;
use crate::{BridgeError, Result};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DeviceQueueItem<'a> {
    dev_eui: &'a str,
    confirmed: bool,
    f_port: u32,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MulticastGroupQueueItem<'a> {
    multicast_group_id: &'a str,
    f_port: u32,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EnqueueRequest<T> {
    queue_item: T,
}

#[derive(Debug, Deserialize)]
struct EnqueueDeviceQueueItemResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnqueueMulticastGroupQueueItemResponse {
    #[serde(default)]
    f_cnt: u32,
}

/// Device and multicast queue backed by the ChirpStack REST API
pub struct ChirpStackQueue {
    client: reqwest::Client,
    base_url: Url,
    api_token: String,
}

impl ChirpStackQueue {
    pub fn new(config: &ChirpStackConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| BridgeError::Config(format!("HTTP client error: {}", e)))?;

        let base_url = Url::parse(&config.url)
            .map_err(|e| BridgeError::Config(format!("invalid chirpstack.url: {}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(BridgeError::Config(format!(
                "chirpstack.url cannot take a path: {}",
                config.url
            )));
        }

        Ok(Self {
            client,
            base_url,
            api_token: config.api_token.clone(),
        })
    }

    /// `{base}/api/{collection}/{id}/queue` with `id` escaped as one segment
    fn queue_url(&self, collection: &str, id: &str) -> Result<Url> {
        // dot segments are dropped by the path builder
        if matches!(id, "" | "." | "..") {
            return Err(BridgeError::MalformedInput(format!("invalid queue id '{}'", id)));
        }
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| BridgeError::Config("chirpstack.url cannot take a path".to_string()))?
            .pop_if_empty()
            .extend(["api", collection, id, "queue"]);
        Ok(url)
    }

    async fn post<B: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<R> {
        let response = self
            .client
            .post(url.clone())
            .bearer_auth(&self.api_token)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        debug!("POST {} -> {}", url, status);
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(BridgeError::Downstream(format!(
                "network server returned {}: {}",
                status, text
            )));
        }
        Ok(response.json::<R>().await?)
    }
}

#[async_trait]
impl DeviceQueue for ChirpStackQueue {
    async fn enqueue_unicast(
        &self,
        dev_eui: &str,
        port: u8,
        confirmed: bool,
        payload: Bytes,
    ) -> Result<String> {
        let request = EnqueueRequest {
            queue_item: DeviceQueueItem {
                dev_eui,
                confirmed,
                f_port: port as u32,
                data: general_purpose::STANDARD.encode(&payload),
            },
        };
        let url = self.queue_url("devices", dev_eui)?;
        let response: EnqueueDeviceQueueItemResponse = self.post(url, &request).await?;
        Ok(response.id)
    }

    async fn enqueue_multicast(&self, group_id: &str, port: u8, payload: Bytes) -> Result<String> {
        let request = EnqueueRequest {
            queue_item: MulticastGroupQueueItem {
                multicast_group_id: group_id,
                f_port: port as u32,
                data: general_purpose::STANDARD.encode(&payload),
            },
        };
        let url = self.queue_url("multicast-groups", group_id)?;
        let response: EnqueueMulticastGroupQueueItemResponse = self.post(url, &request).await?;
        Ok(format!("multicast enqueued (fCnt {})", response.f_cnt))
    }
}
