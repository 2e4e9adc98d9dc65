//! DeviceDirectory - device metadata lookup
//!
//! Read-only name resolution against the CityOS device API, used to label
//! grid slots. Results are cached in memory; a lookup failure degrades to
//! unlabeled slots and never reaches the allocation logic.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;

/// Display metadata for one device
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceMetadata {
    pub device_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MetadataRequest<'a> {
    device_ids: &'a [String],
}

/// DeviceDirectory instance
pub struct DeviceDirectory {
    http: reqwest::Client,
    base_url: String,
    cache: RwLock<HashMap<String, DeviceMetadata>>,
}

impl DeviceDirectory {
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            http,
            base_url: base_url.into(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Resolve metadata for `device_ids`, serving cached entries and
    /// fetching the rest in one call. Ids unknown to the platform are
    /// simply absent from the result.
    pub async fn get_devices_metadata(&self, device_ids: &[String]) -> Result<Vec<DeviceMetadata>> {
        let mut resolved: HashMap<String, DeviceMetadata> = HashMap::new();
        let mut missing = Vec::new();

        {
            let cache = self.cache.read().await;
            for id in device_ids {
                match cache.get(id) {
                    Some(meta) => {
                        resolved.insert(id.clone(), meta.clone());
                    }
                    None => {
                        if !missing.contains(id) {
                            missing.push(id.clone());
                        }
                    }
                }
            }
        }

        if !missing.is_empty() {
            let fetched = self.fetch(&missing).await?;
            let mut cache = self.cache.write().await;
            for meta in fetched {
                cache.insert(meta.device_id.clone(), meta.clone());
                resolved.insert(meta.device_id.clone(), meta);
            }
        }

        Ok(device_ids
            .iter()
            .filter_map(|id| resolved.get(id).cloned())
            .collect())
    }

    async fn fetch(&self, device_ids: &[String]) -> Result<Vec<DeviceMetadata>> {
        let url = format!("{}/api/devices/metadata", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&MetadataRequest { device_ids })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Api(format!(
                "device metadata lookup failed: HTTP {}",
                response.status().as_u16()
            )));
        }

        Ok(response.json().await?)
    }
}
