use std::time::Duration;

use athwmi_proto::cmd::ResourceConfig;
use athwmi_proto::event::ready::MAX_MEM_REQS;
use athwmi_proto::ProtocolGeneration;
use serde::{Deserialize, Serialize};

use crate::dispatch::DispatchConfig;
use crate::error::{Result, SessionError};

/// Configuration for attaching to firmware.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttachConfig {
    /// Bound on the wait for SERVICE_READY.
    #[serde(with = "duration_ms")]
    pub service_ready_timeout: Duration,
    /// Bound on the wait for READY after INIT.
    #[serde(with = "duration_ms")]
    pub ready_timeout: Duration,
    /// Resource limits to negotiate; stock limits for the generation if unset.
    pub resource: Option<ResourceConfig>,
    /// Most memory requests accepted from SERVICE_READY.
    pub max_mem_reqs: usize,
    pub dispatch: DispatchConfig,
}

impl Default for AttachConfig {
    fn default() -> Self {
        Self {
            service_ready_timeout: Duration::from_secs(5),
            ready_timeout: Duration::from_secs(5),
            resource: None,
            max_mem_reqs: MAX_MEM_REQS,
            dispatch: DispatchConfig::default(),
        }
    }
}

impl AttachConfig {
    /// Parse a JSON configuration; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Resource limits for `generation`, checked for negotiability.
    pub fn resource_for(&self, generation: ProtocolGeneration) -> Result<ResourceConfig> {
        let resource = self
            .resource
            .clone()
            .unwrap_or_else(|| ResourceConfig::defaults_for(generation));
        validate_resource(&resource)?;
        Ok(resource)
    }
}

fn validate_resource(resource: &ResourceConfig) -> Result<()> {
    if resource.num_vdevs == 0 {
        return Err(SessionError::AttachFailed(
            "resource config needs at least one vdev".to_string(),
        ));
    }
    if resource.num_peers < resource.num_vdevs {
        return Err(SessionError::AttachFailed(format!(
            "resource config has {} peers for {} vdevs",
            resource.num_peers, resource.num_vdevs
        )));
    }
    if resource.num_tids == 0 || resource.tx_chain_mask == 0 || resource.rx_chain_mask == 0 {
        return Err(SessionError::AttachFailed(
            "resource config has no tids or an empty chain mask".to_string(),
        ));
    }
    Ok(())
}

/// Serialize a `Duration` as whole milliseconds.
pub(crate) mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}
