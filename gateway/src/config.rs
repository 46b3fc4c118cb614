//! Gateway configuration

use crate::acl::{AccessList, AclError};
use crate::hub::EventHub;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Listen address for gRPC server
    pub listen_addr: String,

    /// Admin HTTP listen address (health checks + metrics)
    pub admin_addr: String,

    /// Where the consumer allow-list comes from
    pub acl: AclSource,

    /// Capacity of each log subscriber's event channel
    pub event_buffer: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AclSource {
    /// JSON document given directly
    Inline { json: String },
    /// Path to a JSON document
    File { path: String },
    /// No rules: every call is denied
    Empty,
}

impl AclSource {
    pub fn load(&self) -> Result<AccessList, AclError> {
        match self {
            Self::Inline { json } => AccessList::from_json(json),
            Self::File { path } => AccessList::from_file(path),
            Self::Empty => Ok(AccessList::default()),
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        let acl = if let Ok(json) = std::env::var("WARDEN_ACL") {
            AclSource::Inline { json }
        } else if let Ok(path) = std::env::var("WARDEN_ACL_FILE") {
            AclSource::File { path }
        } else {
            AclSource::Empty
        };

        Self {
            listen_addr: std::env::var("WARDEN_LISTEN")
                .unwrap_or_else(|_| "0.0.0.0:50051".to_string()),
            admin_addr: std::env::var("WARDEN_ADMIN_LISTEN")
                .unwrap_or_else(|_| "0.0.0.0:9090".to_string()),
            acl,
            event_buffer: std::env::var("WARDEN_EVENT_BUFFER")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(EventHub::DEFAULT_CAPACITY),
        }
    }
}
