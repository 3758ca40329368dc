//! Monitored service endpoints

use crate::health::ServiceId;
use serde::{Deserialize, Serialize};

/// Root URL of one monitored service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEndpoint {
    pub url: String,
}

impl ServiceEndpoint {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// Endpoints of the master and tenant services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServicesConfig {
    pub master: ServiceEndpoint,
    pub tenant: ServiceEndpoint,
}

impl ServicesConfig {
    /// Root URL configured for `service`.
    pub fn root(&self, service: ServiceId) -> &str {
        match service {
            ServiceId::Master => &self.master.url,
            ServiceId::Tenant => &self.tenant.url,
        }
    }

    pub fn endpoint_mut(&mut self, service: ServiceId) -> &mut ServiceEndpoint {
        match service {
            ServiceId::Master => &mut self.master,
            ServiceId::Tenant => &mut self.tenant,
        }
    }
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            master: ServiceEndpoint::new("http://localhost:3000/master-ser"),
            tenant: ServiceEndpoint::new("http://localhost:3000/tenant-ser"),
        }
    }
}
