use std::sync::Arc;

use log::debug;

use super::client::ApiClient;
use super::error::Result;
use super::gateway::HttpGateway;
use crate::batch::Batch;
use crate::config::Config;
use crate::resource::{PropertyCache, Record, ResourceRepository, ResourceType};

/// Entry point: owns the transport and the property schema cache, and hands
/// out repositories per resource type
#[derive(Clone)]
pub struct Crm {
    gateway: Arc<dyn HttpGateway>,
    properties: PropertyCache,
}

impl std::fmt::Debug for Crm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Crm").finish_non_exhaustive()
    }
}

impl Crm {
    pub fn new(gateway: Arc<dyn HttpGateway>) -> Self {
        Self {
            gateway,
            properties: PropertyCache::new(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let client = ApiClient::from_config(config)?;
        debug!("Using {:?}", client);
        Ok(Self::new(Arc::new(client)))
    }

    /// Build from `.env` and `HUBSPOT_*` environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        let config = Config::from_env()?;
        Ok(Self::from_config(&config)?)
    }

    pub fn gateway(&self) -> &Arc<dyn HttpGateway> {
        &self.gateway
    }

    pub fn property_cache(&self) -> &PropertyCache {
        &self.properties
    }

    pub fn resource(&self, resource: ResourceType) -> ResourceRepository {
        ResourceRepository::new(resource, Arc::clone(&self.gateway), self.properties.clone())
    }

    pub fn contacts(&self) -> ResourceRepository {
        self.resource(ResourceType::Contact)
    }

    pub fn companies(&self) -> ResourceRepository {
        self.resource(ResourceType::Company)
    }

    pub fn forms(&self) -> ResourceRepository {
        self.resource(ResourceType::Form)
    }

    pub fn users(&self) -> ResourceRepository {
        self.resource(ResourceType::User)
    }

    pub fn batch(&self, records: Vec<Record>) -> Result<Batch> {
        Batch::new(records)
    }
}
