//! Compile-time registry of streaming approaches.

mod metadata;

pub use metadata::{
    ApproachFactory, ApproachMetadata, ApproachMetadataFactory, ApproachMetadataFactoryWrapper,
    ParameterSchema,
};

use serde_json::Value;
use std::collections::BTreeMap;

use crate::approach::Approach;
use crate::{Result, SimError};

/// Approaches resolved once at startup, keyed by id
#[derive(Debug, Clone, Default)]
pub struct ApproachRegistry {
    approaches: BTreeMap<String, ApproachMetadata>,
}

impl ApproachRegistry {
    /// Collect every approach registered with `#[derive(Approach)]`
    pub fn discover() -> Self {
        let mut registry = Self::default();
        for wrapper in inventory::iter::<ApproachMetadataFactoryWrapper> {
            registry.register((wrapper.0)());
        }
        tracing::debug!(count = registry.approaches.len(), "approach registry loaded");
        registry
    }

    pub fn register(&mut self, meta: ApproachMetadata) {
        self.approaches.insert(meta.id.clone(), meta);
    }

    pub fn get(&self, id: &str) -> Option<&ApproachMetadata> {
        self.approaches.get(&id.to_lowercase())
    }

    /// Instantiate `id` and hand it its configuration
    pub fn create(&self, id: &str, config: &Value) -> Result<Box<dyn Approach>> {
        let meta = self
            .get(id)
            .ok_or_else(|| SimError::UnknownApproach(id.to_string()))?;
        let mut approach = meta.create_instance();
        approach.on_create(config)?;
        Ok(approach)
    }

    pub fn list(&self) -> impl Iterator<Item = &ApproachMetadata> {
        self.approaches.values()
    }
}
