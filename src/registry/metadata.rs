use crate::approach::Approach;
use serde::{Deserialize, Serialize};

/// Schema for a configurable parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: String,
    pub default: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

/// Factory function type for creating approach instances
pub type ApproachFactory = fn() -> Box<dyn Approach>;

/// Complete metadata for an approach type
#[derive(Clone)]
pub struct ApproachMetadata {
    pub id: String,
    pub name: String,
    pub description: String,
    pub parameters: Vec<ParameterSchema>,
    pub factory: ApproachFactory,
}

impl ApproachMetadata {
    /// Create a fresh, unconfigured instance
    pub fn create_instance(&self) -> Box<dyn Approach> {
        (self.factory)()
    }
}

impl std::fmt::Debug for ApproachMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApproachMetadata")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .finish()
    }
}

// Factory type for creating approach metadata at runtime
pub type ApproachMetadataFactory = fn() -> ApproachMetadata;

// Wrapper for inventory collection
pub struct ApproachMetadataFactoryWrapper(pub ApproachMetadataFactory);

inventory::collect!(ApproachMetadataFactoryWrapper);
