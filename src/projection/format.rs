use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::SimError;

/// Spherical-to-planar frame layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ProjectionFormat {
    /// Equirectangular
    Erp,
    /// Cubemap, 3x2 face atlas
    Cmp,
    /// Equi-angular cubemap, 3x2 face atlas
    Eac,
}

impl ProjectionFormat {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Erp => "erp",
            Self::Cmp => "cmp",
            Self::Eac => "eac",
        }
    }

    /// Cube layouts need a 3:2 frame with square faces
    pub fn is_cube(&self) -> bool {
        matches!(self, Self::Cmp | Self::Eac)
    }
}

impl FromStr for ProjectionFormat {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "erp" => Ok(Self::Erp),
            "cmp" => Ok(Self::Cmp),
            "eac" => Ok(Self::Eac),
            other => Err(SimError::UnsupportedProjection(other.to_string())),
        }
    }
}

impl TryFrom<String> for ProjectionFormat {
    type Error = SimError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ProjectionFormat> for String {
    fn from(format: ProjectionFormat) -> String {
        format.name().to_string()
    }
}

impl fmt::Display for ProjectionFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Frame size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: usize,
    pub height: usize,
}

impl Resolution {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }
}
