//! Closed set of legal issue categories

use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

/// Legal issue category
///
/// Anything a model reports outside the closed set maps to `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    LandlordTenant,
    Employment,
    Consumer,
    Contract,
    Family,
    #[default]
    Other,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::LandlordTenant,
        Category::Employment,
        Category::Consumer,
        Category::Contract,
        Category::Family,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::LandlordTenant => "landlord_tenant",
            Category::Employment => "employment",
            Category::Consumer => "consumer",
            Category::Contract => "contract",
            Category::Family => "family",
            Category::Other => "other",
        }
    }

    /// Lenient parse: case, surrounding whitespace, hyphens and spaces are
    /// tolerated; unknown values become `Other`
    pub fn parse(s: &str) -> Self {
        debug!(%s, "Category::parse: called");
        let normalized = s.trim().to_lowercase().replace(['-', ' ', '/'], "_");
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .unwrap_or_else(|| {
                debug!(%s, "Category::parse: unrecognized, mapping to other");
                Category::Other
            })
    }

    /// Human label for display
    pub fn label(&self) -> &'static str {
        match self {
            Category::LandlordTenant => "Landlord / tenant",
            Category::Employment => "Employment",
            Category::Consumer => "Consumer",
            Category::Contract => "Contract",
            Category::Family => "Family",
            Category::Other => "Other",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}
