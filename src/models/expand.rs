use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Related entities the API can embed in an object response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Expand {
    Properties,
    SuggestedProperties,
    Parents,
    Children,
    CountChildren,
}

impl Expand {
    /// What searches expand when the caller does not say otherwise.
    pub const DEFAULT_SEARCH: [Expand; 2] = [Expand::SuggestedProperties, Expand::Parents];

    pub fn as_str(&self) -> &'static str {
        match self {
            Expand::Properties => "properties",
            Expand::SuggestedProperties => "suggestedProperties",
            Expand::Parents => "parents",
            Expand::Children => "children",
            Expand::CountChildren => "countChildren",
        }
    }

    /// Comma-joined value for the `expand` query parameter.
    pub fn join(expand: &[Expand]) -> String {
        expand.iter().map(Expand::as_str).collect::<Vec<_>>().join(",")
    }
}

impl std::fmt::Display for Expand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Expand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "properties" => Ok(Expand::Properties),
            "suggestedProperties" => Ok(Expand::SuggestedProperties),
            "parents" => Ok(Expand::Parents),
            "children" => Ok(Expand::Children),
            "countChildren" => Ok(Expand::CountChildren),
            _ => Err(format!("Invalid expand value: {}", s)),
        }
    }
}
