//! Strategy variant domain model

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Execution strategy a job runs with
///
/// Each variant serializes its own jobs but runs independently of the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// One extraction unit at a time
    #[serde(alias = "base")]
    Sequential,

    /// Fixed-size worker pool
    #[serde(alias = "optimized")]
    Bounded,

    /// One task per unit under an internal cap
    #[default]
    #[serde(alias = "ultra")]
    Concurrent,
}

impl Variant {
    /// Every supported variant, in display order
    pub const ALL: [Variant; 3] = [Variant::Sequential, Variant::Bounded, Variant::Concurrent];

    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Sequential => "sequential",
            Variant::Bounded => "bounded",
            Variant::Concurrent => "concurrent",
        }
    }

    /// Short human description used by listing endpoints
    pub fn description(&self) -> &'static str {
        match self {
            Variant::Sequential => "processes one article at a time",
            Variant::Bounded => "fans articles out over a fixed worker pool",
            Variant::Concurrent => "fetches many articles concurrently under an internal cap",
        }
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a variant name is not one of the supported variants
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported variant: {0}")]
pub struct UnsupportedVariant(pub String);

impl FromStr for Variant {
    type Err = UnsupportedVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" | "base" => Ok(Variant::Sequential),
            "bounded" | "optimized" => Ok(Variant::Bounded),
            "concurrent" | "ultra" => Ok(Variant::Concurrent),
            _ => Err(UnsupportedVariant(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_legacy_names() {
        assert_eq!("base".parse::<Variant>().unwrap(), Variant::Sequential);
        assert_eq!("Optimized".parse::<Variant>().unwrap(), Variant::Bounded);
        assert_eq!(" ultra ".parse::<Variant>().unwrap(), Variant::Concurrent);
        assert_eq!("bounded".parse::<Variant>().unwrap(), Variant::Bounded);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        let err = "turbo".parse::<Variant>().unwrap_err();
        assert_eq!(err.to_string(), "unsupported variant: turbo");
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&Variant::Bounded).unwrap(), "\"bounded\"");
        let v: Variant = serde_json::from_str("\"ultra\"").unwrap();
        assert_eq!(v, Variant::Concurrent);
        assert_eq!(Variant::default(), Variant::Concurrent);
    }
}
