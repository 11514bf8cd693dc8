//! Replica identity.
//!
//! # Responsibilities
//! - Name the two replicas (PRIMARY, SECONDARY)
//! - Map a replica to its configured base URL
//! - Provide the "other replica" relation used by failover

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::ReplicaConfig;

/// One of the two backend replicas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Replica {
    Primary,
    Secondary,
}

impl Replica {
    /// The replica a request falls back to when this one fails.
    pub fn other(self) -> Replica {
        match self {
            Replica::Primary => Replica::Secondary,
            Replica::Secondary => Replica::Primary,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Replica::Primary => "PRIMARY",
            Replica::Secondary => "SECONDARY",
        }
    }

    /// Lowercase role name, as used in log notes (`fallback_primary_down`).
    pub fn role(self) -> &'static str {
        match self {
            Replica::Primary => "primary",
            Replica::Secondary => "secondary",
        }
    }
}

impl fmt::Display for Replica {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Base URLs of both replicas. Immutable after startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replicas {
    primary: String,
    secondary: String,
}

impl Replicas {
    pub fn new(primary: impl Into<String>, secondary: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            secondary: secondary.into(),
        }
    }

    pub fn from_config(config: &ReplicaConfig) -> Self {
        Self::new(
            config.primary_url.trim_end_matches('/'),
            config.secondary_url.trim_end_matches('/'),
        )
    }

    /// Base URL of `replica`, without a trailing slash.
    pub fn url(&self, replica: Replica) -> &str {
        match replica {
            Replica::Primary => &self.primary,
            Replica::Secondary => &self.secondary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_other_is_an_involution() {
        assert_eq!(Replica::Primary.other(), Replica::Secondary);
        assert_eq!(Replica::Secondary.other().other(), Replica::Secondary);
    }

    #[test]
    fn test_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Replica::Primary).unwrap(), "\"PRIMARY\"");
        assert_eq!(Replica::Secondary.role(), "secondary");
    }

    #[test]
    fn test_urls_from_config_drop_trailing_slash() {
        let replicas = Replicas::from_config(&ReplicaConfig {
            primary_url: "http://a:8000/".into(),
            secondary_url: "http://b:8000".into(),
        });
        assert_eq!(replicas.url(Replica::Primary), "http://a:8000");
        assert_eq!(replicas.url(Replica::Secondary), "http://b:8000");
    }
}
