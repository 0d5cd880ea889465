//! Error types for loading planner configuration and scenarios.
//!
//! Expected planning conditions (empty frontier, field edges, a tree of one
//! node) are ordinary control flow and never show up here.

use thiserror::Error;

/// Errors raised at the I/O boundary of the planner.
#[derive(Error, Debug)]
pub enum RigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Scenario error: {0}")]
    Scenario(String),
}

impl From<toml::de::Error> for RigError {
    fn from(e: toml::de::Error) -> Self {
        RigError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toml_error_maps_to_config() {
        let parsed: std::result::Result<toml::Value, _> = toml::from_str("budget = = 3");
        let err: RigError = parsed.unwrap_err().into();
        assert!(matches!(err, RigError::Config(_)));
    }

    #[test]
    fn test_display() {
        let err = RigError::Scenario("follower 'inky' needs two waypoints".into());
        assert_eq!(
            err.to_string(),
            "Scenario error: follower 'inky' needs two waypoints"
        );
    }
}
