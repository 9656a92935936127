//! Client configuration

use serde::{Deserialize, Serialize};

use crate::geo::Coordinates;

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the schema/submission API
    pub api_base_url: String,
    /// Per-request HTTP timeout in seconds
    pub request_timeout_secs: u64,
    /// Budget for acquiring a location fix before the submission aborts
    pub location_timeout_secs: u64,
    /// Station coordinates for deployments without a live location source
    pub fixed_location: Option<Coordinates>,
    /// Logging level
    pub log_level: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.tenderdesk.io/tndms/src".into(),
            request_timeout_secs: 30,
            location_timeout_secs: 10,
            fixed_location: None,
            log_level: "info".into(),
        }
    }
}

impl ClientConfig {
    /// Load from file
    pub fn load(path: &str) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Save to file
    pub fn save(&self, path: &str) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }
}
