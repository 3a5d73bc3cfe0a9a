//! Configuration module
//!
//! Settings shared by every command.

use quarry_client::QuarryClient;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the orchestrator service
    pub orchestrator_url: String,
}

impl Config {
    pub fn client(&self) -> QuarryClient {
        QuarryClient::new(&self.orchestrator_url)
    }
}
