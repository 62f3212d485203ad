use std::time::Duration;

use reqwest::Client;

use crate::error::Result;

/// Cycle status reported to the external uptime monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckIn {
    InProgress,
    Ok,
    Error,
}

/// Reports refresh-job check-ins to a ping-style monitor endpoint:
/// `<url>/start` when a cycle begins, `<url>` on success, `<url>/fail`
/// on failure.
pub struct HealthReporter {
    client: Client,
    base_url: String,
}

impl HealthReporter {
    pub fn new(base_url: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, base_url }
    }

    pub async fn report(&self, status: CheckIn) -> Result<()> {
        let url = match status {
            CheckIn::InProgress => format!("{}/start", self.base_url),
            CheckIn::Ok => self.base_url.clone(),
            CheckIn::Error => format!("{}/fail", self.base_url),
        };

        self.client.get(&url).send().await?.error_for_status()?;
        Ok(())
    }
}
