use chrono::{DateTime, Utc};

/// Configuration record for an externally-hosted metadata source.
///
/// Rows are created out-of-band (see `--add-source`); the refresh flows
/// only ever read them.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub id: i64,
    pub name: String,
    pub clone_url: String,
    pub web_url: Option<String>,
    pub kind: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewSource {
    pub name: String,
    pub clone_url: String,
    pub web_url: Option<String>,
    pub kind: String,
}
