use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use tokio_rusqlite::Connection;

use crate::error::Result;
use crate::models::{BannerEvent, BannerType, KnownItem, NewSource, SourceConfig};

use super::schema::SCHEMA;

pub struct Repository {
    conn: Connection,
}

impl Repository {
    pub async fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).await?;

        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    #[cfg(test)]
    pub async fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().await?;

        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    // Source operations

    /// Look up a source configuration by its unique name (exact match).
    pub async fn get_source(&self, name: &str) -> Result<Option<SourceConfig>> {
        let name = name.to_string();
        let source = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, name, clone_url, web_url, kind, created_at, updated_at FROM sources WHERE name = ?1",
                )?;
                let source = stmt
                    .query_row(params![name], |row| Ok(source_from_row(row)))
                    .optional()?;
                Ok(source)
            })
            .await?;
        Ok(source)
    }

    pub async fn get_all_sources(&self) -> Result<Vec<SourceConfig>> {
        let sources = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, name, clone_url, web_url, kind, created_at, updated_at FROM sources ORDER BY name",
                )?;
                let sources = stmt
                    .query_map([], |row| Ok(source_from_row(row)))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(sources)
            })
            .await?;
        Ok(sources)
    }

    pub async fn insert_source(&self, source: NewSource) -> Result<i64> {
        let id = self
            .conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO sources (name, clone_url, web_url, kind) VALUES (?1, ?2, ?3, ?4)",
                    params![source.name, source.clone_url, source.web_url, source.kind],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;
        Ok(id)
    }

    // Banner event operations

    /// Replace the whole banner_events table with `events` in one
    /// transaction. On any failure the transaction is dropped uncommitted
    /// and the previous snapshot stays in place.
    pub async fn replace_banner_events(&self, events: Vec<BannerEvent>) -> Result<()> {
        let rows = events
            .into_iter()
            .map(|event| -> Result<_> {
                Ok((
                    event.version,
                    event.name,
                    event.locale,
                    event.order,
                    event.active_from.to_rfc3339(),
                    event.active_to.to_rfc3339(),
                    event.banner_type.code(),
                    serde_json::to_string(&event.featured_rare)?,
                    serde_json::to_string(&event.featured_epic)?,
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                tx.execute("DELETE FROM banner_events", [])?;
                {
                    let mut stmt = tx.prepare(
                        "INSERT INTO banner_events (version, name, locale, sort_order, active_from, active_to, banner_type, featured_rare, featured_epic)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                    )?;
                    for row in &rows {
                        stmt.execute(params![
                            row.0, row.1, row.2, row.3, row.4, row.5, row.6, row.7, row.8
                        ])?;
                    }
                }
                tx.commit()?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    pub async fn get_banner_events(&self) -> Result<Vec<BannerEvent>> {
        let events = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT version, name, locale, sort_order, active_from, active_to, banner_type, featured_rare, featured_epic
                     FROM banner_events ORDER BY sort_order",
                )?;
                let events = stmt
                    .query_map([], |row| Ok(banner_event_from_row(row)))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(events)
            })
            .await?;
        Ok(events)
    }

    // Known item operations

    /// Replace the whole known_items table with `items` in one transaction.
    pub async fn replace_known_items(&self, items: Vec<KnownItem>) -> Result<()> {
        self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                tx.execute("DELETE FROM known_items", [])?;
                {
                    let mut stmt =
                        tx.prepare("INSERT INTO known_items (id, quality) VALUES (?1, ?2)")?;
                    for item in &items {
                        stmt.execute(params![item.id, item.quality])?;
                    }
                }
                tx.commit()?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    pub async fn get_known_items(&self) -> Result<Vec<KnownItem>> {
        let items = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare("SELECT id, quality FROM known_items ORDER BY id")?;
                let items = stmt
                    .query_map([], |row| {
                        Ok(KnownItem {
                            id: row.get(0)?,
                            quality: row.get(1)?,
                        })
                    })?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(items)
            })
            .await?;
        Ok(items)
    }
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    // Try RFC3339 first (e.g., "2026-01-11T12:34:56+00:00")
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // Try SQLite datetime format (e.g., "2026-01-11 12:34:56")
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    None
}

fn source_from_row(row: &Row) -> SourceConfig {
    SourceConfig {
        id: row.get(0).unwrap(),
        name: row.get(1).unwrap(),
        clone_url: row.get(2).unwrap(),
        web_url: row.get(3).unwrap(),
        kind: row.get(4).unwrap(),
        created_at: row
            .get::<_, String>(5)
            .ok()
            .and_then(|s| parse_datetime(&s))
            .unwrap_or_else(Utc::now),
        updated_at: row
            .get::<_, Option<String>>(6)
            .unwrap()
            .and_then(|s| parse_datetime(&s)),
    }
}

fn banner_event_from_row(row: &Row) -> BannerEvent {
    BannerEvent {
        version: row.get(0).unwrap(),
        name: row.get(1).unwrap(),
        locale: row.get(2).unwrap(),
        order: row.get(3).unwrap(),
        active_from: row
            .get::<_, String>(4)
            .ok()
            .and_then(|s| parse_datetime(&s))
            .unwrap_or_else(Utc::now),
        active_to: row
            .get::<_, String>(5)
            .ok()
            .and_then(|s| parse_datetime(&s))
            .unwrap_or_else(Utc::now),
        banner_type: BannerType::from_code(row.get(6).unwrap()),
        featured_rare: row
            .get::<_, String>(7)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default(),
        featured_epic: row
            .get::<_, String>(8)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    async fn repository() -> Repository {
        Repository::open_in_memory().await.expect("in-memory repository")
    }

    fn banner(version: &str, order: u32) -> BannerEvent {
        BannerEvent {
            version: version.to_string(),
            name: format!("Banner {}", version),
            locale: "CHS".to_string(),
            order,
            active_from: Utc.with_ymd_and_hms(2023, 1, 1, 10, 0, 0).unwrap(),
            active_to: Utc.with_ymd_and_hms(2023, 1, 21, 9, 59, 59).unwrap(),
            banner_type: BannerType::CharacterEvent,
            featured_rare: vec![1002, 1003],
            featured_epic: vec![2001],
        }
    }

    #[tokio::test]
    async fn source_lookup_is_exact_and_optional() {
        let repo = repository().await;
        assert!(repo.get_source("Snap.Metadata").await.unwrap().is_none());

        repo.insert_source(NewSource {
            name: "Snap.Metadata".to_string(),
            clone_url: "https://example.com/meta.git".to_string(),
            web_url: Some("https://example.com/meta".to_string()),
            kind: "git".to_string(),
        })
        .await
        .unwrap();

        let source = repo.get_source("Snap.Metadata").await.unwrap().unwrap();
        assert_eq!(source.clone_url, "https://example.com/meta.git");
        assert_eq!(source.kind, "git");
        assert!(source.updated_at.is_none());

        // Name matching is case-sensitive.
        assert!(repo.get_source("snap.metadata").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn banner_events_round_trip() {
        let repo = repository().await;
        let events = vec![banner("3.3", 1), banner("3.4", 2)];

        repo.replace_banner_events(events.clone()).await.unwrap();

        let stored = repo.get_banner_events().await.unwrap();
        assert_eq!(stored, events);
    }

    #[tokio::test]
    async fn replace_overwrites_the_previous_snapshot() {
        let repo = repository().await;

        repo.replace_banner_events(vec![banner("1.0", 1), banner("1.1", 2)])
            .await
            .unwrap();
        repo.replace_banner_events(vec![banner("2.0", 1)]).await.unwrap();

        let stored = repo.get_banner_events().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].version, "2.0");
    }

    #[tokio::test]
    async fn known_items_round_trip() {
        let repo = repository().await;
        let items = vec![
            KnownItem { id: 5, quality: 4 },
            KnownItem { id: 42, quality: 3 },
        ];

        repo.replace_known_items(items.clone()).await.unwrap();

        assert_eq!(repo.get_known_items().await.unwrap(), items);
    }

    #[tokio::test]
    async fn failed_replace_rolls_back_to_the_previous_snapshot() {
        let repo = repository().await;
        let before = vec![
            KnownItem { id: 1, quality: 3 },
            KnownItem { id: 2, quality: 4 },
        ];
        repo.replace_known_items(before.clone()).await.unwrap();

        // Duplicate ids violate the primary key after the delete has
        // already succeeded inside the transaction.
        let result = repo
            .replace_known_items(vec![
                KnownItem { id: 7, quality: 5 },
                KnownItem { id: 7, quality: 4 },
            ])
            .await;
        assert!(result.is_err());

        assert_eq!(repo.get_known_items().await.unwrap(), before);
    }
}
