use std::path::Path;

use crate::catalog::{
    self, map_banner_event, merge_known_items, BannerEventRecord, ItemRecord, BANNER_CATALOG,
    DISPLAY_ITEM_CATALOG, MATERIAL_CATALOG, WEAPON_CATALOG,
};
use crate::db::Repository;
use crate::error::Result;
use crate::models::BannerEvent;
use crate::services::{CheckIn, HealthReporter};
use crate::vcs::WorkingCopyProvider;

/// Name of the source configuration record the refresh flows look up.
pub const METADATA_SOURCE_NAME: &str = "Snap.Metadata";

pub struct RefreshService {
    repository: Repository,
    provider: WorkingCopyProvider,
    health: Option<HealthReporter>,
}

impl RefreshService {
    pub fn new(
        repository: Repository,
        provider: WorkingCopyProvider,
        health: Option<HealthReporter>,
    ) -> Self {
        Self {
            repository,
            provider,
            health,
        }
    }

    /// Run one full refresh cycle.
    ///
    /// Both flows get their own attempt even if the first fails; the first
    /// failure is re-raised after the check-in so the scheduler observes
    /// it too.
    pub async fn run_cycle(&self) -> Result<()> {
        self.report(CheckIn::InProgress).await;

        let events = self.refresh_banner_events().await;
        if let Err(e) = &events {
            tracing::error!("banner event refresh failed: {}", e);
        }

        let items = self.refresh_known_items().await;
        if let Err(e) = &items {
            tracing::error!("known item refresh failed: {}", e);
        }

        match events.and(items) {
            Ok(()) => {
                self.report(CheckIn::Ok).await;
                Ok(())
            }
            Err(e) => {
                self.report(CheckIn::Error).await;
                Err(e)
            }
        }
    }

    async fn report(&self, status: CheckIn) {
        if let Some(health) = &self.health {
            // A monitor outage must never fail the cycle itself.
            if let Err(e) = health.report(status).await {
                tracing::warn!("health check-in failed: {}", e);
            }
        }
    }

    async fn refresh_banner_events(&self) -> Result<()> {
        tracing::info!("refreshing banner event metadata");

        let Some(source) = self.repository.get_source(METADATA_SOURCE_NAME).await? else {
            tracing::warn!("source {:?} is not configured, skipping", METADATA_SOURCE_NAME);
            return Ok(());
        };

        let snapshot = self.provider.obtain(&source).await?;
        self.refresh_banner_events_from(snapshot.path()).await
    }

    async fn refresh_banner_events_from(&self, root: &Path) -> Result<()> {
        let Some(records) =
            catalog::read_catalog::<BannerEventRecord>(root, BANNER_CATALOG).await?
        else {
            return Ok(());
        };

        if records.is_empty() {
            tracing::warn!("banner event catalog is empty, keeping previous snapshot");
            return Ok(());
        }

        let events: Vec<BannerEvent> = records
            .into_iter()
            .map(map_banner_event)
            .collect::<Result<_>>()?;

        let count = events.len();
        self.repository.replace_banner_events(events).await?;
        tracing::info!("stored {} banner events", count);

        Ok(())
    }

    async fn refresh_known_items(&self) -> Result<()> {
        tracing::info!("refreshing known item metadata");

        let Some(source) = self.repository.get_source(METADATA_SOURCE_NAME).await? else {
            tracing::warn!("source {:?} is not configured, skipping", METADATA_SOURCE_NAME);
            return Ok(());
        };

        let snapshot = self.provider.obtain(&source).await?;
        self.refresh_known_items_from(snapshot.path()).await
    }

    /// Catalog order fixes merge priority: materials, then display items,
    /// then weapons. Any missing catalog file abandons the flow without
    /// touching the stored snapshot.
    async fn refresh_known_items_from(&self, root: &Path) -> Result<()> {
        let Some(materials) = catalog::read_catalog::<ItemRecord>(root, MATERIAL_CATALOG).await?
        else {
            return Ok(());
        };
        let Some(display_items) =
            catalog::read_catalog::<ItemRecord>(root, DISPLAY_ITEM_CATALOG).await?
        else {
            return Ok(());
        };
        let Some(weapons) = catalog::read_catalog::<ItemRecord>(root, WEAPON_CATALOG).await? else {
            return Ok(());
        };

        if materials.is_empty() && display_items.is_empty() && weapons.is_empty() {
            tracing::warn!("all item catalogs are empty, keeping previous snapshot");
            return Ok(());
        }

        let items = merge_known_items(&[materials, display_items, weapons]);
        let count = items.len();
        self.repository.replace_known_items(items).await?;
        tracing::info!("stored {} known items", count);

        Ok(())
    }
}
