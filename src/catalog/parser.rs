use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::Result;

/// Fixed game subtree inside the metadata source.
const GAME_DIR: &str = "Genshin";

/// The only locale published in the current scope.
pub const LOCALE: &str = "CHS";

pub const BANNER_CATALOG: &str = "GachaEvent.json";
pub const MATERIAL_CATALOG: &str = "Material.json";
pub const DISPLAY_ITEM_CATALOG: &str = "DisplayItem.json";
pub const WEAPON_CATALOG: &str = "Weapon.json";

/// One banner campaign as published in the source catalog.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BannerEventRecord {
    pub name: String,
    pub version: String,
    pub order: u32,
    pub from: String,
    pub to: String,
    #[serde(rename = "Type")]
    pub kind: u32,
    pub up_orange_list: Vec<u32>,
    pub up_purple_list: Vec<u32>,
}

/// The subset of an item catalog record the index needs. Catalog records
/// carry many more fields; they are ignored.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ItemRecord {
    pub id: u32,
    pub rank_level: u32,
}

fn catalog_path(root: &Path, file: &str) -> PathBuf {
    root.join(GAME_DIR).join(LOCALE).join(file)
}

/// Read one catalog document from a working copy.
///
/// Returns `Ok(None)` when the file does not exist — the caller abandons
/// that refresh flow without touching the store. Malformed JSON is a hard
/// error for the cycle.
pub async fn read_catalog<T: DeserializeOwned>(root: &Path, file: &str) -> Result<Option<Vec<T>>> {
    let path = catalog_path(root, file);

    let content = match tokio::fs::read_to_string(&path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::error!("catalog file not found: {}", path.display());
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };

    let records = serde_json::from_str(&content)?;
    Ok(Some(records))
}
