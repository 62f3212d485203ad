use std::collections::HashSet;

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::Result;
use crate::models::{BannerEvent, BannerType, KnownItem, FEATURED_EPIC_CAP, FEATURED_RARE_CAP};

use super::parser::{BannerEventRecord, ItemRecord, LOCALE};

/// Map one source banner record to a storage row.
///
/// Featured lists are copied positionally and silently truncated at their
/// slot capacity; an unparseable timestamp fails the whole cycle.
pub fn map_banner_event(record: BannerEventRecord) -> Result<BannerEvent> {
    let active_from = parse_timestamp(&record.from)?;
    let active_to = parse_timestamp(&record.to)?;

    let mut featured_rare = record.up_orange_list;
    featured_rare.truncate(FEATURED_RARE_CAP);
    let mut featured_epic = record.up_purple_list;
    featured_epic.truncate(FEATURED_EPIC_CAP);

    Ok(BannerEvent {
        version: record.version,
        name: record.name,
        locale: LOCALE.to_string(),
        order: record.order,
        active_from,
        active_to,
        banner_type: BannerType::from_code(record.kind),
        featured_rare,
        featured_epic,
    })
}

// Source timestamps are naive strings like "2020-09-28 10:00:00"; a few
// entries carry an RFC3339 offset instead.
fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")?;
    Ok(naive.and_utc())
}

/// Fold the item catalogs into one index keyed by item id.
///
/// Catalogs are processed strictly in the order given; the first record
/// seen for an id wins and later catalogs never override it.
pub fn merge_known_items(catalogs: &[Vec<ItemRecord>]) -> Vec<KnownItem> {
    let mut seen = HashSet::new();
    let mut items = Vec::new();

    for catalog in catalogs {
        for record in catalog {
            if seen.insert(record.id) {
                items.push(KnownItem {
                    id: record.id,
                    quality: record.rank_level,
                });
            }
        }
    }

    items
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn record(rare: Vec<u32>, epic: Vec<u32>) -> BannerEventRecord {
        BannerEventRecord {
            name: "Ballad in Goblets".to_string(),
            version: "1.0".to_string(),
            order: 1,
            from: "2020-09-28 10:00:00".to_string(),
            to: "2020-10-18 09:59:59".to_string(),
            kind: 301,
            up_orange_list: rare,
            up_purple_list: epic,
        }
    }

    #[test]
    fn maps_fields_and_parses_timestamps() {
        let event = map_banner_event(record(vec![1022], vec![1023, 1031])).unwrap();

        assert_eq!(event.name, "Ballad in Goblets");
        assert_eq!(event.version, "1.0");
        assert_eq!(event.locale, "CHS");
        assert_eq!(event.order, 1);
        assert_eq!(event.banner_type, BannerType::CharacterEvent);
        assert_eq!(
            event.active_from,
            Utc.with_ymd_and_hms(2020, 9, 28, 10, 0, 0).unwrap()
        );
        assert_eq!(event.featured_rare, vec![1022]);
        assert_eq!(event.featured_epic, vec![1023, 1031]);
    }

    #[test]
    fn rfc3339_timestamps_are_accepted() {
        let mut rec = record(vec![], vec![]);
        rec.from = "2020-09-28T10:00:00+08:00".to_string();

        let event = map_banner_event(rec).unwrap();
        assert_eq!(
            event.active_from,
            Utc.with_ymd_and_hms(2020, 9, 28, 2, 0, 0).unwrap()
        );
    }

    #[test]
    fn bad_timestamp_is_fatal() {
        let mut rec = record(vec![], vec![]);
        rec.from = "soon".to_string();

        assert!(map_banner_event(rec).is_err());
    }

    #[test]
    fn featured_lists_truncate_at_capacity() {
        let event = map_banner_event(record((0..20).collect(), (0..9).collect())).unwrap();

        assert_eq!(event.featured_rare, (0..16).collect::<Vec<u32>>());
        assert_eq!(event.featured_epic, (0..5).collect::<Vec<u32>>());
    }

    #[test]
    fn merge_keeps_the_first_quality_per_id() {
        let materials = vec![
            ItemRecord { id: 42, rank_level: 3 },
            ItemRecord { id: 7, rank_level: 2 },
        ];
        let display_items = vec![
            ItemRecord { id: 42, rank_level: 5 },
            ItemRecord { id: 9, rank_level: 4 },
        ];
        let weapons = vec![
            ItemRecord { id: 9, rank_level: 1 },
            ItemRecord { id: 11, rank_level: 5 },
        ];

        let items = merge_known_items(&[materials, display_items, weapons]);

        assert_eq!(
            items,
            vec![
                KnownItem { id: 42, quality: 3 },
                KnownItem { id: 7, quality: 2 },
                KnownItem { id: 9, quality: 4 },
                KnownItem { id: 11, quality: 5 },
            ]
        );
    }

    #[test]
    fn merge_order_decides_the_winner() {
        let materials = vec![ItemRecord { id: 42, rank_level: 3 }];
        let display_items = vec![ItemRecord { id: 42, rank_level: 5 }];

        let forward = merge_known_items(&[materials.clone(), display_items.clone()]);
        assert_eq!(forward[0].quality, 3);

        let reversed = merge_known_items(&[display_items, materials]);
        assert_eq!(reversed[0].quality, 5);
    }
}
