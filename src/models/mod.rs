mod banner;
mod item;
mod source;

pub use banner::{BannerEvent, BannerType, FEATURED_EPIC_CAP, FEATURED_RARE_CAP};
pub use item::KnownItem;
pub use source::{NewSource, SourceConfig};
