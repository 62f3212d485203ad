mod mapper;
mod parser;

pub use mapper::{map_banner_event, merge_known_items};
pub use parser::{
    read_catalog, BannerEventRecord, ItemRecord, BANNER_CATALOG, DISPLAY_ITEM_CATALOG,
    MATERIAL_CATALOG, WEAPON_CATALOG,
};
