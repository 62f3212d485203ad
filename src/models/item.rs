/// One row of the flattened item index: every catalogable item id with
/// its quality, deduplicated across the source catalogs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownItem {
    pub id: u32,
    pub quality: u32,
}
