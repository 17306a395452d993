use crate::{ChannelStatus, ItemId, ItemResult, ItemState, Origin};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppViewModel {
    pub items: Vec<ItemRowView>,
    pub item_count: usize,
    pub uploading: Option<ItemId>,
    pub channel: ChannelStatus,
    pub version: u64,
    pub dirty: bool,
    pub settled: bool,
}

impl AppViewModel {
    pub fn row(&self, item_id: ItemId) -> Option<&ItemRowView> {
        self.items.iter().find(|row| row.item_id == item_id)
    }

    pub fn in_progress_count(&self) -> usize {
        self.items
            .iter()
            .filter(|row| row.state == ItemState::InProgress)
            .count()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItemRowView {
    pub item_id: ItemId,
    pub name: String,
    pub origin: Origin,
    pub size_bytes: Option<u64>,
    /// Human readable size, `None` while unknown.
    pub size_label: Option<String>,
    pub state: ItemState,
    pub progress_percent: f64,
    pub result: Option<ItemResult>,
}
