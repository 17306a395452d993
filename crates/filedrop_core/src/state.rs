use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::format::format_size;
use crate::view_model::{AppViewModel, ItemRowView};

/// Correlation id minted at enqueue time. Monotonic from 0, never reused.
pub type ItemId = u64;

/// Placeholder name shown for a URL submission until the server names it.
pub const REMOTE_PLACEHOLDER_NAME: &str = "Loading...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Local,
    Remote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ItemState {
    #[default]
    Pending,
    InProgress,
    Succeeded,
    Failed,
}

impl ItemState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ItemState::Succeeded | ItemState::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemResult {
    /// Resource locator returned by the server.
    Link(String),
    /// Message shown in place of a link.
    Error(String),
}

/// Status of the shared duplex channel used for remote fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelStatus {
    #[default]
    NotOpened,
    Open,
    /// The channel went away; remote items still in flight will never finish.
    Lost,
}

/// Raw payload handle of a local file, owned by its queue item until the
/// upload starts. Not `Clone`: exactly one owner hands it to the uploader.
#[derive(Debug, PartialEq, Eq)]
pub struct LocalFile {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
}

impl LocalFile {
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>, size: u64) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            size,
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct QueueItem {
    pub name: String,
    pub origin: Origin,
    pub size_bytes: Option<u64>,
    pub state: ItemState,
    pub progress_percent: f64,
    pub result: Option<ItemResult>,
    pub(crate) source: Option<LocalFile>,
}

impl QueueItem {
    pub fn local(file: LocalFile) -> Self {
        Self {
            name: file.name.clone(),
            origin: Origin::Local,
            size_bytes: Some(file.size),
            state: ItemState::Pending,
            progress_percent: 0.0,
            result: None,
            source: Some(file),
        }
    }

    pub fn remote() -> Self {
        Self {
            name: REMOTE_PLACEHOLDER_NAME.to_string(),
            origin: Origin::Remote,
            size_bytes: None,
            state: ItemState::Pending,
            progress_percent: 0.0,
            result: None,
            source: None,
        }
    }

    /// True while the local payload has not been handed to the uploader.
    pub fn has_source(&self) -> bool {
        self.source.is_some()
    }
}

/// The queue store: an append-only, versioned collection of items plus the
/// bookkeeping of the upload driver and the channel status.
#[derive(Debug, PartialEq, Default)]
pub struct AppState {
    items: BTreeMap<ItemId, QueueItem>,
    next_id: ItemId,
    pub(crate) active_upload: Option<ItemId>,
    channel: ChannelStatus,
    version: u64,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an item and returns its correlation id.
    pub fn enqueue(&mut self, item: QueueItem) -> ItemId {
        let item_id = self.next_id;
        self.next_id += 1;
        self.items.insert(item_id, item);
        self.mark_dirty();
        item_id
    }

    /// Applies `patch` to the item with `item_id`.
    ///
    /// Returns `false` without touching anything when the id is unknown.
    pub fn update_item<F>(&mut self, item_id: ItemId, patch: F) -> bool
    where
        F: FnOnce(&mut QueueItem),
    {
        match self.items.get_mut(&item_id) {
            Some(item) => {
                patch(item);
                self.mark_dirty();
                true
            }
            None => false,
        }
    }

    pub fn item(&self, item_id: ItemId) -> Option<&QueueItem> {
        self.items.get(&item_id)
    }

    /// Ordered read-only view of every item, by correlation id.
    pub fn items(&self) -> impl Iterator<Item = (ItemId, &QueueItem)> {
        self.items.iter().map(|(id, item)| (*id, item))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The local item currently being transferred, if any.
    pub fn active_upload(&self) -> Option<ItemId> {
        self.active_upload
    }

    pub fn channel_status(&self) -> ChannelStatus {
        self.channel
    }

    pub(crate) fn set_channel_status(&mut self, status: ChannelStatus) {
        if self.channel != status {
            self.channel = status;
            self.mark_dirty();
        }
    }

    /// Incremented on every mutation.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns whether a render is due and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// No further progress is possible without new submissions.
    pub fn is_settled(&self) -> bool {
        if self.active_upload.is_some() {
            return false;
        }
        self.items.values().all(|item| {
            item.state.is_terminal()
                || (item.origin == Origin::Remote && self.channel == ChannelStatus::Lost)
        })
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            items: self
                .items
                .iter()
                .map(|(item_id, item)| ItemRowView {
                    item_id: *item_id,
                    name: item.name.clone(),
                    origin: item.origin,
                    size_bytes: item.size_bytes,
                    size_label: item.size_bytes.map(format_size),
                    state: item.state,
                    progress_percent: item.progress_percent,
                    result: item.result.clone(),
                })
                .collect(),
            item_count: self.items.len(),
            uploading: self.active_upload,
            channel: self.channel,
            version: self.version,
            dirty: self.dirty,
            settled: self.is_settled(),
        }
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.version += 1;
        self.dirty = true;
    }
}
