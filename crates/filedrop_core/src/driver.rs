//! Local upload driver: one in-flight transfer at a time, FIFO by id.

use filedrop_logging::{filedrop_debug, filedrop_warn};

use crate::{AppState, Effect, ItemId, ItemResult, ItemState, Origin};

/// Result text shown for every failed local upload; the cause is only logged.
pub const UPLOAD_FAILED_MESSAGE: &str = "Upload failed";

impl AppState {
    /// Starts the next pending local upload when the driver is idle.
    pub(crate) fn start_next_upload(&mut self) -> Option<Effect> {
        if self.active_upload.is_some() {
            return None;
        }

        let item_id = self
            .items()
            .find(|(_, item)| {
                item.origin == Origin::Local && !item.state.is_terminal() && item.has_source()
            })
            .map(|(item_id, _)| item_id)?;

        let mut file = None;
        self.update_item(item_id, |item| {
            file = item.source.take();
            item.state = ItemState::InProgress;
            item.progress_percent = 0.0;
        });
        let file = file?;

        filedrop_debug!("Starting upload item_id={} name={}", item_id, file.name);
        self.active_upload = Some(item_id);
        Some(Effect::StartUpload { item_id, file })
    }

    pub(crate) fn apply_upload_progress(&mut self, item_id: ItemId, bytes_sent: u64, bytes_total: u64) {
        if self.active_upload != Some(item_id) {
            filedrop_debug!("Ignoring progress for inactive upload item_id={}", item_id);
            return;
        }

        let percent = if bytes_total == 0 {
            100.0
        } else {
            (bytes_sent as f64 * 100.0 / bytes_total as f64).clamp(0.0, 100.0)
        };

        let advances = self
            .item(item_id)
            .is_some_and(|item| percent > item.progress_percent);
        if advances {
            self.update_item(item_id, |item| item.progress_percent = percent);
        }
    }

    /// Marks the in-flight upload terminal and frees the driver.
    ///
    /// Returns `false` if `item_id` is not the in-flight upload.
    pub(crate) fn finish_upload(&mut self, item_id: ItemId, result: Result<String, String>) -> bool {
        if self.active_upload != Some(item_id) {
            filedrop_warn!("Ignoring completion for inactive upload item_id={}", item_id);
            return false;
        }
        self.active_upload = None;

        self.update_item(item_id, |item| match result {
            Ok(link) => {
                item.state = ItemState::Succeeded;
                item.progress_percent = 100.0;
                item.result = Some(ItemResult::Link(link));
            }
            Err(cause) => {
                filedrop_warn!("Upload of {} failed: {}", item.name, cause);
                item.state = ItemState::Failed;
                item.result = Some(ItemResult::Error(UPLOAD_FAILED_MESSAGE.to_string()));
            }
        })
    }
}
