//! Applies server-side fetch reports to remote items by correlation id.

use filedrop_logging::{filedrop_debug, filedrop_warn};

use crate::{AppState, ItemResult, ItemState, Origin, RemoteStatus, RemoteUpdate, ReportedSize};

impl AppState {
    /// Applies a channel report.
    ///
    /// Reports for unknown ids, local items, or items that already reached a
    /// terminal state leave the queue untouched.
    pub(crate) fn apply_remote(&mut self, report: RemoteUpdate) {
        let item_id = report.item_id;
        let Some(item) = self.item(item_id) else {
            filedrop_warn!("Ignoring channel report for unknown item_id={}", item_id);
            return;
        };
        if item.origin != Origin::Remote {
            filedrop_warn!("Ignoring channel report for local item_id={}", item_id);
            return;
        }
        if item.state.is_terminal() {
            filedrop_debug!("Ignoring channel report for finished item_id={}", item_id);
            return;
        }

        self.update_item(item_id, |item| {
            if let Some(name) = report.name {
                item.name = name;
            }
            match report.size {
                Some(ReportedSize::Bytes(bytes)) => item.size_bytes = Some(bytes),
                Some(ReportedSize::Unknown) => item.size_bytes = None,
                None => {}
            }

            match report.status {
                RemoteStatus::Progress(percent) => {
                    item.state = ItemState::InProgress;
                    if let Some(percent) = percent {
                        let percent = percent.clamp(0.0, 100.0);
                        if percent > item.progress_percent {
                            item.progress_percent = percent;
                        }
                    }
                }
                RemoteStatus::Failed(error) => {
                    item.state = ItemState::Failed;
                    item.result = Some(ItemResult::Error(error));
                }
                RemoteStatus::Completed(link) => {
                    item.state = ItemState::Succeeded;
                    item.progress_percent = 100.0;
                    item.result = Some(ItemResult::Link(link));
                }
            }
        });
    }
}
