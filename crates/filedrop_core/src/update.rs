use filedrop_logging::{filedrop_info, filedrop_warn};

use crate::{AppState, Effect, ItemState, Msg, QueueItem};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::FilesSubmitted(files) => {
            if files.is_empty() {
                return (state, Vec::new());
            }
            for file in files {
                let item_id = state.enqueue(QueueItem::local(file));
                filedrop_info!("Enqueued local item_id={}", item_id);
            }
            state.start_next_upload().into_iter().collect()
        }
        Msg::UrlSubmitted(raw) => match parse_submitted_url(&raw) {
            Some(url) => {
                let item_id = state.enqueue(QueueItem::remote());
                state.update_item(item_id, |item| item.state = ItemState::InProgress);
                filedrop_info!("Enqueued remote item_id={} url={}", item_id, url);
                vec![Effect::RequestFetch { item_id, url }]
            }
            None => {
                filedrop_warn!("Rejected URL submission {:?}", raw);
                Vec::new()
            }
        },
        Msg::UploadProgress {
            item_id,
            bytes_sent,
            bytes_total,
        } => {
            state.apply_upload_progress(item_id, bytes_sent, bytes_total);
            Vec::new()
        }
        Msg::UploadDone { item_id, result } => {
            state.finish_upload(item_id, result);
            state.start_next_upload().into_iter().collect()
        }
        Msg::Remote(report) => {
            state.apply_remote(report);
            Vec::new()
        }
        Msg::ChannelStatusChanged(status) => {
            state.set_channel_status(status);
            Vec::new()
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

/// Accepts a non-empty absolute URL; returns it trimmed.
pub fn parse_submitted_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    url::Url::parse(trimmed).ok()?;
    Some(trimmed.to_string())
}
