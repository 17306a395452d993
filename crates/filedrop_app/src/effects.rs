use std::time::Duration;

use filedrop_core::{ChannelStatus, Effect, Msg, RemoteStatus, RemoteUpdate, ReportedSize};
use filedrop_engine::{
    ChannelEvent, ChannelEventKind, ChannelState, EngineEvent, EngineHandle, EngineSettings,
    UploadSource,
};
use filedrop_logging::{filedrop_info, filedrop_warn};

/// Executes core effects on the engine and turns engine events back into
/// messages.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(settings: EngineSettings) -> Self {
        Self::with_engine(EngineHandle::new(settings))
    }

    pub fn with_engine(engine: EngineHandle) -> Self {
        Self { engine }
    }

    pub fn run(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::StartUpload { item_id, file } => {
                    filedrop_info!(
                        "StartUpload item_id={} name={} size={}",
                        item_id,
                        file.name,
                        file.size
                    );
                    self.engine.upload(
                        item_id,
                        UploadSource {
                            path: file.path,
                            file_name: file.name,
                            size: file.size,
                        },
                    );
                }
                Effect::RequestFetch { item_id, url } => {
                    filedrop_info!("RequestFetch item_id={} url={}", item_id, url);
                    self.engine.fetch(item_id, url);
                }
            }
        }
    }

    /// Waits up to `timeout` for the next engine event.
    pub fn next_msg(&self, timeout: Duration) -> Option<Msg> {
        self.engine.recv_timeout(timeout).map(map_event)
    }
}

pub fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::UploadProgress {
            item_id,
            bytes_sent,
            bytes_total,
        } => Msg::UploadProgress {
            item_id,
            bytes_sent,
            bytes_total,
        },
        EngineEvent::UploadCompleted { item_id, result } => Msg::UploadDone {
            item_id,
            result: result.map_err(|err| {
                filedrop_warn!("Upload item_id={} failed: {}", item_id, err);
                err.to_string()
            }),
        },
        EngineEvent::Channel(event) => Msg::Remote(map_channel_event(event)),
        EngineEvent::ChannelState(ChannelState::Open) => {
            Msg::ChannelStatusChanged(ChannelStatus::Open)
        }
        EngineEvent::ChannelState(ChannelState::Lost) => {
            Msg::ChannelStatusChanged(ChannelStatus::Lost)
        }
    }
}

fn map_channel_event(event: ChannelEvent) -> RemoteUpdate {
    RemoteUpdate {
        item_id: event.id,
        size: event.size.map(|size| match size {
            Some(bytes) => ReportedSize::Bytes(bytes),
            None => ReportedSize::Unknown,
        }),
        name: event.name,
        status: match event.kind {
            ChannelEventKind::Progress(percent) => RemoteStatus::Progress(percent),
            ChannelEventKind::Error(error) => RemoteStatus::Failed(error),
            ChannelEventKind::Completed { url } => RemoteStatus::Completed(url),
        },
    }
}
