use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use filedrop_logging::{filedrop_error, filedrop_warn};
use tokio::sync::mpsc as tokio_mpsc;

use crate::channel::{open_channel, ChannelError, ChannelSender};
use crate::upload::{ChannelEventSink, EventSink, ReqwestUploader, UploadSettings, Uploader};
use crate::wire::FetchRequest;
use crate::{ChannelState, EngineEvent, ItemId, UploadSource};

enum EngineCommand {
    Upload { item_id: ItemId, source: UploadSource },
    Fetch { item_id: ItemId, url: String },
}

#[derive(Debug, Clone, Default)]
pub struct ChannelSettings {
    /// `ws://` or `wss://` URL of the duplex channel; `None` disables remote
    /// fetches.
    pub url: Option<String>,
    /// Upper bound on the websocket handshake; `None` waits forever.
    pub connect_timeout: Option<Duration>,
}

impl ChannelSettings {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            connect_timeout: None,
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub upload: UploadSettings,
    pub channel: ChannelSettings,
}

/// Runs transfers on a background tokio runtime.
///
/// The engine only executes what it is told: upload ordering is decided by
/// the caller. Fetch requests go to a channel task that connects on the first
/// request, so a slow handshake never holds up uploads.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(settings: EngineSettings) -> Self {
        let uploader = Arc::new(ReqwestUploader::new(settings.upload));
        Self::with_uploader(uploader, settings.channel)
    }

    pub fn with_uploader(uploader: Arc<dyn Uploader>, channel: ChannelSettings) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let sink: Arc<dyn EventSink> = Arc::new(ChannelEventSink::new(event_tx));

        thread::spawn(move || {
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime,
                Err(err) => {
                    filedrop_error!("Could not start engine runtime: {}", err);
                    return;
                }
            };
            let mut fetch_tx: Option<tokio_mpsc::UnboundedSender<FetchRequest>> = None;
            while let Ok(command) = cmd_rx.recv() {
                match command {
                    EngineCommand::Upload { item_id, source } => {
                        let uploader = uploader.clone();
                        let sink = sink.clone();
                        runtime.spawn(async move {
                            let result = uploader.upload(item_id, source, sink.clone()).await;
                            sink.emit(EngineEvent::UploadCompleted { item_id, result });
                        });
                    }
                    EngineCommand::Fetch { item_id, url } => {
                        let requests = fetch_tx.get_or_insert_with(|| {
                            let (tx, rx) = tokio_mpsc::unbounded_channel();
                            runtime.spawn(run_channel(channel.clone(), sink.clone(), rx));
                            tx
                        });
                        if requests.send(FetchRequest { id: item_id, url }).is_err() {
                            filedrop_warn!("No channel; fetch item_id={} dropped", item_id);
                        }
                    }
                }
            }
        });

        Self { cmd_tx, event_rx }
    }

    pub fn upload(&self, item_id: ItemId, source: UploadSource) {
        let _ = self.cmd_tx.send(EngineCommand::Upload { item_id, source });
    }

    pub fn fetch(&self, item_id: ItemId, url: impl Into<String>) {
        let _ = self.cmd_tx.send(EngineCommand::Fetch {
            item_id,
            url: url.into(),
        });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}

/// Connects once, then forwards queued fetch requests for the life of the
/// engine. Requests queued while the handshake is pending are sent after it.
async fn run_channel(
    settings: ChannelSettings,
    sink: Arc<dyn EventSink>,
    mut requests: tokio_mpsc::UnboundedReceiver<FetchRequest>,
) {
    let Some(sender) = connect(&settings, &sink).await else {
        requests.close();
        while let Some(request) = requests.recv().await {
            filedrop_warn!("No channel; fetch item_id={} dropped", request.id);
        }
        return;
    };
    while let Some(request) = requests.recv().await {
        let item_id = request.id;
        if sender.send(request).is_err() {
            filedrop_warn!("Channel closed; fetch item_id={} dropped", item_id);
        }
    }
}

async fn connect(settings: &ChannelSettings, sink: &Arc<dyn EventSink>) -> Option<ChannelSender> {
    let Some(url) = settings.url.as_deref() else {
        filedrop_warn!("No channel URL configured");
        sink.emit(EngineEvent::ChannelState(ChannelState::Lost));
        return None;
    };
    let opening = open_channel(url, sink.clone());
    let result = match settings.connect_timeout {
        Some(limit) => tokio::time::timeout(limit, opening)
            .await
            .unwrap_or_else(|_| {
                Err(ChannelError::Timeout {
                    url: url.to_string(),
                    after: limit,
                })
            }),
        None => opening.await,
    };
    match result {
        Ok(sender) => Some(sender),
        Err(err) => {
            filedrop_error!("{}", err);
            sink.emit(EngineEvent::ChannelState(ChannelState::Lost));
            None
        }
    }
}
