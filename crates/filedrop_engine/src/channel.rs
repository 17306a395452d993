//! The long-lived duplex channel shared by every remote fetch.
//!
//! One writer task serializes outgoing requests; one reader task decodes
//! server frames and forwards them to the event sink. Nothing reconnects: when
//! either side ends, the reader reports `ChannelState::Lost` once.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use filedrop_logging::{filedrop_debug, filedrop_info, filedrop_warn};
use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::upload::EventSink;
use crate::wire::{decode_event, encode_request, FetchRequest};
use crate::{ChannelState, EngineEvent};

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("could not open channel to {url}: {message}")]
    Connect { url: String, message: String },
    #[error("channel handshake with {url} timed out after {after:?}")]
    Timeout { url: String, after: Duration },
    #[error("channel is closed")]
    Closed,
}

/// Sending half of an open channel. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ChannelSender {
    tx: mpsc::UnboundedSender<FetchRequest>,
}

impl ChannelSender {
    pub fn send(&self, request: FetchRequest) -> Result<(), ChannelError> {
        self.tx.send(request).map_err(|_| ChannelError::Closed)
    }
}

/// Connects to `url` and spawns the reader and writer tasks on the current
/// tokio runtime.
pub async fn open_channel(
    url: &str,
    sink: Arc<dyn EventSink>,
) -> Result<ChannelSender, ChannelError> {
    let (stream, _response) = connect_async(url)
        .await
        .map_err(|err| ChannelError::Connect {
            url: url.to_string(),
            message: err.to_string(),
        })?;
    filedrop_info!("Channel open url={}", url);
    sink.emit(EngineEvent::ChannelState(ChannelState::Open));

    let (mut write_half, mut read_half) = stream.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<FetchRequest>();
    let lost = Arc::new(LostOnce::default());

    let writer_lost = lost.clone();
    let writer_sink = sink.clone();
    tokio::spawn(async move {
        while let Some(request) = rx.recv().await {
            filedrop_debug!("Channel send id={} url={}", request.id, request.url);
            let text = encode_request(&request);
            if let Err(err) = write_half.send(Message::Text(text.into())).await {
                filedrop_warn!("Channel write failed: {}", err);
                break;
            }
        }
        writer_lost.report(writer_sink.as_ref());
    });

    tokio::spawn(async move {
        while let Some(frame) = read_half.next().await {
            let text = match frame {
                Ok(Message::Text(text)) => text,
                Ok(Message::Close(_)) => break,
                Ok(_) => continue,
                Err(err) => {
                    filedrop_warn!("Channel read failed: {}", err);
                    break;
                }
            };
            match decode_event(text.as_str()) {
                Ok(event) => sink.emit(EngineEvent::Channel(event)),
                Err(err) => filedrop_warn!("Skipping channel frame: {}", err),
            }
        }
        filedrop_info!("Channel closed");
        lost.report(sink.as_ref());
    });

    Ok(ChannelSender { tx })
}

#[derive(Default)]
struct LostOnce(AtomicBool);

impl LostOnce {
    fn report(&self, sink: &dyn EventSink) {
        if !self.0.swap(true, Ordering::SeqCst) {
            sink.emit(EngineEvent::ChannelState(ChannelState::Lost));
        }
    }
}
