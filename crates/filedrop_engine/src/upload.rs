use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use std::time::Duration;

use bytes::Bytes;
use futures_util::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::Body;
use tokio_util::io::ReaderStream;

use crate::{EngineEvent, FailureKind, ItemId, UploadError, UploadSource};

/// Multipart field carrying the file payload.
pub const UPLOAD_FIELD: &str = "file";

const READ_CHUNK: usize = 64 * 1024;

#[derive(Debug, Clone)]
pub struct UploadSettings {
    /// Absolute URL of the upload endpoint.
    pub endpoint: String,
    /// `None` waits forever for a stalled server.
    pub connect_timeout: Option<Duration>,
    pub request_timeout: Option<Duration>,
}

impl UploadSettings {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            connect_timeout: None,
            request_timeout: None,
        }
    }
}

/// Receives engine events from upload tasks and the channel reader.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: std::sync::mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: std::sync::mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

#[async_trait::async_trait]
pub trait Uploader: Send + Sync {
    /// Uploads one file and returns the locator from the response body.
    async fn upload(
        &self,
        item_id: ItemId,
        source: UploadSource,
        sink: Arc<dyn EventSink>,
    ) -> Result<String, UploadError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestUploader {
    settings: UploadSettings,
}

impl ReqwestUploader {
    pub fn new(settings: UploadSettings) -> Self {
        Self { settings }
    }

    fn build_client(&self) -> Result<reqwest::Client, UploadError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.settings.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(timeout) = self.settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        builder
            .build()
            .map_err(|err| UploadError::new(FailureKind::Network, err.to_string()))
    }
}

#[async_trait::async_trait]
impl Uploader for ReqwestUploader {
    async fn upload(
        &self,
        item_id: ItemId,
        source: UploadSource,
        sink: Arc<dyn EventSink>,
    ) -> Result<String, UploadError> {
        let endpoint = reqwest::Url::parse(&self.settings.endpoint)
            .map_err(|err| UploadError::new(FailureKind::InvalidEndpoint, err.to_string()))?;
        let client = self.build_client()?;

        let file = tokio::fs::File::open(&source.path)
            .await
            .map_err(|err| UploadError::new(FailureKind::Io, err.to_string()))?;
        // The size captured at submission may be stale; prefer the current one.
        let bytes_total = match file.metadata().await {
            Ok(meta) => meta.len(),
            Err(_) => source.size,
        };

        let sent = Arc::new(AtomicU64::new(0));
        let progress_sink = sink.clone();
        let stream = ReaderStream::with_capacity(file, READ_CHUNK).map(
            move |chunk: std::io::Result<Bytes>| {
                if let Ok(bytes) = &chunk {
                    let bytes_sent =
                        sent.fetch_add(bytes.len() as u64, Ordering::Relaxed) + bytes.len() as u64;
                    progress_sink.emit(EngineEvent::UploadProgress {
                        item_id,
                        bytes_sent,
                        bytes_total,
                    });
                }
                chunk
            },
        );

        let part = Part::stream_with_length(Body::wrap_stream(stream), bytes_total)
            .file_name(source.file_name.clone());
        let form = Form::new().part(UPLOAD_FIELD, part);

        let response = client
            .post(endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(UploadError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let body = response.text().await.map_err(map_reqwest_error)?;
        Ok(body.trim().to_string())
    }
}

fn map_reqwest_error(err: reqwest::Error) -> UploadError {
    if err.is_timeout() {
        return UploadError::new(FailureKind::Timeout, err.to_string());
    }
    UploadError::new(FailureKind::Network, err.to_string())
}
