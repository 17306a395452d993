use std::fmt;

use crate::wire::ChannelEvent;

pub type ItemId = u64;

/// State of the shared duplex channel as seen by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Open,
    Lost,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    UploadProgress {
        item_id: ItemId,
        bytes_sent: u64,
        bytes_total: u64,
    },
    UploadCompleted {
        item_id: ItemId,
        result: Result<String, UploadError>,
    },
    /// A report decoded from the duplex channel.
    Channel(ChannelEvent),
    ChannelState(ChannelState),
}

/// Local file handed to the uploader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSource {
    pub path: std::path::PathBuf,
    pub file_name: String,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadError {
    pub kind: FailureKind,
    pub message: String,
}

impl UploadError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for UploadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for UploadError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidEndpoint,
    /// The local file could not be read.
    Io,
    HttpStatus(u16),
    Timeout,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidEndpoint => write!(f, "invalid upload endpoint"),
            FailureKind::Io => write!(f, "file read error"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}
