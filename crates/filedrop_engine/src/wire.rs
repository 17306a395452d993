//! JSON frames exchanged on the duplex channel.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ItemId;

/// Client → server: ask the server to fetch `url` on behalf of item `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchRequest {
    pub id: ItemId,
    pub url: String,
}

/// Server → client report, already classified.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelEvent {
    pub id: ItemId,
    pub kind: ChannelEventKind,
    /// `Some(None)` when the server reported `-1` (unknown).
    pub size: Option<Option<u64>>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEventKind {
    Progress(Option<f64>),
    Error(String),
    Completed { url: String },
}

impl ChannelEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self.kind, ChannelEventKind::Progress(_))
    }
}

#[derive(Debug, Error)]
pub enum WireError {
    /// Not JSON, or `id` is missing or not a non-negative integer.
    #[error("malformed channel frame: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct RawFrame {
    id: ItemId,
    #[serde(default)]
    progress: Option<f64>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    size: Option<f64>,
    #[serde(default)]
    name: Option<String>,
}

pub fn encode_request(request: &FetchRequest) -> String {
    // Serializing a struct of an integer and a string cannot fail.
    serde_json::to_string(request).unwrap_or_default()
}

/// Decodes one server frame.
///
/// A frame is terminal iff it carries `error` or `url`; `error` wins when
/// both are present.
pub fn decode_event(text: &str) -> Result<ChannelEvent, WireError> {
    let raw: RawFrame = serde_json::from_str(text)?;

    let kind = match (raw.error, raw.url) {
        (Some(error), _) => ChannelEventKind::Error(error),
        (None, Some(url)) => ChannelEventKind::Completed { url },
        (None, None) => ChannelEventKind::Progress(raw.progress),
    };
    let size = raw
        .size
        .map(|size| (size >= 0.0).then(|| size.round() as u64));

    Ok(ChannelEvent {
        id: raw.id,
        kind,
        size,
        name: raw.name,
    })
}
