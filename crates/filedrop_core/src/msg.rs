use crate::{ChannelStatus, ItemId, LocalFile};

#[derive(Debug, PartialEq)]
pub enum Msg {
    /// Local files picked or dropped, in submission order.
    FilesSubmitted(Vec<LocalFile>),
    /// Raw URL text entered by the user.
    UrlSubmitted(String),
    /// Transport progress for the in-flight local upload.
    UploadProgress {
        item_id: ItemId,
        bytes_sent: u64,
        bytes_total: u64,
    },
    /// The local upload finished: `Ok(link)` or `Err(cause)`.
    UploadDone {
        item_id: ItemId,
        result: Result<String, String>,
    },
    /// A server-side fetch report received on the duplex channel.
    Remote(RemoteUpdate),
    /// The duplex channel opened or went away.
    ChannelStatusChanged(ChannelStatus),
    /// UI/render tick to coalesce rendering.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RemoteUpdate {
    pub item_id: ItemId,
    /// `None` when the report carried no size field.
    pub size: Option<ReportedSize>,
    pub name: Option<String>,
    pub status: RemoteStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportedSize {
    Unknown,
    Bytes(u64),
}

#[derive(Debug, Clone, PartialEq)]
pub enum RemoteStatus {
    /// Progress tick; a tick without a percentage only refreshes name/size.
    Progress(Option<f64>),
    Failed(String),
    Completed(String),
}
