//! Filedrop engine: upload transport, duplex channel and effect execution.
mod channel;
mod engine;
mod types;
mod upload;
pub mod wire;

pub use channel::{open_channel, ChannelError, ChannelSender};
pub use engine::{ChannelSettings, EngineHandle, EngineSettings};
pub use types::{ChannelState, EngineEvent, FailureKind, ItemId, UploadError, UploadSource};
pub use upload::{
    ChannelEventSink, EventSink, ReqwestUploader, UploadSettings, Uploader, UPLOAD_FIELD,
};
pub use wire::{ChannelEvent, ChannelEventKind, FetchRequest};
