//! Filedrop core: the upload queue as a pure state machine.
mod correlator;
mod driver;
mod effect;
mod format;
mod msg;
mod state;
mod update;
mod view_model;

pub use driver::UPLOAD_FAILED_MESSAGE;
pub use effect::Effect;
pub use format::format_size;
pub use msg::{Msg, RemoteStatus, RemoteUpdate, ReportedSize};
pub use state::{
    AppState, ChannelStatus, ItemId, ItemResult, ItemState, LocalFile, Origin, QueueItem,
    REMOTE_PLACEHOLDER_NAME,
};
pub use update::{parse_submitted_url, update};
pub use view_model::{AppViewModel, ItemRowView};
