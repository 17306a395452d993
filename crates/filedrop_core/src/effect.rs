use crate::{ItemId, LocalFile};

#[derive(Debug, PartialEq, Eq)]
pub enum Effect {
    /// Transfer a local file to the upload endpoint.
    StartUpload { item_id: ItemId, file: LocalFile },
    /// Ask the server to fetch `url` and report back on the duplex channel.
    RequestFetch { item_id: ItemId, url: String },
}
