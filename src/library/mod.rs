//! Catalog, media sources and subtitle management

pub mod local;
pub mod ports;
pub mod types;

pub use local::LocalLibrary;
pub use ports::{
    ByteStream, EncodeRequest, ItemRepository, MediaSourceProvider, RemoteSubtitleProvider,
    SubtitleEncoder, SubtitleManager,
};
pub use types::{
    Item, MediaSource, MediaStream, MediaStreamType, RemoteSubtitle, RemoteSubtitleInfo,
    SubtitleSearchRequest, SubtitleStreamRef, UploadSubtitleDto,
};
