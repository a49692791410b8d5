#![deny(missing_docs)]
//! Image picker for `dear-imgui-rs` node editors that browses a server-side
//! filesystem.
//!
//! The picker talks to three endpoints exposed by the host editor (directory
//! listing, image preview, image serving) and never touches the local
//! filesystem. It is split in layers:
//! - [`BrowseSession`]: headless browsing/selection state machine, driven by
//!   [`PickerEvent`]s and tagged [`RemoteRequest`]/[`RemoteResponse`] pairs
//! - [`PickerDialog`]: a session bound to a [`RemoteBackend`] and an
//!   `on_select` callback
//! - [`HttpBackend`] (feature `http`): `ureq` transport on worker threads
//! - [`RemotePickerExt`] (feature `imgui`): Dear ImGui rendering
//! - [`ImagePathNode`]: the canvas node consuming the chosen path
//!
//! Note on glyphs: entry icons are emoji. Dear ImGui's default font does not
//! include them; merge an emoji-capable font into the atlas to display them.

mod click;
mod config;
mod core;
mod dialog;
#[cfg(feature = "http")]
mod http;
mod node;
mod path;
mod preview;
mod service;
mod session;
#[cfg(feature = "imgui")]
mod ui;

pub use click::{ClickOutcome, ClickTracker};
pub use config::PickerConfig;
pub use core::{LastPath, PickerError, PickerOutcome, SortMethod, UnknownSortMethod};
pub use dialog::{ClosedFuture, PickerDialog};
#[cfg(feature = "http")]
pub use http::HttpBackend;
pub use node::{ImagePathNode, NodeImage};
pub use path::{basename, containing_dir, ends_with_separator, join_child, separator_of};
#[cfg(feature = "preview-decode")]
pub use preview::{decode_data_uri, decode_image_bytes};
pub use preview::{DecodedRgbaImage, Preview, PreviewState};
pub use service::{
    DirectoryListing, ListRequest, ListingResponse, PreviewResponse, PreviewResult, QueueBackend,
    RemoteBackend, RemoteRequest, RemoteResponse, RequestSeq, ServiceError,
};
pub use session::{
    BrowseSession, EntryId, EntryKind, ListedEntry, ListingState, ListingView, PickerEvent,
};
#[cfg(feature = "imgui")]
pub use ui::{PreviewTextures, RemotePicker, RemotePickerExt};
