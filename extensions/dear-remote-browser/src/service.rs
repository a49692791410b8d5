use std::collections::VecDeque;

use serde::Deserialize;
use thiserror::Error;

use crate::core::SortMethod;

/// Tag carried by every remote request and echoed by its response.
pub type RequestSeq = u64;

/// Failure of one remote call.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// Connection or I/O failure before a response body was read
    #[error("transport error: {0}")]
    Transport(String),
    /// Non-success HTTP status without a usable body
    #[error("http status {0}")]
    Status(u16),
    /// Body could not be decoded (JSON or image bytes)
    #[error("decode error: {0}")]
    Decode(String),
    /// The endpoint reported an error
    #[error("{0}")]
    Server(String),
}

/// Request for the listing service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListRequest {
    /// Directory to list, as typed or built by the picker.
    pub path: String,
    /// Requested ordering.
    pub sort: SortMethod,
}

/// Raw JSON body returned by the listing endpoint.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ListingResponse {
    /// Error reported by the server; wins over every other field.
    #[serde(default)]
    pub error: Option<String>,
    /// Server-normalized path of the listed directory.
    #[serde(default)]
    pub current_path: Option<String>,
    /// Parent directory, absent at a root.
    #[serde(default)]
    pub parent_path: Option<String>,
    /// Child directory names in server order.
    #[serde(default)]
    pub directories: Vec<String>,
    /// Child file names in server order.
    #[serde(default)]
    pub files: Vec<String>,
    /// Sort method the server actually applied.
    #[serde(default)]
    pub sort_method: Option<String>,
}

impl ListingResponse {
    /// Validates the body into a [`DirectoryListing`].
    pub fn into_listing(self) -> Result<DirectoryListing, ServiceError> {
        if let Some(err) = self.error {
            return Err(ServiceError::Server(err));
        }
        Ok(DirectoryListing {
            current_path: self.current_path.unwrap_or_default(),
            parent_path: self.parent_path.filter(|p| !p.is_empty()),
            directories: self.directories,
            files: self.files,
            sort_method: self.sort_method.filter(|s| !s.is_empty()),
        })
    }
}

/// A successful directory listing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DirectoryListing {
    /// Server-normalized path of the listed directory.
    pub current_path: String,
    /// Parent directory, `None` at a root.
    pub parent_path: Option<String>,
    /// Child directory names in server order.
    pub directories: Vec<String>,
    /// Child file names in server order.
    pub files: Vec<String>,
    /// Sort method echoed by the server, unparsed.
    pub sort_method: Option<String>,
}

/// Raw JSON body returned by the preview endpoint.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PreviewResponse {
    /// Error reported by the server.
    #[serde(default)]
    pub error: Option<String>,
    /// Thumbnail as a `data:` URI.
    #[serde(default)]
    pub preview: Option<String>,
    /// Width of the original image in pixels.
    #[serde(default)]
    pub width: Option<u32>,
    /// Height of the original image in pixels.
    #[serde(default)]
    pub height: Option<u32>,
}

impl PreviewResponse {
    /// Validates the body into a [`PreviewResult`].
    pub fn into_result(self) -> Result<PreviewResult, ServiceError> {
        if let Some(err) = self.error {
            return Err(ServiceError::Server(err));
        }
        let data_uri = self
            .preview
            .ok_or_else(|| ServiceError::Decode("missing preview field".into()))?;
        Ok(PreviewResult {
            data_uri,
            width: self.width.unwrap_or(0),
            height: self.height.unwrap_or(0),
        })
    }
}

/// A rendered preview for one file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreviewResult {
    /// Thumbnail as a `data:` URI.
    pub data_uri: String,
    /// Width of the original image in pixels.
    pub width: u32,
    /// Height of the original image in pixels.
    pub height: u32,
}

/// A call to one of the three host endpoints.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RemoteRequest {
    /// List a directory.
    ListDirectory {
        /// Request tag.
        seq: RequestSeq,
        /// Path and ordering.
        request: ListRequest,
    },
    /// Render a preview for a file.
    Preview {
        /// Request tag.
        seq: RequestSeq,
        /// File to preview.
        path: String,
    },
    /// Fetch the full image bytes for a file.
    ServeImage {
        /// Request tag.
        seq: RequestSeq,
        /// File to fetch.
        path: String,
        /// Basename sent alongside the path.
        filename: String,
    },
}

impl RemoteRequest {
    /// Tag of this request.
    pub fn seq(&self) -> RequestSeq {
        match self {
            RemoteRequest::ListDirectory { seq, .. }
            | RemoteRequest::Preview { seq, .. }
            | RemoteRequest::ServeImage { seq, .. } => *seq,
        }
    }
}

/// Completion of a [`RemoteRequest`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RemoteResponse {
    /// Completion of [`RemoteRequest::ListDirectory`].
    Listing {
        /// Tag of the originating request.
        seq: RequestSeq,
        /// Listing or failure.
        result: Result<DirectoryListing, ServiceError>,
    },
    /// Completion of [`RemoteRequest::Preview`].
    Preview {
        /// Tag of the originating request.
        seq: RequestSeq,
        /// Preview or failure.
        result: Result<PreviewResult, ServiceError>,
    },
    /// Completion of [`RemoteRequest::ServeImage`].
    Image {
        /// Tag of the originating request.
        seq: RequestSeq,
        /// Encoded image bytes or failure.
        result: Result<Vec<u8>, ServiceError>,
    },
}

impl RemoteResponse {
    /// Tag of the originating request.
    pub fn seq(&self) -> RequestSeq {
        match self {
            RemoteResponse::Listing { seq, .. }
            | RemoteResponse::Preview { seq, .. }
            | RemoteResponse::Image { seq, .. } => *seq,
        }
    }
}

/// Transport executing remote requests.
///
/// Requests are fire-and-forget: `submit` must not block, and completions are
/// drained with `poll` from the UI thread, in whatever order they finish.
pub trait RemoteBackend {
    /// Starts a request.
    fn submit(&mut self, request: RemoteRequest);
    /// Returns the next finished response, if any.
    fn poll(&mut self) -> Option<RemoteResponse>;
}

impl<B: RemoteBackend + ?Sized> RemoteBackend for Box<B> {
    fn submit(&mut self, request: RemoteRequest) {
        (**self).submit(request);
    }

    fn poll(&mut self) -> Option<RemoteResponse> {
        (**self).poll()
    }
}

/// In-memory backend that records requests and replays queued responses.
///
/// Useful for tests and for hosts that answer requests themselves.
#[derive(Debug, Default)]
pub struct QueueBackend {
    submitted: Vec<RemoteRequest>,
    ready: VecDeque<RemoteResponse>,
}

impl QueueBackend {
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests submitted so far, in submission order.
    pub fn submitted(&self) -> &[RemoteRequest] {
        &self.submitted
    }

    /// Drains the submitted requests.
    pub fn take_submitted(&mut self) -> Vec<RemoteRequest> {
        std::mem::take(&mut self.submitted)
    }

    /// Queues a response to be returned by the next `poll`.
    pub fn respond(&mut self, response: RemoteResponse) {
        self.ready.push_back(response);
    }
}

impl RemoteBackend for QueueBackend {
    fn submit(&mut self, request: RemoteRequest) {
        self.submitted.push(request);
    }

    fn poll(&mut self) -> Option<RemoteResponse> {
        self.ready.pop_front()
    }
}
