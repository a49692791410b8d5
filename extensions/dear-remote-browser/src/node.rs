//! Host-side consumer of a picked path.
//!
//! [`ImagePathNode`] models the canvas node that owns the picker's result: it
//! keeps the chosen path as its widget value, fetches the servable image and
//! tracks the thumbnail it displays. It never renders anything itself; the
//! host reads [`images`](ImagePathNode::images) and redraws when
//! [`take_dirty`](ImagePathNode::take_dirty) reports a change.

use crate::path::basename;
use crate::preview::DecodedRgbaImage;
use crate::service::{RemoteRequest, RemoteResponse, RequestSeq, ServiceError};

/// Image fetched for the node's current value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeImage {
    /// Encoded bytes as served.
    pub bytes: Vec<u8>,
    /// Decoded pixels (feature `preview-decode`).
    pub decoded: Option<DecodedRgbaImage>,
}

/// Canvas node holding an image path widget.
#[derive(Clone, Debug, Default)]
pub struct ImagePathNode {
    value: String,
    images: Option<Vec<NodeImage>>,
    image_index: usize,
    dirty: bool,
    next_seq: RequestSeq,
    pending_image: Option<RequestSeq>,
}

impl ImagePathNode {
    /// Creates a node with an empty widget value.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current widget value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Images shown by the node; `None` after a failed load.
    pub fn images(&self) -> Option<&[NodeImage]> {
        self.images.as_deref()
    }

    /// Index of the displayed image.
    pub fn image_index(&self) -> usize {
        self.image_index
    }

    /// Whether an image request is outstanding.
    pub fn is_loading(&self) -> bool {
        self.pending_image.is_some()
    }

    /// Returns and clears the redraw flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Stores `path` as the widget value and returns the image request to submit.
    ///
    /// A request still in flight for an earlier value is superseded.
    pub fn set_path(&mut self, path: &str) -> RemoteRequest {
        self.value = path.to_owned();
        self.next_seq = self.next_seq.wrapping_add(1);
        let seq = self.next_seq;
        self.pending_image = Some(seq);
        RemoteRequest::ServeImage {
            seq,
            path: path.to_owned(),
            filename: basename(path).to_owned(),
        }
    }

    /// Applies a serve-image response.
    ///
    /// Returns `true` if it was the latest image request. Other response
    /// kinds are ignored.
    pub fn apply_response(&mut self, response: RemoteResponse) -> bool {
        let RemoteResponse::Image { seq, result } = response else {
            return false;
        };
        if self.pending_image != Some(seq) {
            return false;
        }
        self.pending_image = None;

        match result.and_then(load_image) {
            Ok(image) => {
                self.images = Some(vec![image]);
            }
            Err(error) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(path = %self.value, %error, "failed to load image");
                #[cfg(not(feature = "tracing"))]
                let _ = error;
                self.images = None;
            }
        }
        self.image_index = 0;
        self.dirty = true;
        true
    }
}

#[cfg(feature = "preview-decode")]
fn load_image(bytes: Vec<u8>) -> Result<NodeImage, ServiceError> {
    let decoded = crate::preview::decode_image_bytes(&bytes)?;
    Ok(NodeImage {
        bytes,
        decoded: Some(decoded),
    })
}

#[cfg(not(feature = "preview-decode"))]
fn load_image(bytes: Vec<u8>) -> Result<NodeImage, ServiceError> {
    if bytes.is_empty() {
        return Err(ServiceError::Decode("empty image body".into()));
    }
    Ok(NodeImage {
        bytes,
        decoded: None,
    })
}
