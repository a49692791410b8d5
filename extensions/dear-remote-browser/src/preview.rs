use crate::path::basename;
use crate::service::{PreviewResult, ServiceError};

/// RGBA8 pixels ready to be uploaded as a texture.
#[derive(Clone, PartialEq, Eq)]
pub struct DecodedRgbaImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Tightly packed RGBA8 rows.
    pub rgba: Vec<u8>,
}

impl std::fmt::Debug for DecodedRgbaImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodedRgbaImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.rgba.len())
            .finish()
    }
}

/// A loaded preview for the selected file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Preview {
    /// Previewed file.
    pub path: String,
    /// Basename of `path`.
    pub name: String,
    /// Width of the original image, as reported by the server.
    pub width: u32,
    /// Height of the original image, as reported by the server.
    pub height: u32,
    /// Thumbnail as received.
    pub data_uri: String,
    /// Decoded thumbnail; `None` when decoding is disabled or failed.
    pub image: Option<DecodedRgbaImage>,
}

impl Preview {
    /// Builds a preview for `path` from a service result.
    pub fn new(path: &str, result: PreviewResult) -> Self {
        let image = decode_thumbnail(&result.data_uri);
        Self {
            path: path.to_owned(),
            name: basename(path).to_owned(),
            width: result.width,
            height: result.height,
            data_uri: result.data_uri,
            image,
        }
    }

    /// Dimensions line shown next to the thumbnail.
    pub fn dimensions_label(&self) -> String {
        format!("{} \u{d7} {}", self.width, self.height)
    }
}

/// Preview area state. Never cached: every selection reloads it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum PreviewState {
    /// Nothing selected.
    #[default]
    Empty,
    /// Waiting for the preview service.
    Loading {
        /// File being previewed.
        path: String,
    },
    /// Preview available.
    Ready(Preview),
    /// The preview call failed; selection is unaffected.
    Failed {
        /// File that failed to preview.
        path: String,
        /// Failure.
        error: ServiceError,
    },
}

impl PreviewState {
    /// Path the state refers to, if any.
    pub fn path(&self) -> Option<&str> {
        match self {
            PreviewState::Empty => None,
            PreviewState::Loading { path } | PreviewState::Failed { path, .. } => Some(path),
            PreviewState::Ready(p) => Some(&p.path),
        }
    }

    /// Inline message for a failed preview.
    pub fn error_message(&self) -> Option<String> {
        match self {
            PreviewState::Failed {
                error: ServiceError::Server(msg),
                ..
            } => Some(format!("Preview error: {msg}")),
            PreviewState::Failed { .. } => Some("Error loading preview".to_owned()),
            _ => None,
        }
    }
}

#[cfg(feature = "preview-decode")]
fn decode_thumbnail(data_uri: &str) -> Option<DecodedRgbaImage> {
    match decode_data_uri(data_uri) {
        Ok(img) => Some(img),
        Err(_err) => {
            #[cfg(feature = "tracing")]
            tracing::debug!(error = %_err, "preview thumbnail not decodable");
            None
        }
    }
}

#[cfg(not(feature = "preview-decode"))]
fn decode_thumbnail(_data_uri: &str) -> Option<DecodedRgbaImage> {
    None
}

/// Decodes a base64 `data:` URI holding an encoded image.
#[cfg(feature = "preview-decode")]
pub fn decode_data_uri(uri: &str) -> Result<DecodedRgbaImage, ServiceError> {
    use base64::Engine as _;

    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| ServiceError::Decode("not a data URI".into()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| ServiceError::Decode("data URI without payload".into()))?;
    if !header.ends_with(";base64") {
        return Err(ServiceError::Decode(format!(
            "unsupported data URI encoding: {header}"
        )));
    }
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| ServiceError::Decode(format!("base64: {e}")))?;
    decode_image_bytes(&bytes)
}

/// Decodes encoded image bytes (PNG or JPEG) into RGBA8.
#[cfg(feature = "preview-decode")]
pub fn decode_image_bytes(bytes: &[u8]) -> Result<DecodedRgbaImage, ServiceError> {
    let img = image::load_from_memory(bytes).map_err(|e| ServiceError::Decode(e.to_string()))?;
    let rgba = img.to_rgba8();
    Ok(DecodedRgbaImage {
        width: rgba.width(),
        height: rgba.height(),
        rgba: rgba.into_raw(),
    })
}
