use std::time::Duration;

use serde::Deserialize;

use crate::core::SortMethod;

/// Picker configuration: endpoint locations and interaction timing.
///
/// Deserializable from any serde format; missing fields take their defaults.
///
/// ```
/// use dear_remote_browser::{PickerConfig, SortMethod};
/// let cfg = PickerConfig::default()
///     .with_base_url("http://localhost:8188")
///     .with_default_sort(SortMethod::DateDesc);
/// assert_eq!(cfg.browse_url(), "http://localhost:8188/ib_custom_nodes/browse_directory");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PickerConfig {
    /// Scheme, host and port of the host editor's HTTP API.
    pub base_url: String,
    /// Route of the listing endpoint.
    pub browse_endpoint: String,
    /// Route of the preview endpoint.
    pub preview_endpoint: String,
    /// Route of the serve-image endpoint.
    pub serve_endpoint: String,
    /// Disambiguation window between a single and a double click.
    pub double_click_window_ms: u64,
    /// Sort method a new session starts with.
    pub default_sort: SortMethod,
    /// Per-request timeout; `None` lets a hung request stay in "Loading...".
    pub request_timeout_ms: Option<u64>,
}

impl Default for PickerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8188".to_owned(),
            browse_endpoint: "/ib_custom_nodes/browse_directory".to_owned(),
            preview_endpoint: "/ib_custom_nodes/get_image_preview".to_owned(),
            serve_endpoint: "/ib_custom_nodes/serve_image".to_owned(),
            double_click_window_ms: 300,
            default_sort: SortMethod::NameAsc,
            request_timeout_ms: None,
        }
    }
}

impl PickerConfig {
    /// Set the base URL of the host API
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
    /// Set the disambiguation window
    pub fn with_double_click_window(mut self, window: Duration) -> Self {
        self.double_click_window_ms = window.as_millis() as u64;
        self
    }
    /// Set the initial sort method
    pub fn with_default_sort(mut self, sort: SortMethod) -> Self {
        self.default_sort = sort;
        self
    }
    /// Set a per-request timeout
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout_ms = timeout.map(|t| t.as_millis() as u64);
        self
    }

    /// Disambiguation window as a [`Duration`].
    pub fn double_click_window(&self) -> Duration {
        Duration::from_millis(self.double_click_window_ms)
    }

    /// Request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }

    /// Full URL of the listing endpoint.
    pub fn browse_url(&self) -> String {
        self.endpoint_url(&self.browse_endpoint)
    }

    /// Full URL of the preview endpoint.
    pub fn preview_url(&self) -> String {
        self.endpoint_url(&self.preview_endpoint)
    }

    /// Full URL of the serve-image endpoint.
    pub fn serve_url(&self) -> String {
        self.endpoint_url(&self.serve_endpoint)
    }

    fn endpoint_url(&self, route: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let route = route.trim_start_matches('/');
        format!("{base}/{route}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_partial_config() {
        let cfg: PickerConfig = serde_json::from_str(
            r#"{"base_url": "http://10.0.0.2:9000/", "default_sort": "date_asc"}"#,
        )
        .unwrap();
        assert_eq!(cfg.default_sort, SortMethod::DateAsc);
        assert_eq!(cfg.double_click_window(), Duration::from_millis(300));
        assert_eq!(cfg.request_timeout(), None);
        assert_eq!(
            cfg.preview_url(),
            "http://10.0.0.2:9000/ib_custom_nodes/get_image_preview"
        );
    }

    #[test]
    fn builder_sets_timing() {
        let cfg = PickerConfig::default()
            .with_double_click_window(Duration::from_millis(450))
            .with_request_timeout(Some(Duration::from_secs(5)));
        assert_eq!(cfg.double_click_window_ms, 450);
        assert_eq!(cfg.request_timeout(), Some(Duration::from_secs(5)));
    }
}
