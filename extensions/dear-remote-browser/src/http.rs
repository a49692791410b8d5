//! HTTP transport for the three host endpoints.
//!
//! Each submitted request runs as a blocking `ureq` call on its own worker
//! thread; completions come back over a channel and are drained with
//! [`RemoteBackend::poll`]. Requests are never cancelled and may complete in
//! any order, so consumers rely on sequence tags to drop stale answers.

use std::io::Read as _;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::de::DeserializeOwned;

use crate::config::PickerConfig;
use crate::service::{
    ListingResponse, PreviewResponse, RemoteBackend, RemoteRequest, RemoteResponse, ServiceError,
};

#[cfg(feature = "tracing")]
use tracing::{debug, trace};

#[derive(Clone, Debug)]
struct Endpoints {
    browse: String,
    preview: String,
    serve: String,
}

/// [`RemoteBackend`] talking to the host editor over HTTP.
pub struct HttpBackend {
    agent: ureq::Agent,
    endpoints: Endpoints,
    tx: Sender<RemoteResponse>,
    rx: Receiver<RemoteResponse>,
}

impl std::fmt::Debug for HttpBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBackend")
            .field("endpoints", &self.endpoints)
            .finish_non_exhaustive()
    }
}

impl HttpBackend {
    /// Creates a backend for the endpoints in `config`.
    pub fn new(config: &PickerConfig) -> Self {
        let agent_config = ureq::Agent::config_builder()
            .timeout_global(config.request_timeout())
            .http_status_as_error(false)
            .build();
        let (tx, rx) = mpsc::channel();
        Self {
            agent: ureq::Agent::new_with_config(agent_config),
            endpoints: Endpoints {
                browse: config.browse_url(),
                preview: config.preview_url(),
                serve: config.serve_url(),
            },
            tx,
            rx,
        }
    }

    /// Waits up to `timeout` for the next finished response.
    pub fn poll_timeout(&mut self, timeout: Duration) -> Option<RemoteResponse> {
        match self.rx.recv_timeout(timeout) {
            Ok(response) => Some(response),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }
}

impl RemoteBackend for HttpBackend {
    fn submit(&mut self, request: RemoteRequest) {
        let agent = self.agent.clone();
        let endpoints = self.endpoints.clone();
        let tx = self.tx.clone();
        std::thread::spawn(move || {
            let response = execute(&agent, &endpoints, request);
            // The receiver is gone once the backend is dropped.
            let _ = tx.send(response);
        });
    }

    fn poll(&mut self) -> Option<RemoteResponse> {
        self.rx.try_recv().ok()
    }
}

fn execute(agent: &ureq::Agent, endpoints: &Endpoints, request: RemoteRequest) -> RemoteResponse {
    match request {
        RemoteRequest::ListDirectory { seq, request } => {
            trace_request(seq, &endpoints.browse, &request.path);
            let sort = request.sort.as_wire();
            let result = fetch(
                agent,
                &endpoints.browse,
                &[("path", request.path.as_str()), ("sort", sort)],
            )
            .and_then(|(status, body)| parse_json::<ListingResponse>(status, &body))
            .and_then(ListingResponse::into_listing);
            trace_completed(seq, result.as_ref().err());
            RemoteResponse::Listing { seq, result }
        }
        RemoteRequest::Preview { seq, path } => {
            trace_request(seq, &endpoints.preview, &path);
            let result = fetch(agent, &endpoints.preview, &[("path", path.as_str())])
                .and_then(|(status, body)| parse_json::<PreviewResponse>(status, &body))
                .and_then(PreviewResponse::into_result);
            trace_completed(seq, result.as_ref().err());
            RemoteResponse::Preview { seq, result }
        }
        RemoteRequest::ServeImage {
            seq,
            path,
            filename,
        } => {
            trace_request(seq, &endpoints.serve, &path);
            let stamp = cache_buster();
            let result = fetch(
                agent,
                &endpoints.serve,
                &[
                    ("path", path.as_str()),
                    ("filename", filename.as_str()),
                    ("t", stamp.as_str()),
                ],
            )
            .and_then(|(status, body)| {
                if (200..300).contains(&status) {
                    Ok(body)
                } else {
                    Err(ServiceError::Status(status))
                }
            });
            trace_completed(seq, result.as_ref().err());
            RemoteResponse::Image { seq, result }
        }
    }
}

fn fetch(
    agent: &ureq::Agent,
    url: &str,
    query: &[(&str, &str)],
) -> Result<(u16, Vec<u8>), ServiceError> {
    let mut req = agent.get(url);
    for (key, value) in query {
        req = req.query(*key, *value);
    }
    let resp = req
        .call()
        .map_err(|e| ServiceError::Transport(format!("http get: {e}")))?;
    let status = resp.status().as_u16();
    let mut reader = resp.into_body().into_reader();
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|e| ServiceError::Transport(format!("read body: {e}")))?;
    Ok((status, bytes))
}

/// Parses a JSON body; a non-success status with an unparseable body
/// reports the status instead.
fn parse_json<T: DeserializeOwned>(status: u16, body: &[u8]) -> Result<T, ServiceError> {
    match serde_json::from_slice(body) {
        Ok(value) => Ok(value),
        Err(_) if !(200..300).contains(&status) => Err(ServiceError::Status(status)),
        Err(e) => Err(ServiceError::Decode(e.to_string())),
    }
}

fn cache_buster() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
        .to_string()
}

#[cfg(feature = "tracing")]
fn trace_request(seq: u64, url: &str, path: &str) {
    trace!(event = "http.request", seq, url, path, "remote request started");
}

#[cfg(not(feature = "tracing"))]
fn trace_request(_seq: u64, _url: &str, _path: &str) {}

#[cfg(feature = "tracing")]
fn trace_completed(seq: u64, error: Option<&ServiceError>) {
    match error {
        Some(error) => debug!(event = "http.failed", seq, %error, "remote request failed"),
        None => trace!(event = "http.completed", seq, "remote request completed"),
    }
}

#[cfg(not(feature = "tracing"))]
fn trace_completed(_seq: u64, _error: Option<&ServiceError>) {}
