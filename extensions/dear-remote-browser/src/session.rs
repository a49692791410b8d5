use std::collections::VecDeque;
use std::collections::hash_map::DefaultHasher;
use std::hash::Hasher;
use std::time::Instant;

use indexmap::IndexMap;

use crate::click::{ClickOutcome, ClickTracker};
use crate::config::PickerConfig;
use crate::core::{LastPath, PickerError, PickerOutcome, SortMethod};
use crate::path::join_child;
use crate::preview::{Preview, PreviewState};
use crate::service::{
    DirectoryListing, ListRequest, PreviewResult, RemoteRequest, RemoteResponse, RequestSeq,
    ServiceError,
};

#[cfg(feature = "tracing")]
use tracing::trace;

/// Stable identifier for a listed entry, derived from its absolute path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EntryId(u64);

impl EntryId {
    /// Build an entry id from a server path.
    pub fn from_path(path: &str) -> Self {
        let mut hasher = DefaultHasher::new();
        hasher.write(path.as_bytes());
        Self(hasher.finish())
    }
}

/// Kind of a listed entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    /// A directory: clicking it navigates.
    Directory,
    /// A file: clicking it selects, double-clicking commits.
    File,
}

impl EntryKind {
    /// Icon glyph shown before the name.
    ///
    /// Needs a font with emoji glyphs merged into the atlas.
    pub fn icon(self) -> &'static str {
        match self {
            EntryKind::Directory => "\u{1F4C1}",
            EntryKind::File => "\u{1F5BC}",
        }
    }
}

/// One row of a listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListedEntry {
    /// Identity of the row.
    pub id: EntryId,
    /// Name as returned by the server.
    pub name: String,
    /// Absolute path resolved against the listed directory.
    pub path: String,
    /// Directory or file.
    pub kind: EntryKind,
}

impl ListedEntry {
    fn new(dir: &str, name: String, kind: EntryKind) -> Self {
        let path = join_child(dir, &name);
        Self {
            id: EntryId::from_path(&path),
            name,
            path,
            kind,
        }
    }

    /// Whether this entry is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// A rendered listing: directories first, then files, each in server order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListingView {
    /// Server-normalized directory path.
    pub current_path: String,
    /// Parent directory reported with this listing.
    pub parent_path: Option<String>,
    entries: IndexMap<EntryId, ListedEntry>,
}

impl ListingView {
    fn from_listing(listing: DirectoryListing) -> Self {
        let DirectoryListing {
            current_path,
            parent_path,
            directories,
            files,
            ..
        } = listing;
        let entries = directories
            .into_iter()
            .map(|name| ListedEntry::new(&current_path, name, EntryKind::Directory))
            .chain(
                files
                    .into_iter()
                    .map(|name| ListedEntry::new(&current_path, name, EntryKind::File)),
            )
            .map(|entry| (entry.id, entry))
            .collect();
        Self {
            current_path,
            parent_path,
            entries,
        }
    }

    /// All entries in display order.
    pub fn entries(&self) -> impl Iterator<Item = &ListedEntry> {
        self.entries.values()
    }

    /// Directory entries in server order.
    pub fn directories(&self) -> impl Iterator<Item = &ListedEntry> {
        self.entries().filter(|e| e.is_dir())
    }

    /// File entries in server order.
    pub fn files(&self) -> impl Iterator<Item = &ListedEntry> {
        self.entries().filter(|e| !e.is_dir())
    }

    /// Looks up an entry.
    pub fn get(&self, id: EntryId) -> Option<&ListedEntry> {
        self.entries.get(&id)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the directory is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Listing area state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ListingState {
    /// Waiting for the listing service.
    Loading {
        /// Requested path.
        path: String,
    },
    /// Listing available.
    Ready(ListingView),
    /// The listing call failed; navigating again retries.
    Failed {
        /// Requested path.
        path: String,
        /// Failure.
        error: ServiceError,
    },
}

impl ListingState {
    /// The ready listing, if any.
    pub fn view(&self) -> Option<&ListingView> {
        match self {
            ListingState::Ready(view) => Some(view),
            _ => None,
        }
    }

    /// Whether a listing request is outstanding.
    pub fn is_loading(&self) -> bool {
        matches!(self, ListingState::Loading { .. })
    }

    /// Inline message replacing the listing on failure.
    pub fn error_message(&self) -> Option<String> {
        match self {
            ListingState::Failed {
                error: ServiceError::Server(msg),
                ..
            } => Some(format!("Error: {msg}")),
            ListingState::Failed { error, .. } => Some(format!("Error loading directory: {error}")),
            _ => None,
        }
    }
}

/// Input event for driving a [`BrowseSession`] without UI coupling.
#[derive(Clone, Debug)]
pub enum PickerEvent {
    /// Click on a listed entry.
    ClickEntry {
        /// Clicked entry.
        id: EntryId,
        /// Time of the click.
        at: Instant,
    },
    /// Pick another sort method.
    SetSort(SortMethod),
    /// Navigate to the parent directory.
    GoUp,
    /// Navigate to the path currently typed in the path field.
    SubmitPathInput,
    /// Navigate to a typed path.
    GoToPath(String),
    /// Commit the selected file.
    Commit,
    /// Dismiss the dialog (cancel button, close button or escape).
    Cancel,
}

/// Live state of one open picker.
///
/// The session is a pure state machine: it queues [`RemoteRequest`]s, which
/// the host drains with [`take_requests`](Self::take_requests), and consumes
/// [`RemoteResponse`]s fed back through
/// [`apply_response`](Self::apply_response). Every request carries a fresh
/// sequence number and only the latest listing and latest preview are
/// applied; late answers to superseded requests are dropped.
#[derive(Debug)]
pub struct BrowseSession {
    current_path: String,
    selected_file: Option<String>,
    sort_method: SortMethod,
    /// Buffer of the editable path field.
    pub path_input: String,
    parent_path: Option<String>,
    listing: ListingState,
    preview: PreviewState,
    clicks: ClickTracker<EntryId>,

    next_seq: RequestSeq,
    listing_seq: Option<RequestSeq>,
    preview_seq: Option<RequestSeq>,
    outbox: VecDeque<RemoteRequest>,

    last_path: LastPath,
    closed: bool,
    outcome: Option<PickerOutcome>,
}

impl BrowseSession {
    /// Opens a session and starts listing `initial_path`.
    ///
    /// An empty `initial_path` falls back to `last_path`.
    pub fn open(initial_path: &str, last_path: LastPath, config: &PickerConfig) -> Self {
        let start = if initial_path.trim().is_empty() {
            last_path.as_str().to_owned()
        } else {
            initial_path.to_owned()
        };
        let mut session = Self {
            current_path: String::new(),
            selected_file: None,
            sort_method: config.default_sort,
            path_input: start.clone(),
            parent_path: None,
            listing: ListingState::Loading {
                path: start.clone(),
            },
            preview: PreviewState::Empty,
            clicks: ClickTracker::new(config.double_click_window()),
            next_seq: 0,
            listing_seq: None,
            preview_seq: None,
            outbox: VecDeque::new(),
            last_path,
            closed: false,
            outcome: None,
        };
        session.navigate(start);
        session
    }

    /// Path currently listed (as requested, not server-normalized).
    pub fn current_path(&self) -> &str {
        &self.current_path
    }

    /// Selected file, if any.
    pub fn selected_file(&self) -> Option<&str> {
        self.selected_file.as_deref()
    }

    /// Active sort method.
    pub fn sort_method(&self) -> SortMethod {
        self.sort_method
    }

    /// Listing area state.
    pub fn listing(&self) -> &ListingState {
        &self.listing
    }

    /// Preview area state.
    pub fn preview(&self) -> &PreviewState {
        &self.preview
    }

    /// Parent reported by the last successful listing.
    pub fn parent_path(&self) -> Option<&str> {
        self.parent_path.as_deref()
    }

    /// Whether the up control is enabled.
    pub fn can_go_up(&self) -> bool {
        !self.closed && self.parent_path.is_some()
    }

    /// Whether the commit action is enabled.
    pub fn can_commit(&self) -> bool {
        !self.closed && self.selected_file.is_some()
    }

    /// Whether the session ended.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Directory memory handed in at open time (until the session closes).
    pub fn last_path(&self) -> &LastPath {
        &self.last_path
    }

    /// Whether `entry` is the selected file.
    pub fn is_selected(&self, entry: &ListedEntry) -> bool {
        self.selected_file.as_deref() == Some(entry.path.as_str())
    }

    /// Whether `id` waits for a possible second click.
    pub fn is_click_pending(&self, id: EntryId) -> bool {
        self.clicks.is_pending(id)
    }

    /// Earliest instant at which [`tick`](Self::tick) has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.clicks.next_deadline()
    }

    /// Looks up an entry of the current listing.
    pub fn entry(&self, id: EntryId) -> Option<&ListedEntry> {
        self.listing.view().and_then(|v| v.get(id))
    }

    /// Drains queued requests for the backend.
    pub fn take_requests(&mut self) -> Vec<RemoteRequest> {
        self.outbox.drain(..).collect()
    }

    /// Returns the outcome once the session has closed, and clears it.
    pub fn take_outcome(&mut self) -> Option<PickerOutcome> {
        self.outcome.take()
    }

    /// Apply one event.
    pub fn handle_event(&mut self, event: PickerEvent) -> Result<(), PickerError> {
        self.ensure_open()?;
        match event {
            PickerEvent::ClickEntry { id, at } => self.click_entry(id, at),
            PickerEvent::SetSort(method) => self.change_sort_method(method),
            PickerEvent::GoUp => {
                self.go_up();
                Ok(())
            }
            PickerEvent::SubmitPathInput => {
                let input = self.path_input.clone();
                self.go_to_typed_path(&input);
                Ok(())
            }
            PickerEvent::GoToPath(path) => {
                self.go_to_typed_path(&path);
                Ok(())
            }
            PickerEvent::Commit => self.commit(),
            PickerEvent::Cancel => {
                self.cancel();
                Ok(())
            }
        }
    }

    /// Lists `path`, clearing the selection and the preview.
    ///
    /// Any listing still in flight is superseded.
    pub fn navigate(&mut self, path: impl Into<String>) {
        if self.closed {
            return;
        }
        let path = path.into();
        self.current_path = path.clone();
        self.selected_file = None;
        self.preview = PreviewState::Empty;
        self.preview_seq = None;
        self.clicks.clear();
        self.listing = ListingState::Loading { path: path.clone() };

        let seq = self.alloc_seq();
        self.listing_seq = Some(seq);
        let request = ListRequest {
            path,
            sort: self.sort_method,
        };
        trace_listing_requested(seq, &request);
        self.outbox
            .push_back(RemoteRequest::ListDirectory { seq, request });
    }

    /// Selects `path` as the file to commit and requests its preview.
    pub fn select_file(&mut self, path: impl Into<String>) -> Result<(), PickerError> {
        self.ensure_open()?;
        let path = path.into();
        self.selected_file = Some(path.clone());
        self.preview = PreviewState::Loading { path: path.clone() };

        let seq = self.alloc_seq();
        self.preview_seq = Some(seq);
        trace_preview_requested(seq, &path);
        self.outbox.push_back(RemoteRequest::Preview { seq, path });
        Ok(())
    }

    /// Activates an entry: directories are navigated, files selected.
    pub fn activate_entry(&mut self, id: EntryId) -> Result<(), PickerError> {
        self.ensure_open()?;
        let Some(entry) = self.entry(id).cloned() else {
            return Ok(());
        };
        match entry.kind {
            EntryKind::Directory => {
                self.navigate(entry.path);
                Ok(())
            }
            EntryKind::File => self.select_file(entry.path),
        }
    }

    /// Handles a click on an entry row.
    ///
    /// Directories navigate at once. Files go through click disambiguation:
    /// a lone click selects once the window elapses (see [`tick`](Self::tick)),
    /// a second click inside the window commits the file directly.
    pub fn click_entry(&mut self, id: EntryId, at: Instant) -> Result<(), PickerError> {
        self.ensure_open()?;
        self.tick(at)?;
        let Some(entry) = self.entry(id).cloned() else {
            return Ok(());
        };
        match entry.kind {
            EntryKind::Directory => {
                self.navigate(entry.path);
                Ok(())
            }
            EntryKind::File => match self.clicks.click(id, at) {
                ClickOutcome::Pending => Ok(()),
                ClickOutcome::Double => {
                    self.selected_file = Some(entry.path.clone());
                    self.commit_path(entry.path);
                    Ok(())
                }
            },
        }
    }

    /// Fires single clicks whose disambiguation window elapsed.
    pub fn tick(&mut self, now: Instant) -> Result<(), PickerError> {
        self.ensure_open()?;
        for id in self.clicks.expire(now) {
            let Some(entry) = self.entry(id).cloned() else {
                continue;
            };
            if !entry.is_dir() {
                self.select_file(entry.path)?;
            }
        }
        Ok(())
    }

    /// Commits the selected file and closes the session.
    pub fn commit(&mut self) -> Result<(), PickerError> {
        self.ensure_open()?;
        let path = self.selected_file.clone().ok_or(PickerError::NoSelection)?;
        self.commit_path(path);
        Ok(())
    }

    /// Closes the session without a selection.
    pub fn cancel(&mut self) {
        let last_path = std::mem::take(&mut self.last_path);
        self.close(PickerOutcome::Cancelled { last_path });
    }

    /// Switches the sort method and relists the current path.
    pub fn change_sort_method(&mut self, method: SortMethod) -> Result<(), PickerError> {
        self.ensure_open()?;
        self.sort_method = method;
        let path = self.current_path.clone();
        self.navigate(path);
        Ok(())
    }

    /// Navigates to the parent of the last successful listing.
    ///
    /// Returns `false` (and does nothing) at a root.
    pub fn go_up(&mut self) -> bool {
        if !self.can_go_up() {
            return false;
        }
        match self.parent_path.clone() {
            Some(parent) => {
                self.navigate(parent);
                true
            }
            None => false,
        }
    }

    /// Navigates to a typed path after trimming it; empty input is ignored.
    ///
    /// The path is not validated: the server decides whether it exists.
    pub fn go_to_typed_path(&mut self, input: &str) -> bool {
        let path = input.trim();
        if path.is_empty() || self.closed {
            return false;
        }
        self.navigate(path.to_owned());
        true
    }

    /// Applies a backend response.
    ///
    /// Returns `true` if the response was current and changed the session.
    pub fn apply_response(&mut self, response: RemoteResponse) -> bool {
        if self.closed {
            return false;
        }
        match response {
            RemoteResponse::Listing { seq, result } => self.apply_listing(seq, result),
            RemoteResponse::Preview { seq, result } => self.apply_preview(seq, result),
            RemoteResponse::Image { .. } => false,
        }
    }

    fn apply_listing(
        &mut self,
        seq: RequestSeq,
        result: Result<DirectoryListing, ServiceError>,
    ) -> bool {
        if self.listing_seq != Some(seq) {
            trace_dropped_stale(seq, self.listing_seq, "listing");
            return false;
        }
        self.listing_seq = None;

        match result {
            Ok(listing) => {
                if let Some(echoed) = listing.sort_method.as_deref() {
                    match echoed.parse::<SortMethod>() {
                        Ok(method) => self.sort_method = method,
                        Err(_err) => trace_unknown_sort(echoed),
                    }
                }
                self.parent_path = listing.parent_path.clone();
                self.path_input = listing.current_path.clone();
                let view = ListingView::from_listing(listing);
                trace_listing_applied(seq, view.len());
                self.listing = ListingState::Ready(view);
            }
            Err(error) => {
                trace_listing_failed(seq, &error);
                self.listing = ListingState::Failed {
                    path: self.current_path.clone(),
                    error,
                };
            }
        }
        true
    }

    fn apply_preview(
        &mut self,
        seq: RequestSeq,
        result: Result<PreviewResult, ServiceError>,
    ) -> bool {
        if self.preview_seq != Some(seq) {
            trace_dropped_stale(seq, self.preview_seq, "preview");
            return false;
        }
        self.preview_seq = None;
        let path = self.preview.path().unwrap_or_default().to_owned();
        self.preview = match result {
            Ok(res) => PreviewState::Ready(Preview::new(&path, res)),
            Err(error) => PreviewState::Failed { path, error },
        };
        true
    }

    fn commit_path(&mut self, path: String) {
        let mut last_path = std::mem::take(&mut self.last_path);
        last_path.remember_file(&path);
        self.close(PickerOutcome::Selected { path, last_path });
    }

    /// Single teardown path for every way out of the dialog.
    fn close(&mut self, outcome: PickerOutcome) {
        if self.closed {
            return;
        }
        trace_closed(&outcome);
        self.closed = true;
        self.clicks.clear();
        self.outbox.clear();
        self.listing_seq = None;
        self.preview_seq = None;
        self.outcome = Some(outcome);
    }

    fn ensure_open(&self) -> Result<(), PickerError> {
        if self.closed {
            Err(PickerError::Closed)
        } else {
            Ok(())
        }
    }

    fn alloc_seq(&mut self) -> RequestSeq {
        self.next_seq = self.next_seq.wrapping_add(1);
        self.next_seq
    }
}

#[cfg(feature = "tracing")]
fn trace_listing_requested(seq: RequestSeq, request: &ListRequest) {
    trace!(
        event = "listing.requested",
        seq,
        path = %request.path,
        sort = %request.sort,
        "listing requested"
    );
}

#[cfg(not(feature = "tracing"))]
fn trace_listing_requested(_seq: RequestSeq, _request: &ListRequest) {}

#[cfg(feature = "tracing")]
fn trace_listing_applied(seq: RequestSeq, entries: usize) {
    trace!(event = "listing.applied", seq, entries, "listing applied");
}

#[cfg(not(feature = "tracing"))]
fn trace_listing_applied(_seq: RequestSeq, _entries: usize) {}

#[cfg(feature = "tracing")]
fn trace_listing_failed(seq: RequestSeq, error: &ServiceError) {
    trace!(event = "listing.failed", seq, %error, "listing failed");
}

#[cfg(not(feature = "tracing"))]
fn trace_listing_failed(_seq: RequestSeq, _error: &ServiceError) {}

#[cfg(feature = "tracing")]
fn trace_preview_requested(seq: RequestSeq, path: &str) {
    trace!(event = "preview.requested", seq, path, "preview requested");
}

#[cfg(not(feature = "tracing"))]
fn trace_preview_requested(_seq: RequestSeq, _path: &str) {}

#[cfg(feature = "tracing")]
fn trace_dropped_stale(seq: RequestSeq, latest: Option<RequestSeq>, kind: &'static str) {
    trace!(
        event = "response.dropped_stale",
        seq,
        ?latest,
        kind,
        "dropped stale response"
    );
}

#[cfg(not(feature = "tracing"))]
fn trace_dropped_stale(_seq: RequestSeq, _latest: Option<RequestSeq>, _kind: &'static str) {}

#[cfg(feature = "tracing")]
fn trace_unknown_sort(echoed: &str) {
    trace!(event = "listing.unknown_sort", echoed, "ignored unknown sort method");
}

#[cfg(not(feature = "tracing"))]
fn trace_unknown_sort(_echoed: &str) {}

#[cfg(feature = "tracing")]
fn trace_closed(outcome: &PickerOutcome) {
    trace!(
        event = "picker.closed",
        selected = outcome.selected_path().unwrap_or(""),
        "picker closed"
    );
}

#[cfg(not(feature = "tracing"))]
fn trace_closed(_outcome: &PickerOutcome) {}
