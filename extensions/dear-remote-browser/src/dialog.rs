use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};
use std::time::Instant;

use parking_lot::Mutex;

use crate::config::PickerConfig;
use crate::core::{LastPath, PickerError, PickerOutcome};
use crate::service::{RemoteBackend, RemoteResponse};
use crate::session::{BrowseSession, PickerEvent};

type SelectCallback = Box<dyn FnOnce(&str)>;

#[derive(Debug, Default)]
struct ClosedSlot {
    outcome: Option<PickerOutcome>,
    wakers: Vec<Waker>,
}

/// An open picker bound to a transport.
///
/// `PickerDialog` owns a [`BrowseSession`] and moves requests and responses
/// between it and a [`RemoteBackend`]. Call [`pump`](Self::pump) once per
/// frame. When the session closes with a selection, the `on_select` callback
/// runs exactly once with the chosen path; a cancelled dialog never calls it.
///
/// The transport may be shared with other consumers (an [`ImagePathNode`]
/// loading the picked file, say). Responses the session has no use for are
/// kept for [`take_unhandled`](Self::take_unhandled).
///
/// [`ImagePathNode`]: crate::ImagePathNode
pub struct PickerDialog {
    session: BrowseSession,
    backend: Box<dyn RemoteBackend>,
    on_select: Option<SelectCallback>,
    outcome: Option<PickerOutcome>,
    closed: Arc<Mutex<ClosedSlot>>,
    unhandled: VecDeque<RemoteResponse>,
    #[cfg(feature = "imgui")]
    presented: bool,
}

impl std::fmt::Debug for PickerDialog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PickerDialog")
            .field("session", &self.session)
            .field("has_on_select", &self.on_select.is_some())
            .field("outcome", &self.outcome)
            .field("unhandled", &self.unhandled.len())
            .finish_non_exhaustive()
    }
}

impl PickerDialog {
    /// Opens a picker at `initial_path` (or `last_path` when empty) and
    /// submits the first listing request.
    pub fn open(
        initial_path: &str,
        last_path: LastPath,
        config: &PickerConfig,
        backend: impl RemoteBackend + 'static,
    ) -> Self {
        let mut dialog = Self {
            session: BrowseSession::open(initial_path, last_path, config),
            backend: Box::new(backend),
            on_select: None,
            outcome: None,
            closed: Arc::new(Mutex::new(ClosedSlot::default())),
            unhandled: VecDeque::new(),
            #[cfg(feature = "imgui")]
            presented: false,
        };
        dialog.flush();
        dialog
    }

    /// Sets the callback receiving the committed path.
    pub fn on_select(mut self, callback: impl FnOnce(&str) + 'static) -> Self {
        self.on_select = Some(Box::new(callback));
        self
    }

    /// Read access to the session.
    pub fn session(&self) -> &BrowseSession {
        &self.session
    }

    /// Mutable access to the session (path field buffer, direct operations).
    ///
    /// Call [`pump`](Self::pump) afterwards so queued requests are submitted.
    pub fn session_mut(&mut self) -> &mut BrowseSession {
        &mut self.session
    }

    /// Transport in use.
    pub fn backend_mut(&mut self) -> &mut dyn RemoteBackend {
        self.backend.as_mut()
    }

    /// Applies an event and submits whatever it queued.
    pub fn handle_event(&mut self, event: PickerEvent) -> Result<(), PickerError> {
        let res = self.session.handle_event(event);
        self.flush();
        res
    }

    /// Drains finished responses, fires elapsed single clicks and submits
    /// new requests.
    ///
    /// Returns the outcome on the frame the dialog closes.
    pub fn pump(&mut self, now: Instant) -> Option<&PickerOutcome> {
        if !self.session.is_closed() {
            while let Some(response) = self.backend.poll() {
                match response {
                    image @ RemoteResponse::Image { .. } => self.unhandled.push_back(image),
                    other => {
                        self.session.apply_response(other);
                    }
                }
            }
            // Only fails once closed.
            let _ = self.session.tick(now);
        }
        if self.flush() {
            self.outcome.as_ref()
        } else {
            None
        }
    }

    /// Whether the dialog has closed.
    pub fn is_closed(&self) -> bool {
        self.session.is_closed()
    }

    /// Outcome of a closed dialog.
    pub fn outcome(&self) -> Option<&PickerOutcome> {
        self.outcome.as_ref()
    }

    /// Takes the outcome of a closed dialog.
    pub fn take_outcome(&mut self) -> Option<PickerOutcome> {
        self.outcome.take()
    }

    /// Takes the responses drained by [`pump`](Self::pump) that belong to
    /// other consumers of the transport, oldest first.
    pub fn take_unhandled(&mut self) -> Vec<RemoteResponse> {
        self.unhandled.drain(..).collect()
    }

    /// Marks the dialog as shown; `true` only on the first call.
    #[cfg(feature = "imgui")]
    pub(crate) fn mark_presented(&mut self) -> bool {
        !std::mem::replace(&mut self.presented, true)
    }

    /// Future resolving with the outcome once the dialog closes.
    ///
    /// The future does not drive the dialog; keep calling
    /// [`pump`](Self::pump) from the UI loop.
    pub fn wait_closed(&self) -> ClosedFuture {
        ClosedFuture {
            slot: Arc::clone(&self.closed),
        }
    }

    /// Submits queued requests and settles a freshly closed session.
    ///
    /// Returns `true` if the session closed during this call.
    fn flush(&mut self) -> bool {
        for request in self.session.take_requests() {
            self.backend.submit(request);
        }
        let Some(outcome) = self.session.take_outcome() else {
            return false;
        };
        if let (Some(path), Some(callback)) = (outcome.selected_path(), self.on_select.take()) {
            callback(path);
        }
        self.on_select = None;

        let wakers = {
            let mut slot = self.closed.lock();
            slot.outcome = Some(outcome.clone());
            std::mem::take(&mut slot.wakers)
        };
        for waker in wakers {
            waker.wake();
        }
        self.outcome = Some(outcome);
        true
    }
}

/// Future returned by [`PickerDialog::wait_closed`].
#[derive(Debug, Clone)]
pub struct ClosedFuture {
    slot: Arc<Mutex<ClosedSlot>>,
}

impl Future for ClosedFuture {
    type Output = PickerOutcome;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut slot = self.slot.lock();
        match &slot.outcome {
            Some(outcome) => Poll::Ready(outcome.clone()),
            None => {
                if !slot.wakers.iter().any(|w| w.will_wake(cx.waker())) {
                    slot.wakers.push(cx.waker().clone());
                }
                Poll::Pending
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::ImagePathNode;
    use crate::service::{DirectoryListing, QueueBackend, RemoteRequest, ServiceError};
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    /// Backend handle shared between the test and the dialog.
    #[derive(Clone, Default)]
    struct Shared(Rc<RefCell<QueueBackend>>);

    impl RemoteBackend for Shared {
        fn submit(&mut self, request: RemoteRequest) {
            self.0.borrow_mut().submit(request);
        }
        fn poll(&mut self) -> Option<RemoteResponse> {
            self.0.borrow_mut().poll()
        }
    }

    fn listing(files: &[&str]) -> DirectoryListing {
        DirectoryListing {
            current_path: "/in".into(),
            parent_path: Some("/".into()),
            files: files.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    fn open_on(backend: impl RemoteBackend + 'static, last_path: LastPath) -> PickerDialog {
        PickerDialog::open("/in", last_path, &PickerConfig::default(), backend)
    }

    #[test]
    fn open_submits_listing_request() {
        let backend = Shared::default();
        let _dialog = open_on(backend.clone(), LastPath::new());
        assert_eq!(backend.0.borrow().submitted().len(), 1);
    }

    #[test]
    fn on_select_runs_once_with_committed_path() {
        let backend = Shared::default();
        let hits = Rc::new(RefCell::new(Vec::<String>::new()));
        let sink = Rc::clone(&hits);
        let mut dialog = open_on(backend.clone(), LastPath::new())
            .on_select(move |p| sink.borrow_mut().push(p.to_owned()));

        let seq = backend.0.borrow_mut().take_submitted()[0].seq();
        backend.0.borrow_mut().respond(RemoteResponse::Listing {
            seq,
            result: Ok(listing(&["a.png"])),
        });
        let t0 = Instant::now();
        assert!(dialog.pump(t0).is_none());

        let id = dialog.session().listing().view().unwrap().files().next().unwrap().id;
        dialog.handle_event(PickerEvent::ClickEntry { id, at: t0 }).unwrap();
        dialog
            .handle_event(PickerEvent::ClickEntry {
                id,
                at: t0 + Duration::from_millis(100),
            })
            .unwrap();

        assert!(dialog.is_closed());
        assert_eq!(hits.borrow().as_slice(), ["/in/a.png"]);
        assert!(dialog.handle_event(PickerEvent::Cancel).is_err());
        assert_eq!(hits.borrow().len(), 1);
        assert_eq!(dialog.outcome().and_then(|o| o.selected_path()), Some("/in/a.png"));
    }

    #[test]
    fn cancel_never_calls_on_select() {
        let called = Rc::new(RefCell::new(false));
        let flag = Rc::clone(&called);
        let mut dialog = open_on(QueueBackend::new(), LastPath::from("/in"))
            .on_select(move |_| *flag.borrow_mut() = true);
        dialog.handle_event(PickerEvent::Cancel).unwrap();
        assert!(!*called.borrow());
        assert_eq!(
            dialog.take_outcome(),
            Some(PickerOutcome::Cancelled {
                last_path: LastPath::from("/in")
            })
        );
    }

    #[test]
    fn wait_closed_resolves_from_another_thread() {
        let mut dialog = open_on(QueueBackend::new(), LastPath::new());
        let fut = dialog.wait_closed();
        let waiter = std::thread::spawn(move || pollster::block_on(fut));
        std::thread::sleep(Duration::from_millis(20));
        dialog.handle_event(PickerEvent::Cancel).unwrap();
        let outcome = waiter.join().unwrap();
        assert_eq!(outcome.selected_path(), None);
    }

    #[test]
    fn wait_closed_after_close_is_ready() {
        let mut dialog = open_on(QueueBackend::new(), LastPath::new());
        dialog.session_mut().cancel();
        dialog.pump(Instant::now());
        assert!(dialog.is_closed());
        let outcome = pollster::block_on(dialog.wait_closed());
        assert!(matches!(outcome, PickerOutcome::Cancelled { .. }));
    }

    #[test]
    fn image_responses_on_shared_transport_are_kept() {
        let backend = Shared::default();
        let mut node = ImagePathNode::new();
        let load = node.set_path("/in/a.png");
        let image_seq = load.seq();
        backend.0.borrow_mut().submit(load);

        let mut dialog = open_on(backend.clone(), LastPath::new());
        let list_seq = backend.0.borrow().submitted()[1].seq();
        {
            let mut queue = backend.0.borrow_mut();
            queue.respond(RemoteResponse::Image {
                seq: image_seq,
                result: Err(ServiceError::Status(404)),
            });
            queue.respond(RemoteResponse::Listing {
                seq: list_seq,
                result: Ok(listing(&["a.png"])),
            });
        }
        assert!(dialog.pump(Instant::now()).is_none());

        assert!(dialog.session().listing().view().is_some());
        assert!(dialog.backend_mut().poll().is_none());
        let leftovers = dialog.take_unhandled();
        assert_eq!(leftovers.len(), 1);
        assert!(dialog.take_unhandled().is_empty());

        assert!(node.is_loading());
        for response in leftovers {
            assert!(node.apply_response(response));
        }
        assert!(!node.is_loading());
        assert!(node.images().is_none());
    }
}
