use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use dear_remote_browser::{
    DirectoryListing, ImagePathNode, LastPath, PickerConfig, PickerDialog, PickerEvent,
    PickerOutcome, PreviewResult, PreviewState, QueueBackend, RemoteBackend, RemoteRequest,
    RemoteResponse, ServiceError, SortMethod,
};

/// Backend shared between the test and the dialog under test.
#[derive(Clone, Default)]
struct Scripted(Rc<RefCell<QueueBackend>>);

impl Scripted {
    fn take(&self) -> Vec<RemoteRequest> {
        self.0.borrow_mut().take_submitted()
    }

    fn respond(&self, response: RemoteResponse) {
        self.0.borrow_mut().respond(response);
    }
}

impl RemoteBackend for Scripted {
    fn submit(&mut self, request: RemoteRequest) {
        self.0.borrow_mut().submit(request);
    }

    fn poll(&mut self) -> Option<RemoteResponse> {
        self.0.borrow_mut().poll()
    }
}

fn photos_listing() -> DirectoryListing {
    DirectoryListing {
        current_path: "/photos".into(),
        parent_path: Some("/".into()),
        directories: vec!["2023".into(), "2024".into()],
        files: vec!["a.png".into(), "b.png".into()],
        sort_method: Some("name_asc".into()),
    }
}

fn single_listing_request(reqs: &[RemoteRequest]) -> (u64, String, SortMethod) {
    match reqs {
        [RemoteRequest::ListDirectory { seq, request }] => {
            (*seq, request.path.clone(), request.sort)
        }
        other => panic!("expected one listing request, got {other:?}"),
    }
}

#[test]
fn browse_preview_and_double_click_commit() {
    let backend = Scripted::default();
    let picked = Rc::new(RefCell::new(None::<String>));
    let sink = Rc::clone(&picked);
    let mut dialog = PickerDialog::open(
        "/photos",
        LastPath::new(),
        &PickerConfig::default(),
        backend.clone(),
    )
    .on_select(move |p| *sink.borrow_mut() = Some(p.to_owned()));

    let (seq, path, sort) = single_listing_request(&backend.take());
    assert_eq!((path.as_str(), sort), ("/photos", SortMethod::NameAsc));
    backend.respond(RemoteResponse::Listing {
        seq,
        result: Ok(photos_listing()),
    });
    let t0 = Instant::now();
    dialog.pump(t0);

    let session = dialog.session();
    assert!(session.can_go_up());
    let view = session.listing().view().expect("listing ready");
    let names: Vec<_> = view.entries().map(|e| e.name.clone()).collect();
    assert_eq!(names, ["2023", "2024", "a.png", "b.png"]);
    let dir_2024 = view.directories().nth(1).unwrap().id;
    let file_a = view.files().next().unwrap().id;
    let file_b = view.files().nth(1).unwrap().id;

    // Directory click issues a listing request at once, then comes back.
    dialog
        .handle_event(PickerEvent::ClickEntry { id: dir_2024, at: t0 })
        .unwrap();
    let (_, path, _) = single_listing_request(&backend.take());
    assert_eq!(path, "/photos/2024");
    dialog.handle_event(PickerEvent::GoUp).unwrap();
    let (seq, path, _) = single_listing_request(&backend.take());
    assert_eq!(path, "/");
    // Pretend the user typed the photos path back in.
    dialog.session_mut().path_input = " /photos ".into();
    dialog.handle_event(PickerEvent::SubmitPathInput).unwrap();
    let (latest, path, _) = single_listing_request(&backend.take());
    assert_eq!(path, "/photos");
    backend.respond(RemoteResponse::Listing {
        seq,
        result: Ok(DirectoryListing::default()),
    });
    backend.respond(RemoteResponse::Listing {
        seq: latest,
        result: Ok(photos_listing()),
    });
    dialog.pump(t0);
    assert_eq!(
        dialog.session().listing().view().unwrap().current_path,
        "/photos"
    );

    // Single click on a.png: selected and previewed once the window elapses.
    let t1 = t0 + Duration::from_secs(1);
    dialog
        .handle_event(PickerEvent::ClickEntry { id: file_a, at: t1 })
        .unwrap();
    assert!(backend.take().is_empty());
    dialog.pump(t1 + Duration::from_millis(300));
    let seq = match &backend.take()[..] {
        [RemoteRequest::Preview { seq, path }] => {
            assert_eq!(path, "/photos/a.png");
            *seq
        }
        other => panic!("expected a preview request, got {other:?}"),
    };
    backend.respond(RemoteResponse::Preview {
        seq,
        result: Ok(PreviewResult {
            data_uri: "data:image/png;base64,".into(),
            width: 640,
            height: 480,
        }),
    });
    dialog.pump(t1 + Duration::from_millis(320));
    match dialog.session().preview() {
        PreviewState::Ready(p) => {
            assert_eq!(p.name, "a.png");
            assert_eq!((p.width, p.height), (640, 480));
        }
        other => panic!("unexpected preview {other:?}"),
    }
    assert_eq!(dialog.session().selected_file(), Some("/photos/a.png"));

    // Double click on b.png commits without previewing it.
    let t2 = t1 + Duration::from_secs(1);
    dialog
        .handle_event(PickerEvent::ClickEntry { id: file_b, at: t2 })
        .unwrap();
    dialog
        .handle_event(PickerEvent::ClickEntry {
            id: file_b,
            at: t2 + Duration::from_millis(120),
        })
        .unwrap();
    assert!(backend.take().is_empty());
    assert!(dialog.is_closed());
    assert_eq!(picked.borrow().as_deref(), Some("/photos/b.png"));
    assert_eq!(
        dialog.take_outcome(),
        Some(PickerOutcome::Selected {
            path: "/photos/b.png".into(),
            last_path: LastPath::from("/photos"),
        })
    );
}

#[test]
fn last_path_carries_into_next_session() {
    let backend = Scripted::default();
    let mut dialog = PickerDialog::open(
        r"C:\images",
        LastPath::new(),
        &PickerConfig::default(),
        backend.clone(),
    );
    let (seq, _, _) = single_listing_request(&backend.take());
    backend.respond(RemoteResponse::Listing {
        seq,
        result: Ok(DirectoryListing {
            current_path: r"C:\images".into(),
            files: vec!["x.png".into()],
            ..Default::default()
        }),
    });
    dialog.pump(Instant::now());
    dialog.session_mut().select_file(r"C:\images\x.png").unwrap();
    dialog.handle_event(PickerEvent::Commit).unwrap();
    let memory = dialog.take_outcome().unwrap().into_last_path();
    assert_eq!(memory.as_str(), r"C:\images");

    let next = Scripted::default();
    let _dialog = PickerDialog::open("", memory, &PickerConfig::default(), next.clone());
    let (_, path, _) = single_listing_request(&next.take());
    assert_eq!(path, r"C:\images");
}

#[test]
fn listing_error_then_retry() {
    let backend = Scripted::default();
    let mut dialog = PickerDialog::open(
        "/nope",
        LastPath::new(),
        &PickerConfig::default().with_default_sort(SortMethod::DateDesc),
        backend.clone(),
    );
    let (seq, _, sort) = single_listing_request(&backend.take());
    assert_eq!(sort, SortMethod::DateDesc);
    backend.respond(RemoteResponse::Listing {
        seq,
        result: Err(ServiceError::Transport("connection refused".into())),
    });
    dialog.pump(Instant::now());
    let msg = dialog.session().listing().error_message().unwrap();
    assert!(msg.starts_with("Error loading directory: "), "{msg}");
    assert!(!dialog.is_closed());

    dialog
        .handle_event(PickerEvent::SetSort(SortMethod::NameDesc))
        .unwrap();
    let (_, path, sort) = single_listing_request(&backend.take());
    assert_eq!((path.as_str(), sort), ("/nope", SortMethod::NameDesc));
}

#[test]
fn node_consumes_picked_path() {
    let backend = Scripted::default();
    let node = Rc::new(RefCell::new(ImagePathNode::new()));
    let image_requests = Rc::new(RefCell::new(Vec::new()));
    let (node_cb, reqs_cb) = (Rc::clone(&node), Rc::clone(&image_requests));
    let mut dialog = PickerDialog::open(
        "/in",
        LastPath::new(),
        &PickerConfig::default(),
        backend.clone(),
    )
    .on_select(move |p| reqs_cb.borrow_mut().push(node_cb.borrow_mut().set_path(p)));

    dialog.session_mut().select_file("/in/cat.png").unwrap();
    dialog.handle_event(PickerEvent::Commit).unwrap();

    assert_eq!(node.borrow().value(), "/in/cat.png");
    let request = image_requests.borrow_mut().pop().unwrap();
    match &request {
        RemoteRequest::ServeImage { filename, .. } => assert_eq!(filename, "cat.png"),
        other => panic!("unexpected request {other:?}"),
    }
    node.borrow_mut().apply_response(RemoteResponse::Image {
        seq: request.seq(),
        result: Err(ServiceError::Status(404)),
    });
    let mut node = node.borrow_mut();
    assert!(node.images().is_none());
    assert_eq!(node.image_index(), 0);
    assert!(node.take_dirty());
}
