#![cfg(feature = "imgui")]

use std::cell::Cell;
use std::rc::Rc;

use dear_imgui_rs::{Context, Key};
use dear_remote_browser::{
    DirectoryListing, LastPath, PickerConfig, PickerDialog, PickerOutcome, QueueBackend,
    RemotePicker, RemotePickerExt, RemoteResponse,
};

fn frame_context() -> Context {
    let mut imgui = Context::create();
    {
        let io = imgui.io_mut();
        io.set_display_size([800.0, 600.0]);
        io.set_delta_time(1.0 / 60.0);
    }
    let _ = imgui.font_atlas_mut().build();
    let _ = imgui.set_ini_filename::<std::path::PathBuf>(None);
    imgui
}

/// Draw the picker for one frame while the first listing is still loading.
#[test]
fn picker_renders_while_loading() {
    let mut imgui = frame_context();
    let ui = imgui.frame();

    let mut dialog = PickerDialog::open(
        "/photos",
        LastPath::new(),
        &PickerConfig::default(),
        QueueBackend::new(),
    );
    assert!(ui.remote_picker().show(&mut dialog, &mut ()).is_none());
    assert!(!dialog.is_closed());
    assert!(ui.is_popup_open(RemotePicker::POPUP_ID));
}

/// Draw the picker for one frame with a listing applied.
#[test]
fn picker_renders_listing() {
    let mut imgui = frame_context();
    let ui = imgui.frame();

    let mut backend = QueueBackend::new();
    // The first request of a fresh session is tagged 1.
    backend.respond(RemoteResponse::Listing {
        seq: 1,
        result: Ok(DirectoryListing {
            current_path: "/photos".into(),
            parent_path: Some("/".into()),
            directories: vec!["2024".into()],
            files: vec!["a.png".into()],
            sort_method: Some("name_asc".into()),
        }),
    });
    let mut dialog =
        PickerDialog::open("/photos", LastPath::new(), &PickerConfig::default(), backend);
    let _ = ui.remote_picker().show(&mut dialog, &mut ());
    assert_eq!(dialog.session().listing().view().map(|v| v.len()), Some(2));
}

/// Escape closes the modal as a cancel and never reports a selection.
#[test]
fn escape_cancels_without_selecting() {
    let mut imgui = frame_context();
    let selected = Rc::new(Cell::new(false));
    let flag = Rc::clone(&selected);
    let mut dialog = PickerDialog::open(
        "/photos",
        LastPath::from("/photos/a.png"),
        &PickerConfig::default(),
        QueueBackend::new(),
    )
    .on_select(move |_| flag.set(true));

    {
        let ui = imgui.frame();
        assert!(ui.remote_picker().show(&mut dialog, &mut ()).is_none());
    }
    imgui.render();

    imgui.io_mut().add_key_event(Key::Escape, true);
    let mut outcome = None;
    for _ in 0..3 {
        {
            let ui = imgui.frame();
            outcome = ui.remote_picker().show(&mut dialog, &mut ());
        }
        imgui.render();
        if outcome.is_some() {
            break;
        }
        imgui.io_mut().add_key_event(Key::Escape, false);
        imgui.io_mut().add_key_event(Key::Escape, true);
    }

    assert_eq!(
        outcome,
        Some(PickerOutcome::Cancelled {
            last_path: LastPath::from("/photos/a.png"),
        })
    );
    assert!(dialog.is_closed());
    assert!(!selected.get());

    let ui = imgui.frame();
    assert!(ui.remote_picker().show(&mut dialog, &mut ()).is_none());
    assert!(!ui.is_popup_open(RemotePicker::POPUP_ID));
}
