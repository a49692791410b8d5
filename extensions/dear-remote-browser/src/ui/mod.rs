use std::time::Instant;

use dear_imgui_rs::texture::TextureId;
use dear_imgui_rs::{InputTextFlags, Key, Ui, WindowFlags};

use crate::core::{PickerOutcome, SortMethod};
use crate::dialog::PickerDialog;
use crate::preview::{Preview, PreviewState};
use crate::session::{BrowseSession, ListingState, PickerEvent};

mod listing;

const ERROR_COLOR: [f32; 4] = [1.0, 0.35, 0.35, 1.0];
const PREVIEW_PANEL_WIDTH: f32 = 280.0;
const LISTING_SIZE: [f32; 2] = [440.0, 360.0];
const PATH_INPUT_WIDTH: f32 = 620.0;
const GO_BUTTON_WIDTH: f32 = 40.0;

/// Texture provider for the preview thumbnail.
///
/// The renderer owns GPU textures: it uploads
/// [`Preview::image`](crate::Preview::image) when asked and keeps the texture
/// alive for as long as it returns it. Returning `None` draws dimensions and
/// name only.
pub trait PreviewTextures {
    /// Returns a texture showing `preview`, uploading it if needed.
    fn texture_for(&mut self, preview: &Preview) -> Option<TextureId>;
}

impl PreviewTextures for () {
    fn texture_for(&mut self, _preview: &Preview) -> Option<TextureId> {
        None
    }
}

/// UI handle for the remote picker.
pub struct RemotePicker<'ui> {
    /// Frame being built.
    pub ui: &'ui Ui,
}

/// Extend Ui with a remote picker entry point.
pub trait RemotePickerExt {
    /// Entry point for drawing a [`PickerDialog`].
    fn remote_picker(&self) -> RemotePicker<'_>;
}

impl RemotePickerExt for Ui {
    fn remote_picker(&self) -> RemotePicker<'_> {
        RemotePicker { ui: self }
    }
}

impl<'ui> RemotePicker<'ui> {
    /// Popup identifier of the picker modal.
    pub const POPUP_ID: &'static str = "Select Image##dear_remote_browser";

    /// Pumps the dialog and draws it as a modal popup.
    ///
    /// The popup opens on the first call and blocks the rest of the
    /// application until the dialog closes. Returns the outcome on the frame
    /// the dialog closes; `None` otherwise.
    ///
    /// ```no_run
    /// use dear_remote_browser::{
    ///     LastPath, PickerConfig, PickerDialog, QueueBackend, RemotePickerExt,
    /// };
    /// # use dear_imgui_rs::*;
    /// # let mut ctx = Context::create();
    /// # let ui = ctx.frame();
    /// let mut dialog = PickerDialog::open(
    ///     "/data/input",
    ///     LastPath::new(),
    ///     &PickerConfig::default(),
    ///     QueueBackend::new(),
    /// )
    /// .on_select(|path| println!("picked {path}"));
    ///
    /// if let Some(outcome) = ui.remote_picker().show(&mut dialog, &mut ()) {
    ///     let _memory = outcome.into_last_path();
    /// }
    /// ```
    pub fn show(
        &self,
        dialog: &mut PickerDialog,
        textures: &mut dyn PreviewTextures,
    ) -> Option<PickerOutcome> {
        let ui = self.ui;
        dialog.pump(Instant::now());
        if dialog.mark_presented() && !dialog.is_closed() {
            ui.open_popup(Self::POPUP_ID);
        }

        let popup = ui
            .begin_modal_popup_config(Self::POPUP_ID)
            .flags(WindowFlags::ALWAYS_AUTO_RESIZE | WindowFlags::NO_SAVED_SETTINGS)
            .begin();
        let Some(_popup) = popup else {
            if !dialog.is_closed() {
                // Dismissed without going through the picker's own controls.
                let _ = dialog.handle_event(PickerEvent::Cancel);
            }
            return dialog.take_outcome();
        };

        if !dialog.is_closed() {
            let mut events = Vec::new();
            draw_contents(ui, dialog, textures, &mut events);
            for event in events {
                if dialog.handle_event(event).is_err() {
                    break;
                }
            }
        }
        if dialog.is_closed() {
            ui.close_current_popup();
        }
        dialog.take_outcome()
    }
}

fn draw_contents(
    ui: &Ui,
    dialog: &mut PickerDialog,
    textures: &mut dyn PreviewTextures,
    events: &mut Vec<PickerEvent>,
) {
    draw_header(ui, dialog.session(), events);
    draw_path_bar(ui, dialog.session_mut(), events);
    ui.separator();

    ui.child_window("listing")
        .size(LISTING_SIZE)
        .border(true)
        .build(ui, || {
            listing::draw_listing(ui, dialog.session(), events);
        });
    ui.same_line();
    ui.child_window("preview")
        .size([PREVIEW_PANEL_WIDTH, LISTING_SIZE[1]])
        .border(true)
        .build(ui, || {
            draw_preview(ui, dialog.session().preview(), textures);
        });

    draw_footer(ui, dialog.session(), events);

    if ui.is_key_pressed(Key::Escape) {
        events.push(PickerEvent::Cancel);
    }
}

fn draw_header(ui: &Ui, session: &BrowseSession, events: &mut Vec<PickerEvent>) {
    ui.align_text_to_frame_padding();
    ui.text("Select Image");
    ui.same_line();

    let current = session.sort_method();
    ui.set_next_item_width(120.0);
    if let Some(_combo) = ui.begin_combo("##sort", current.label()) {
        for method in SortMethod::ALL {
            if ui
                .selectable_config(method.label())
                .selected(method == current)
                .build()
                && method != current
            {
                events.push(PickerEvent::SetSort(method));
            }
        }
    }
    ui.same_line();
    if ui.button("Close") {
        events.push(PickerEvent::Cancel);
    }
}

fn draw_path_bar(ui: &Ui, session: &mut BrowseSession, events: &mut Vec<PickerEvent>) {
    {
        let _disabled = ui.begin_disabled_with_cond(!session.can_go_up());
        if ui.button("Up") {
            events.push(PickerEvent::GoUp);
        }
    }
    if ui.is_item_hovered() {
        if let Some(parent) = session.parent_path() {
            ui.tooltip_text(parent);
        }
    }
    ui.same_line();

    ui.set_next_item_width(PATH_INPUT_WIDTH);
    let entered = ui
        .input_text("##path", &mut session.path_input)
        .flags(InputTextFlags::ENTER_RETURNS_TRUE)
        .build();
    ui.same_line();
    if ui.button_with_size("Go", [GO_BUTTON_WIDTH, 0.0]) || entered {
        events.push(PickerEvent::SubmitPathInput);
    }
}

fn draw_preview(ui: &Ui, preview: &PreviewState, textures: &mut dyn PreviewTextures) {
    match preview {
        PreviewState::Empty => ui.text_disabled("No image selected"),
        PreviewState::Loading { .. } => ui.text_disabled("Loading preview..."),
        PreviewState::Failed { .. } => {
            if let Some(msg) = preview.error_message() {
                ui.text_colored(ERROR_COLOR, msg);
            }
        }
        PreviewState::Ready(p) => {
            if let Some(tex) = textures.texture_for(p) {
                let source = match &p.image {
                    Some(img) => [img.width as f32, img.height as f32],
                    None => [p.width as f32, p.height as f32],
                };
                let avail = ui.content_region_avail();
                ui.image(tex, fit_size(source, [avail[0], avail[1] - 48.0]));
            }
            ui.text(p.dimensions_label());
            ui.text_wrapped(&p.name);
        }
    }
}

fn draw_footer(ui: &Ui, session: &BrowseSession, events: &mut Vec<PickerEvent>) {
    if let ListingState::Loading { path } = session.listing() {
        ui.text_disabled(format!("Listing {path}"));
        ui.same_line();
    }
    {
        let _disabled = ui.begin_disabled_with_cond(!session.can_commit());
        if ui.button("Select") {
            events.push(PickerEvent::Commit);
        }
    }
    ui.same_line();
    if ui.button("Cancel") {
        events.push(PickerEvent::Cancel);
    }
}

/// Scales `size` down to fit in `bounds`, keeping its aspect ratio.
fn fit_size(size: [f32; 2], bounds: [f32; 2]) -> [f32; 2] {
    let [w, h] = size;
    if w <= 0.0 || h <= 0.0 {
        return [0.0, 0.0];
    }
    let scale = (bounds[0] / w).min(bounds[1] / h).clamp(0.0, 1.0);
    [w * scale, h * scale]
}
