use std::time::Instant;

use dear_imgui_rs::Ui;

use super::ERROR_COLOR;
use crate::session::{BrowseSession, ListedEntry, ListingState, PickerEvent};

pub(super) fn draw_listing(ui: &Ui, session: &BrowseSession, events: &mut Vec<PickerEvent>) {
    match session.listing() {
        ListingState::Loading { .. } => ui.text_disabled("Loading..."),
        ListingState::Failed { .. } => {
            if let Some(msg) = session.listing().error_message() {
                ui.text_colored(ERROR_COLOR, msg);
            }
        }
        ListingState::Ready(view) => {
            if view.is_empty() {
                ui.text_disabled("No folders or images here");
                return;
            }
            for entry in view.directories() {
                draw_entry(ui, session, entry, events);
            }
            if view.directories().next().is_some() && view.files().next().is_some() {
                ui.separator();
            }
            for entry in view.files() {
                draw_entry(ui, session, entry, events);
            }
        }
    }
}

fn draw_entry(
    ui: &Ui,
    session: &BrowseSession,
    entry: &ListedEntry,
    events: &mut Vec<PickerEvent>,
) {
    let _id = ui.push_id(entry.path.as_str());
    let label = format!("{} {}", entry.kind.icon(), entry.name);
    if ui
        .selectable_config(&label)
        .selected(session.is_selected(entry))
        .build()
    {
        events.push(PickerEvent::ClickEntry {
            id: entry.id,
            at: Instant::now(),
        });
    }
    if ui.is_item_hovered() {
        ui.tooltip_text(&entry.path);
    }
}
