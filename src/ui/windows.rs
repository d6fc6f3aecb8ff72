use egui::{Align2, Context, RichText, Ui, Window};
use walkers::MapMemory;

use crate::data::ski_data::Coordinate;
use crate::errors::error_types::ErrorTypes;
use crate::ui::provider::Provider;
use crate::ui::selector::AreaSelector;

/// What the user asked for in the top-right controls this frame.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct ControlActions {
    pub picked: Option<Coordinate>,
    pub locate: bool,
    pub info: bool,
}

/// Shows the zoom and base map window.
///
/// # Arguments
/// * `ui` - The Egui UI.
/// * `map_memory` - The map memory.
/// * `provider` - The selected base map, changed in place.
///
/// # Returns
/// `true` if a zoom button changed the view.
pub fn zoom(ui: &Ui, map_memory: &mut MapMemory, provider: &mut Provider) -> bool {
    let mut zoomed = false;

    Window::new("Map")
        .collapsible(false)
        .resizable(false)
        .title_bar(false)
        .anchor(Align2::LEFT_BOTTOM, [10., -10.])
        .show(ui.ctx(), |ui| {
            ui.horizontal(|ui| {
                if ui.button(RichText::new("➕").heading()).clicked() {
                    zoomed |= map_memory.zoom_in().is_ok();
                }

                if ui.button(RichText::new("➖").heading()).clicked() {
                    zoomed |= map_memory.zoom_out().is_ok();
                }

                egui::ComboBox::from_id_salt("base map")
                    .selected_text(provider.name())
                    .show_ui(ui, |ui| {
                        for option in Provider::ALL {
                            ui.selectable_value(provider, option, option.name());
                        }
                    });
            });
        });

    zoomed
}

/// Shows the search box with the locate and info buttons, top right.
///
/// # Arguments
/// * `ui` - The Egui UI.
/// * `selector` - The ski area selector.
/// * `locating` - Whether a location lookup is in progress.
pub fn controls(ui: &Ui, selector: &mut AreaSelector, locating: bool) -> ControlActions {
    let mut actions = ControlActions::default();

    Window::new("Controls")
        .collapsible(false)
        .resizable(false)
        .title_bar(false)
        .anchor(Align2::RIGHT_TOP, [-10., 10.])
        .show(ui.ctx(), |ui| {
            ui.horizontal_top(|ui| {
                ui.vertical(|ui| {
                    actions.picked = selector.show(ui);
                });

                let locate = ui.add_enabled(!locating, egui::Button::new(RichText::new("⌖").heading()));
                if locate.on_hover_text("Show my location").clicked() {
                    actions.locate = true;
                }

                if ui
                    .button(RichText::new("ℹ").heading())
                    .on_hover_text("About this map")
                    .clicked()
                {
                    actions.info = true;
                }
            });
        });

    actions
}

/// Attribution of the visible layers, bottom right.
pub fn attribution(ui: &Ui, base: &str) {
    Window::new("Attribution")
        .collapsible(false)
        .resizable(false)
        .title_bar(false)
        .anchor(Align2::RIGHT_BOTTOM, [-10., -10.])
        .show(ui.ctx(), |ui| {
            ui.label(RichText::new(format!("{} | Ski Tracks", base)).small());
        });
}

/// Full window message while the dataset is loading.
pub fn loading_view(ctx: &Context) {
    egui::CentralPanel::default().show(ctx, |ui| {
        ui.centered_and_justified(|ui| {
            ui.label(RichText::new("Loading Ski Data...").size(20.0));
        });
    });
}

/// Full window message when the dataset could not be loaded.
pub fn error_view(ctx: &Context, error: &ErrorTypes) {
    egui::CentralPanel::default().show(ctx, |ui| {
        ui.vertical_centered(|ui| {
            ui.add_space((ui.available_height() / 2.0 - 30.0).max(0.0));
            ui.label(RichText::new("Error loading data.").size(20.0));
            ui.label(RichText::new(error.to_string()).weak());
        });
    });
}
