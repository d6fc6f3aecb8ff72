use egui::{
    Align2, Color32, Context, Id, Key, Modifiers, Order, Pos2, Rect, RichText, ScrollArea, Sense,
};

use crate::ui::legend::show_legend;

const MODAL_WIDTH: f32 = 640.0;

/// Input the modal reacts to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ModalEvent {
    Escape,
    PointerClick(Pos2),
    CloseButton,
}

/// The "About" overlay. Open while `is_open`; closed by Escape, a click outside
/// its content or the close button.
#[derive(Debug, Default)]
pub struct InfoModal {
    is_open: bool,
    escape_listener: bool,
    content_rect: Option<Rect>,
    opened_pass: Option<u64>,
}

impl InfoModal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    /// Whether Escape is currently being listened for. Only while open.
    pub fn escape_listener_attached(&self) -> bool {
        self.escape_listener
    }

    /// Opens the modal. `pass` is the `cumulative_pass_nr` of the click that
    /// opened it; that click is not treated as an outside click.
    pub fn open(&mut self, pass: u64) {
        self.is_open = true;
        self.escape_listener = true;
        self.opened_pass = Some(pass);
    }

    pub fn close(&mut self) {
        self.is_open = false;
        self.escape_listener = false;
        self.content_rect = None;
        self.opened_pass = None;
    }

    /// Sets the screen rectangle of the modal content, as laid out last.
    pub fn set_content_rect(&mut self, rect: Rect) {
        self.content_rect = Some(rect);
    }

    /// Applies an input event.
    ///
    /// # Returns
    /// `true` if the event closed the modal.
    pub fn handle(&mut self, event: ModalEvent, pass: u64) -> bool {
        if !self.is_open {
            return false;
        }

        let close = match event {
            ModalEvent::Escape => self.escape_listener,
            ModalEvent::CloseButton => true,
            ModalEvent::PointerClick(position) => {
                self.opened_pass != Some(pass)
                    && !self
                        .content_rect
                        .is_some_and(|content| content.contains(position))
            }
        };

        if close {
            self.close();
        }
        close
    }

    /// Draws the backdrop and the content, then processes this frame's input.
    pub fn show(&mut self, ctx: &Context) {
        if !self.is_open {
            return;
        }
        let pass = ctx.cumulative_pass_nr();
        let screen = ctx.screen_rect();

        egui::Area::new(Id::new("info modal backdrop"))
            .order(Order::Foreground)
            .fixed_pos(screen.min)
            .show(ctx, |ui| {
                ui.painter()
                    .rect_filled(screen, 0.0, Color32::from_black_alpha(128));
                ui.allocate_rect(screen, Sense::click());
            });

        let mut close_clicked = false;
        let content = egui::Area::new(Id::new("info modal"))
            .order(Order::Tooltip)
            .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                egui::Frame::window(ui.style()).show(ui, |ui| {
                    ui.set_width(MODAL_WIDTH.min(screen.width() - 32.0));
                    ui.horizontal(|ui| {
                        ui.heading("About the Ski Map");
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if ui.button(RichText::new("✖").heading()).on_hover_text("Close").clicked() {
                                close_clicked = true;
                            }
                        });
                    });
                    ui.separator();
                    ScrollArea::vertical()
                        .max_height(screen.height() * 0.9 - 80.0)
                        .show(ui, content_body);
                });
            });
        self.set_content_rect(content.response.rect);

        if close_clicked {
            self.handle(ModalEvent::CloseButton, pass);
            return;
        }

        if self.escape_listener
            && ctx.input_mut(|i| i.consume_key(Modifiers::NONE, Key::Escape))
            && self.handle(ModalEvent::Escape, pass)
        {
            return;
        }

        let clicked_at = ctx.input(|i| {
            if i.pointer.primary_clicked() {
                i.pointer.interact_pos()
            } else {
                None
            }
        });
        if let Some(position) = clicked_at {
            self.handle(ModalEvent::PointerClick(position), pass);
        }
    }
}

/// Static text of the modal.
fn content_body(ui: &mut egui::Ui) {
    ui.spacing_mut().item_spacing.y = 8.0;
    ui.label(
        RichText::new("Visualising the real steepness of ski slopes from recorded GPS tracks.")
            .size(16.0)
            .strong(),
    );

    egui::Frame::group(ui.style())
        .fill(Color32::from_rgb(0xEF, 0xF6, 0xFF))
        .show(ui, |ui| {
            ui.label(RichText::new("How does it work?").strong());
            ui.label(
                "GPS tracks recorded by skiers are processed to compute the actual gradient \
                 of each run. The colours on the map show the slope angle, which describes \
                 the difficulty more accurately than the official piste marking.",
            );
        });

    ui.label(RichText::new("Colour legend").size(15.0).strong());
    show_legend(ui);

    ui.label(RichText::new("Data").size(15.0).strong());
    ui.label("Ski areas and runs: OpenSkiMap.org and community submitted tracks.");
    ui.label("Base map: © OpenStreetMap contributors © CARTO.");

    ui.separator();
    ui.horizontal(|ui| {
        ui.label(RichText::new("The project is open source, available on").small().weak());
        ui.hyperlink_to(
            RichText::new("GitHub").small(),
            "https://github.com/skimap/skimap.github.io",
        );
    });
}
