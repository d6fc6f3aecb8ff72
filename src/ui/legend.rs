use egui::{Color32, RichText, Ui};

/// Steepness class painted into the overlay tiles, from the descent gradient
/// of a track segment (negative is downhill).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SteepnessClass {
    UphillOrFlat,
    LightGreen,
    DarkGreen,
    LightBlue,
    Blue,
    Purple,
    BrightRed,
    DarkRed,
    Black,
}

/// Every class, from the gentlest to the steepest.
pub const CLASSES: [SteepnessClass; 9] = [
    SteepnessClass::UphillOrFlat,
    SteepnessClass::LightGreen,
    SteepnessClass::DarkGreen,
    SteepnessClass::LightBlue,
    SteepnessClass::Blue,
    SteepnessClass::Purple,
    SteepnessClass::BrightRed,
    SteepnessClass::DarkRed,
    SteepnessClass::Black,
];

impl SteepnessClass {
    /// Classifies a descent gradient (rise over run).
    pub fn classify(gradient: f64) -> Self {
        match gradient {
            g if g >= 0.0 => SteepnessClass::UphillOrFlat,
            g if g >= -0.07 => SteepnessClass::LightGreen,
            g if g >= -0.15 => SteepnessClass::DarkGreen,
            g if g >= -0.20 => SteepnessClass::LightBlue,
            g if g >= -0.25 => SteepnessClass::Blue,
            g if g >= -0.30 => SteepnessClass::Purple,
            g if g >= -0.37 => SteepnessClass::BrightRed,
            g if g >= -0.45 => SteepnessClass::DarkRed,
            _ => SteepnessClass::Black,
        }
    }

    pub fn color(&self) -> Color32 {
        match self {
            SteepnessClass::UphillOrFlat => Color32::from_rgba_unmultiplied(0x80, 0x80, 0x80, 0x60),
            SteepnessClass::LightGreen => Color32::from_rgb(0x48, 0xB7, 0x48),
            SteepnessClass::DarkGreen => Color32::from_rgb(0x00, 0x64, 0x00),
            SteepnessClass::LightBlue => Color32::from_rgb(0x32, 0xA2, 0xD9),
            SteepnessClass::Blue => Color32::from_rgb(0x00, 0x00, 0xFF),
            SteepnessClass::Purple => Color32::from_rgb(0x80, 0x00, 0x80),
            SteepnessClass::BrightRed => Color32::from_rgb(0xFF, 0x0A, 0x00),
            SteepnessClass::DarkRed => Color32::from_rgb(0x8B, 0x00, 0x00),
            SteepnessClass::Black => Color32::BLACK,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SteepnessClass::UphillOrFlat => "Uphill / flat",
            SteepnessClass::LightGreen => "Very easy (light green)",
            SteepnessClass::DarkGreen => "Easy (dark green)",
            SteepnessClass::LightBlue => "Easy (light blue)",
            SteepnessClass::Blue => "Intermediate (blue)",
            SteepnessClass::Purple => "Intermediate (purple)",
            SteepnessClass::BrightRed => "Difficult (red)",
            SteepnessClass::DarkRed => "Difficult (dark red)",
            SteepnessClass::Black => "Expert (black)",
        }
    }

    /// Gradient interval covered by the class, as a percent range for display.
    pub fn range_text(&self) -> &'static str {
        match self {
            SteepnessClass::UphillOrFlat => "≥ 0%",
            SteepnessClass::LightGreen => "0 – 7%",
            SteepnessClass::DarkGreen => "7 – 15%",
            SteepnessClass::LightBlue => "15 – 20%",
            SteepnessClass::Blue => "20 – 25%",
            SteepnessClass::Purple => "25 – 30%",
            SteepnessClass::BrightRed => "30 – 37%",
            SteepnessClass::DarkRed => "37 – 45%",
            SteepnessClass::Black => "> 45%",
        }
    }
}

/// Draws the legend as a two-column grid of swatches.
pub fn show_legend(ui: &mut Ui) {
    egui::Grid::new("steepness legend")
        .num_columns(2)
        .spacing([24.0, 6.0])
        .show(ui, |ui| {
            for (i, class) in CLASSES.iter().enumerate() {
                ui.horizontal(|ui| {
                    let (rect, _) = ui.allocate_exact_size(egui::vec2(14.0, 14.0), egui::Sense::hover());
                    ui.painter().circle_filled(rect.center(), 7.0, class.color());
                    ui.label(class.label());
                    ui.label(RichText::new(class.range_text()).weak().small());
                });
                if i % 2 == 1 {
                    ui.end_row();
                }
            }
        });
}
