use ski_slope_map::{config::Config, ui::lib::SkiMapApp};

#[cfg(not(target_arch = "wasm32"))]
fn main() -> Result<(), eframe::Error> {
    env_logger::init();

    let config = Config::from_env();
    log::info!("Map data source: {}", config.data_source);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Ski Slope Map")
            .with_inner_size([1280.0, 800.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Ski Slope Map",
        options,
        Box::new(|cc| Ok(Box::new(SkiMapApp::new(cc.egui_ctx.clone(), config)))),
    )
}
