use std::collections::HashMap;
use std::sync::Arc;

use egui::Context;
use log::info;
use threadpool::ThreadPool;
use walkers::{HttpOptions, HttpTiles, Tiles};

use crate::config::Config;
use crate::data::loader::{DataLoader, LoadState};
use crate::ui::locate::IpLocator;
use crate::ui::map::MapSurface;
use crate::ui::provider::{CartoLight, Provider};
use crate::ui::windows;

/// Workers for the dataset fetch and location lookups.
const WORKER_THREADS: usize = 2;

/// Returns the HTTP options for the base map tiles.
///
/// # Arguments
/// * `config` - Runtime configuration; decides whether tiles are cached on disk.
///
/// # Returns
/// `HttpOptions` - The HTTP options configured for the application.
fn http_options(config: &Config) -> HttpOptions {
    HttpOptions {
        cache: config.tile_cache.clone(),
        ..Default::default()
    }
}

/// Returns a map of available tile providers.
///
/// # Arguments
/// * `egui_ctx` - The Egui context.
/// * `config` - Runtime configuration.
/// * `retina` - Whether to request high resolution tiles where available.
///
/// # Returns
/// `HashMap<Provider, Box<dyn Tiles + Send>>` - A map of available tile providers.
fn providers(
    egui_ctx: &Context,
    config: &Config,
    retina: bool,
) -> HashMap<Provider, Box<dyn Tiles + Send>> {
    let mut providers: HashMap<Provider, Box<dyn Tiles + Send>> = HashMap::default();

    providers.insert(
        Provider::CartoLight,
        Box::new(HttpTiles::with_options(
            CartoLight { retina },
            http_options(config),
            egui_ctx.to_owned(),
        )),
    );
    providers.insert(
        Provider::OpenStreetMap,
        Box::new(HttpTiles::with_options(
            walkers::sources::OpenStreetMap,
            http_options(config),
            egui_ctx.to_owned(),
        )),
    );

    providers
}

/// Main application structure. Shows a loading screen until the dataset
/// arrives, then the map.
pub struct SkiMapApp {
    config: Config,
    pool: ThreadPool,
    loader: DataLoader,
    surface: Option<MapSurface>,
}

impl SkiMapApp {
    /// Creates the application and starts loading the dataset.
    ///
    /// # Arguments
    /// * `egui_ctx` - The Egui context.
    /// * `config` - Runtime configuration.
    pub fn new(egui_ctx: Context, config: Config) -> Self {
        egui_extras::install_image_loaders(&egui_ctx);

        let pool = ThreadPool::new(WORKER_THREADS);
        let mut loader = DataLoader::new(config.data_source.clone());
        let repaint = egui_ctx.clone();
        loader.start(&pool, move || repaint.request_repaint());

        Self {
            config,
            pool,
            loader,
            surface: None,
        }
    }

    fn build_surface(&self, ctx: &Context, state: &LoadState) -> Option<MapSurface> {
        let LoadState::Ready(dataset) = state else {
            return None;
        };
        let retina = ctx.pixels_per_point() > 1.0;
        info!(
            "Showing {} ski areas, overlay tiles from {}",
            dataset.len(),
            dataset.tile_url
        );
        Some(MapSurface::new(
            ctx,
            Arc::clone(dataset),
            providers(ctx, &self.config, retina),
            Arc::new(IpLocator::default()),
        ))
    }
}

impl eframe::App for SkiMapApp {
    /// Updates the application state.
    ///
    /// # Arguments
    /// * `ctx` - The Egui context.
    /// * `_frame` - The Eframe frame.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.surface.is_none() {
            let state = self.loader.poll().clone();
            match &state {
                LoadState::Loading => {
                    windows::loading_view(ctx);
                    return;
                }
                LoadState::Error(e) => {
                    windows::error_view(ctx, e);
                    return;
                }
                LoadState::Ready(_) => {
                    self.surface = self.build_surface(ctx, &state);
                }
            }
        }

        if let Some(surface) = self.surface.as_mut() {
            surface.show(ctx, &self.pool);
        }
    }
}
