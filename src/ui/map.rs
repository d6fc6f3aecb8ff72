use std::collections::HashMap;
use std::sync::Arc;

use egui::{Context, Vec2};
use log::{debug, warn};
use threadpool::ThreadPool;
use walkers::{MapMemory, Position, Tiles};

use crate::data::ski_data::{Coordinate, SkiDataset};
use crate::ui::fly_to::{FlyAnimation, FlyToController, Watched};
use crate::ui::info_modal::InfoModal;
use crate::ui::locate::{LocateControl, Locator};
use crate::ui::overlay::SlopeOverlay;
use crate::ui::places;
use crate::ui::plugins::{MarkerClick, SkiAreaMarkers};
use crate::ui::provider::Provider;
use crate::ui::selector::AreaSelector;
use crate::ui::tiles::GeoBounds;
use crate::ui::windows;

/// Zoom ceiling when expanding a cluster.
const CLUSTER_MAX_ZOOM: f64 = 18.0;
/// Padding kept around a cluster's bounds when zooming to it.
const CLUSTER_PADDING: f32 = 40.0;
const CLUSTER_FLIGHT_DURATION: f64 = 0.5;

/// What a marker click does to the view.
#[derive(Debug, Clone)]
pub enum MarkerAction {
    /// Make the coordinate the new target; the fly-to controller takes over.
    Select(Coordinate),
    /// Zoom into a cluster.
    Fly(FlyAnimation),
}

/// Decides what a marker click does. A single area is selected. A cluster is
/// zoomed into until its members separate; once that no longer zooms in, its
/// first member is selected instead.
///
/// # Arguments
/// * `click` - The click reported by the marker layer.
/// * `center` / `zoom` - The current view.
/// * `viewport` - Size of the map on screen.
/// * `now` - Clock value in seconds.
pub fn marker_action(
    click: MarkerClick,
    center: Coordinate,
    zoom: f64,
    viewport: Vec2,
    now: f64,
) -> Option<MarkerAction> {
    match click {
        MarkerClick::Area { name, coordinate } => {
            debug!("Marker {:?} clicked", name);
            Some(MarkerAction::Select(coordinate))
        }
        MarkerClick::Cluster { members } => {
            let bounds = GeoBounds::from_coordinates(members.iter().map(|(_, c)| *c))?;
            let fit = bounds
                .fit_zoom(viewport, CLUSTER_PADDING)
                .min(CLUSTER_MAX_ZOOM);

            if fit > zoom {
                Some(MarkerAction::Fly(FlyAnimation::new(
                    center,
                    zoom,
                    bounds.center(),
                    fit,
                    viewport,
                    now,
                    CLUSTER_FLIGHT_DURATION,
                )))
            } else {
                let (name, coordinate) = members.first()?;
                debug!("Cluster cannot expand further, selecting {:?}", name);
                Some(MarkerAction::Select(*coordinate))
            }
        }
    }
}

/// The map view shown once the dataset is loaded: base tiles, the slope
/// overlay, ski area markers and the controls around them.
pub struct MapSurface {
    providers: HashMap<Provider, Box<dyn Tiles + Send>>,
    selected_provider: Provider,
    map_memory: MapMemory,
    home: Position,
    overlay: SlopeOverlay,
    markers: SkiAreaMarkers,
    selector: AreaSelector,
    target: Watched<Coordinate>,
    fly_to: FlyToController,
    locate: LocateControl,
    info: InfoModal,
}

impl MapSurface {
    /// Creates the view for `dataset`.
    ///
    /// # Arguments
    /// * `egui_ctx` - The Egui context.
    /// * `dataset` - The loaded ski areas and overlay template.
    /// * `providers` - Base map tile providers.
    /// * `locator` - Source of the user's position for the locate button.
    pub fn new(
        egui_ctx: &Context,
        dataset: Arc<SkiDataset>,
        providers: HashMap<Provider, Box<dyn Tiles + Send>>,
        locator: Arc<dyn Locator>,
    ) -> Self {
        let mut map_memory = MapMemory::default();
        if let Err(e) = map_memory.set_zoom(places::HOME_ZOOM as f32) {
            warn!("Failed to set initial zoom: {:?}", e);
        }

        let mut overlay = SlopeOverlay::new(&dataset.tile_url);
        overlay.set_retina(egui_ctx.pixels_per_point() > 1.0);

        Self {
            providers,
            selected_provider: Provider::CartoLight,
            map_memory,
            home: places::home(),
            overlay,
            markers: SkiAreaMarkers::new(&dataset),
            selector: AreaSelector::new(&dataset.ski_areas),
            target: Watched::new(),
            fly_to: FlyToController::new(),
            locate: LocateControl::new(locator),
            info: InfoModal::new(),
        }
    }

    /// Draws one frame.
    pub fn show(&mut self, ctx: &Context, pool: &ThreadPool) {
        let rimless = egui::Frame {
            fill: ctx.style().visuals.panel_fill,
            ..Default::default()
        };

        egui::CentralPanel::default()
            .frame(rimless)
            .show(ctx, |ui| {
                let viewport = ui.available_size();
                let now = ctx.input(|i| i.time);

                if self
                    .fly_to
                    .update(&self.target, &mut self.map_memory, self.home, viewport, now)
                {
                    ctx.request_repaint();
                }
                if self.locate.poll(&mut self.map_memory, viewport).is_some() {
                    self.fly_to.cancel();
                }

                let tiles = match self.providers.get_mut(&self.selected_provider) {
                    Some(provider) => provider.as_mut(),
                    None => {
                        warn!("Selected provider {:?} not available", self.selected_provider);
                        return;
                    }
                };
                let attribution = tiles.attribution().text;

                let map = walkers::Map::new(Some(tiles), &mut self.map_memory, self.home)
                    .with_plugin(&mut self.overlay)
                    .with_plugin(&mut self.markers);
                ui.add(map);

                if let Some(click) = self.markers.take_click() {
                    let center =
                        Coordinate::from_position(self.map_memory.detached().unwrap_or(self.home));
                    let zoom = f64::from(self.map_memory.zoom());
                    match marker_action(click, center, zoom, viewport, now) {
                        Some(MarkerAction::Select(coordinate)) => self.target.set(coordinate),
                        Some(MarkerAction::Fly(flight)) => self.fly_to.start(flight),
                        None => {}
                    }
                    ctx.request_repaint();
                }

                if windows::zoom(ui, &mut self.map_memory, &mut self.selected_provider) {
                    self.fly_to.cancel();
                }

                let actions = windows::controls(ui, &mut self.selector, self.locate.is_pending());
                if let Some(coordinate) = actions.picked {
                    self.target.set(coordinate);
                    ctx.request_repaint();
                }
                if actions.locate {
                    let repaint = ctx.clone();
                    self.locate.request(pool, move || repaint.request_repaint());
                }
                if actions.info {
                    self.info.open(ctx.cumulative_pass_nr());
                }

                windows::attribution(ui, attribution);
            });

        self.info.show(ctx);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const VIEWPORT: Vec2 = Vec2::new(1280.0, 800.0);

    fn alpine_cluster() -> MarkerClick {
        MarkerClick::Cluster {
            members: vec![
                ("Alpbach".to_string(), Coordinate::new(47.4, 11.9)),
                ("Kitzbuehel".to_string(), Coordinate::new(47.45, 12.39)),
            ],
        }
    }

    #[test]
    fn test_single_marker_selects_its_area() {
        let click = MarkerClick::Area {
            name: "Bansko".to_string(),
            coordinate: Coordinate::new(41.8, 23.5),
        };

        match marker_action(click, Coordinate::new(47.85, 16.01), 6.0, VIEWPORT, 0.0) {
            Some(MarkerAction::Select(coordinate)) => assert_eq!(coordinate, Coordinate::new(41.8, 23.5)),
            other => panic!("unexpected action {:?}", other),
        }
    }

    #[test]
    fn test_cluster_zooms_in_to_its_bounds() {
        let center = Coordinate::new(47.85, 16.01);

        match marker_action(alpine_cluster(), center, 6.0, VIEWPORT, 3.0) {
            Some(MarkerAction::Fly(flight)) => {
                assert!(flight.target_zoom() > 6.0 && flight.target_zoom() <= CLUSTER_MAX_ZOOM);
                assert!((flight.target().lat - 47.425).abs() < 1e-3);
                assert!((flight.target().lon - 12.145).abs() < 1e-9);
                assert_eq!(flight.duration(), CLUSTER_FLIGHT_DURATION);
                assert!(!flight.sample(3.0).finished);
            }
            other => panic!("unexpected action {:?}", other),
        }
    }

    #[test]
    fn test_cluster_that_cannot_expand_selects_first_member() {
        let center = Coordinate::new(47.425, 12.145);

        match marker_action(alpine_cluster(), center, CLUSTER_MAX_ZOOM, VIEWPORT, 0.0) {
            Some(MarkerAction::Select(coordinate)) => assert_eq!(coordinate, Coordinate::new(47.4, 11.9)),
            other => panic!("unexpected action {:?}", other),
        }
    }

    #[test]
    fn test_stacked_cluster_zooms_to_ceiling_then_selects() {
        // Identical coordinates never separate, whatever the zoom.
        let stacked = || MarkerClick::Cluster {
            members: vec![
                ("Lech".to_string(), Coordinate::new(47.2, 10.14)),
                ("Zuers".to_string(), Coordinate::new(47.2, 10.14)),
            ],
        };
        let center = Coordinate::new(47.2, 10.14);

        match marker_action(stacked(), center, 6.0, VIEWPORT, 0.0) {
            Some(MarkerAction::Fly(flight)) => assert_eq!(flight.target_zoom(), CLUSTER_MAX_ZOOM),
            other => panic!("unexpected action {:?}", other),
        }
        match marker_action(stacked(), center, CLUSTER_MAX_ZOOM, VIEWPORT, 0.0) {
            Some(MarkerAction::Select(coordinate)) => assert_eq!(coordinate, center),
            other => panic!("unexpected action {:?}", other),
        }
    }
}
