use std::collections::{HashSet, VecDeque};

use egui::load::{SizeHint, TexturePoll};
use egui::{pos2, Color32, Painter, Rect, Response, TextureOptions, Vec2};
use log::warn;
use walkers::{Plugin, Position, Projector};

use crate::data::ski_data::Coordinate;
use crate::ui::tiles::{expand_template, tile_origin, zoom_from_scale, TileRange};

/// Lowest zoom at which slope tiles are drawn.
pub const OVERLAY_MIN_ZOOM: u8 = 6;
/// Highest zoom the slope tiles exist for.
pub const OVERLAY_MAX_ZOOM: u8 = 19;
pub const OVERLAY_OPACITY: f32 = 0.9;
/// Overlay tiles kept in egui's image caches. Older ones are forgotten.
pub const OVERLAY_CACHE_TILES: usize = 256;

/// Most recently used tile urls, oldest first, and which of them failed.
#[derive(Debug)]
struct RecentTiles {
    capacity: usize,
    order: VecDeque<String>,
    failed: HashSet<String>,
}

impl RecentTiles {
    fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            order: VecDeque::new(),
            failed: HashSet::new(),
        }
    }

    /// Marks `url` as just used.
    ///
    /// # Returns
    /// The url pushed out to make room, if any.
    fn touch(&mut self, url: &str) -> Option<String> {
        match self.order.iter().position(|known| known == url) {
            Some(index) => {
                if let Some(known) = self.order.remove(index) {
                    self.order.push_back(known);
                }
                None
            }
            None => {
                self.order.push_back(url.to_string());
                if self.order.len() > self.capacity {
                    let evicted = self.order.pop_front()?;
                    self.failed.remove(&evicted);
                    Some(evicted)
                } else {
                    None
                }
            }
        }
    }

    /// Returns `true` the first time `url` fails while it is remembered.
    fn mark_failed(&mut self, url: &str) -> bool {
        self.failed.insert(url.to_string())
    }

    fn is_failed(&self, url: &str) -> bool {
        self.failed.contains(url)
    }

    fn len(&self) -> usize {
        self.order.len()
    }
}

/// Paints the slope-steepness tiles of the dataset on top of the base map.
///
/// Tiles are fetched through egui's image loaders. Only the most recent
/// [`OVERLAY_CACHE_TILES`] stay loaded. A tile that fails to load is logged
/// once and then skipped, leaving a transparent gap.
pub struct SlopeOverlay {
    template: String,
    retina: bool,
    opacity: f32,
    recent: RecentTiles,
}

impl SlopeOverlay {
    pub fn new(template: &str) -> Self {
        Self {
            template: template.to_string(),
            retina: false,
            opacity: OVERLAY_OPACITY,
            recent: RecentTiles::new(OVERLAY_CACHE_TILES),
        }
    }

    /// Switches `{r}` to `@2x` for high-DPI displays.
    pub fn set_retina(&mut self, retina: bool) {
        self.retina = retina;
    }

    /// Tile zoom to request for a view zoom, or `None` outside the
    /// range the overlay covers.
    pub fn tile_zoom(view_zoom: f64) -> Option<u8> {
        let zoom = view_zoom.round();
        if zoom.is_finite()
            && (f64::from(OVERLAY_MIN_ZOOM)..=f64::from(OVERLAY_MAX_ZOOM)).contains(&zoom)
        {
            Some(zoom as u8)
        } else {
            None
        }
    }

    pub fn tile_url(&self, x: u32, y: u32, zoom: u8) -> String {
        expand_template(&self.template, walkers::TileId { x, y, zoom }, self.retina, &[])
    }

    pub fn failed_count(&self) -> usize {
        self.recent.failed.len()
    }

    /// Number of tiles currently held in egui's caches.
    pub fn cached_count(&self) -> usize {
        self.recent.len()
    }
}

impl Plugin for &mut SlopeOverlay {
    fn run(&mut self, response: &Response, painter: Painter, projector: &Projector) {
        let rect = response.rect;
        let center = projector.unproject(Vec2::ZERO);
        let east = Position::from_lon_lat(center.lon() + 1.0, center.lat());
        let points_per_degree = f64::from((projector.project(east) - projector.project(center)).x);

        let Some(zoom) = SlopeOverlay::tile_zoom(zoom_from_scale(points_per_degree)) else {
            return;
        };

        let north_west = Coordinate::from_position(projector.unproject(rect.left_top() - rect.center()));
        let south_east =
            Coordinate::from_position(projector.unproject(rect.right_bottom() - rect.center()));
        let range = TileRange::covering(north_west, south_east, zoom);

        let ctx = painter.ctx().clone();
        let tint = Color32::from_white_alpha((self.opacity * 255.0) as u8);
        let uv = Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0));

        for tile in range.tiles() {
            let url = self.tile_url(tile.x, tile.y, tile.zoom);
            if let Some(evicted) = self.recent.touch(&url) {
                ctx.forget_image(&evicted);
            }
            if self.recent.is_failed(&url) {
                continue;
            }

            let screen = |x: u32, y: u32| {
                projector
                    .project(tile_origin(x, y, zoom).to_position())
                    .to_pos2()
            };
            let tile_rect = Rect::from_min_max(screen(tile.x, tile.y), screen(tile.x + 1, tile.y + 1));

            match ctx.try_load_texture(&url, TextureOptions::LINEAR, SizeHint::default()) {
                Ok(TexturePoll::Ready { texture }) => {
                    painter.image(texture.id, tile_rect, uv, tint);
                }
                Ok(TexturePoll::Pending { .. }) => {}
                Err(e) => {
                    if self.recent.mark_failed(&url) {
                        warn!("Slope tile {} failed to load: {}", url, e);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_tile_zoom_range() {
        assert_eq!(SlopeOverlay::tile_zoom(5.4), None);
        assert_eq!(SlopeOverlay::tile_zoom(5.6), Some(6));
        assert_eq!(SlopeOverlay::tile_zoom(13.0), Some(13));
        assert_eq!(SlopeOverlay::tile_zoom(19.4), Some(19));
        assert_eq!(SlopeOverlay::tile_zoom(19.6), None);
        assert_eq!(SlopeOverlay::tile_zoom(f64::NAN), None);
    }

    #[test]
    fn test_tile_url() {
        let mut overlay = SlopeOverlay::new("https://tiles.example/{z}/{x}/{y}{r}.png");
        assert_eq!(overlay.tile_url(4366, 2867, 13), "https://tiles.example/13/4366/2867.png");

        overlay.set_retina(true);
        assert_eq!(overlay.tile_url(1, 2, 6), "https://tiles.example/6/1/2@2x.png");
    }

    #[test]
    fn test_failed_tiles_are_reported_once() {
        let mut recent = RecentTiles::new(4);
        recent.touch("https://t/6/1/2.png");
        assert!(recent.mark_failed("https://t/6/1/2.png"));
        assert!(!recent.mark_failed("https://t/6/1/2.png"));
        assert!(recent.is_failed("https://t/6/1/2.png"));
    }

    #[test]
    fn test_recent_tiles_evict_least_recently_used() {
        let mut recent = RecentTiles::new(2);
        assert_eq!(recent.touch("a"), None);
        assert_eq!(recent.touch("b"), None);
        assert_eq!(recent.touch("a"), None);
        assert_eq!(recent.touch("c"), Some("b".to_string()));
        assert_eq!(recent.touch("d"), Some("a".to_string()));
        assert_eq!(recent.len(), 2);
    }

    #[test]
    fn test_evicted_failures_are_forgotten() {
        let mut recent = RecentTiles::new(1);
        recent.touch("a");
        recent.mark_failed("a");

        assert_eq!(recent.touch("b"), Some("a".to_string()));
        assert!(!recent.is_failed("a"));
        assert!(recent.failed.is_empty());
    }

    #[test]
    fn test_overlay_starts_empty() {
        let overlay = SlopeOverlay::new("https://t/{z}/{x}/{y}.png");
        assert_eq!(overlay.cached_count(), 0);
        assert_eq!(overlay.failed_count(), 0);
    }
}
