//! Web-Mercator helpers shared by the tile sources, the overlay and the
//! camera controllers.

use std::f64::consts::PI;

use egui::Vec2;
use walkers::TileId;

use crate::data::ski_data::Coordinate;

/// Edge length of a tile at its nominal zoom, in screen points.
pub const TILE_SIZE: f64 = 256.0;
/// Equatorial circumference used to turn metres into degrees.
const EARTH_CIRCUMFERENCE: f64 = 40_075_016.686;

/// Projects a coordinate to normalized Web-Mercator space, where the whole world
/// spans `[0, 1]` on both axes and `y` grows southwards.
pub fn to_world(coordinate: Coordinate) -> (f64, f64) {
    let x = (coordinate.lon + 180.0) / 360.0;
    let lat_rad = coordinate.lat.to_radians();
    let y = (1.0 - lat_rad.tan().asinh() / PI) / 2.0;
    (x, y)
}

/// Inverse of [`to_world`].
pub fn from_world(x: f64, y: f64) -> Coordinate {
    let lon = x * 360.0 - 180.0;
    let lat = (PI * (1.0 - 2.0 * y)).sinh().atan().to_degrees();
    Coordinate::new(lat, lon)
}

/// Size of the whole world in screen points at `zoom`.
pub fn world_size(zoom: f64) -> f64 {
    TILE_SIZE * 2f64.powf(zoom)
}

/// North-west corner of a tile.
pub fn tile_origin(x: u32, y: u32, zoom: u8) -> Coordinate {
    let n = f64::from(1u32 << zoom);
    from_world(f64::from(x) / n, f64::from(y) / n)
}

/// Infers the zoom level from how many screen points one degree of longitude
/// takes.
pub fn zoom_from_scale(points_per_degree: f64) -> f64 {
    (points_per_degree * 360.0 / TILE_SIZE).log2()
}

/// Axis-aligned geographic rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl GeoBounds {
    /// Smallest bounds containing every coordinate, or `None` for an empty input.
    pub fn from_coordinates(coordinates: impl IntoIterator<Item = Coordinate>) -> Option<Self> {
        coordinates.into_iter().fold(None, |bounds, c| {
            Some(match bounds {
                None => GeoBounds {
                    south: c.lat,
                    west: c.lon,
                    north: c.lat,
                    east: c.lon,
                },
                Some(b) => GeoBounds {
                    south: b.south.min(c.lat),
                    west: b.west.min(c.lon),
                    north: b.north.max(c.lat),
                    east: b.east.max(c.lon),
                },
            })
        })
    }

    /// Square bounds of `radius` metres around `center`.
    pub fn around(center: Coordinate, radius: f64) -> Self {
        let lat_delta = 180.0 * radius / EARTH_CIRCUMFERENCE;
        let lon_delta = lat_delta / center.lat.to_radians().cos().max(f64::EPSILON);
        GeoBounds {
            south: (center.lat - lat_delta).max(-90.0),
            west: (center.lon - lon_delta).max(-180.0),
            north: (center.lat + lat_delta).min(90.0),
            east: (center.lon + lon_delta).min(180.0),
        }
    }

    pub fn center(&self) -> Coordinate {
        let (west, north) = to_world(Coordinate::new(self.north, self.west));
        let (east, south) = to_world(Coordinate::new(self.south, self.east));
        from_world((west + east) / 2.0, (north + south) / 2.0)
    }

    /// Largest whole zoom at which the bounds fit in `viewport` with `padding`
    /// points left on every side. Degenerate bounds give `f64::INFINITY`.
    pub fn fit_zoom(&self, viewport: Vec2, padding: f32) -> f64 {
        let (west, north) = to_world(Coordinate::new(self.north, self.west));
        let (east, south) = to_world(Coordinate::new(self.south, self.east));
        let width = f64::from((viewport.x - 2.0 * padding).max(1.0));
        let height = f64::from((viewport.y - 2.0 * padding).max(1.0));

        let zoom_x = (width / ((east - west) * TILE_SIZE)).log2();
        let zoom_y = (height / ((south - north) * TILE_SIZE)).log2();
        zoom_x.min(zoom_y).floor()
    }
}

/// Inclusive rectangle of tile indices at one zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRange {
    pub zoom: u8,
    pub x_min: u32,
    pub x_max: u32,
    pub y_min: u32,
    pub y_max: u32,
}

impl TileRange {
    /// Tiles covering the area between the `north_west` and `south_east`
    /// corners, clamped to the world.
    pub fn covering(north_west: Coordinate, south_east: Coordinate, zoom: u8) -> Self {
        let n = 1u32 << zoom;
        let scale = f64::from(n);
        let index = |v: f64| (v * scale).floor().clamp(0.0, f64::from(n - 1)) as u32;

        let (x0, y0) = to_world(north_west);
        let (x1, y1) = to_world(south_east);
        TileRange {
            zoom,
            x_min: index(x0.min(x1)),
            x_max: index(x0.max(x1)),
            y_min: index(y0.min(y1)),
            y_max: index(y0.max(y1)),
        }
    }

    pub fn len(&self) -> usize {
        ((self.x_max - self.x_min + 1) * (self.y_max - self.y_min + 1)) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn tiles(&self) -> impl Iterator<Item = TileId> + '_ {
        (self.y_min..=self.y_max).flat_map(move |y| {
            (self.x_min..=self.x_max).map(move |x| TileId {
                x,
                y,
                zoom: self.zoom,
            })
        })
    }
}

/// Fills the `{z}`, `{x}`, `{y}`, `{r}` and `{s}` placeholders of a slippy
/// tile template.
///
/// `{r}` becomes `@2x` on high-DPI displays. `{s}` picks one of `subdomains`
/// by `(x + y) mod len`, so a tile always maps to the same host.
pub fn expand_template(template: &str, tile: TileId, retina: bool, subdomains: &[&str]) -> String {
    let mut url = template
        .replace("{z}", &tile.zoom.to_string())
        .replace("{x}", &tile.x.to_string())
        .replace("{y}", &tile.y.to_string())
        .replace("{r}", if retina { "@2x" } else { "" });

    if !subdomains.is_empty() {
        let index = (tile.x as usize + tile.y as usize) % subdomains.len();
        url = url.replace("{s}", subdomains[index]);
    }
    url
}
