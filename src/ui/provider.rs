use walkers::sources::{Attribution, TileSource};
use walkers::TileId;

use crate::ui::tiles::expand_template;

const CARTO_LIGHT_TEMPLATE: &str = "https://{s}.basemaps.cartocdn.com/light_all/{z}/{x}/{y}{r}.png";
const CARTO_SUBDOMAINS: [&str; 4] = ["a", "b", "c", "d"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Enum representing the available base maps.
pub enum Provider {
    CartoLight,
    OpenStreetMap,
}

impl Provider {
    pub const ALL: [Provider; 2] = [Provider::CartoLight, Provider::OpenStreetMap];

    pub fn name(&self) -> &'static str {
        match self {
            Provider::CartoLight => "CARTO Light",
            Provider::OpenStreetMap => "OpenStreetMap",
        }
    }
}

/// CARTO's light basemap, served from four subdomains.
#[derive(Debug, Clone, Copy, Default)]
pub struct CartoLight {
    /// Request `@2x` tiles for high-DPI displays.
    pub retina: bool,
}

impl TileSource for CartoLight {
    fn tile_url(&self, tile_id: TileId) -> String {
        expand_template(CARTO_LIGHT_TEMPLATE, tile_id, self.retina, &CARTO_SUBDOMAINS)
    }

    fn attribution(&self) -> Attribution {
        Attribution {
            text: "© OpenStreetMap contributors © CARTO",
            url: "https://carto.com/attributions",
            logo_light: None,
            logo_dark: None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_carto_urls_rotate_subdomains() {
        let source = CartoLight { retina: false };
        assert_eq!(
            source.tile_url(TileId { x: 0, y: 0, zoom: 1 }),
            "https://a.basemaps.cartocdn.com/light_all/1/0/0.png"
        );
        assert_eq!(
            source.tile_url(TileId { x: 1, y: 1, zoom: 1 }),
            "https://c.basemaps.cartocdn.com/light_all/1/1/1.png"
        );

        let retina = CartoLight { retina: true };
        assert_eq!(
            retina.tile_url(TileId { x: 35, y: 22, zoom: 6 }),
            "https://b.basemaps.cartocdn.com/light_all/6/35/22@2x.png"
        );
    }
}
