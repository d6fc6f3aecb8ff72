use std::collections::HashMap;

use log::warn;
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;
use walkers::Position;

use crate::errors::error_types::ErrorTypes;

/// Placeholders every overlay tile template must carry.
const REQUIRED_PLACEHOLDERS: [&str; 3] = ["{z}", "{x}", "{y}"];

/// A geographic coordinate, stored in the dataset as a `[lat, lon]` array.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Reads a `[lat, lon]` pair. Anything else (wrong length, `null`,
    /// non-numeric members) gives `None`.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value.as_array()?.as_slice() {
            [lat, lon] => Some(Coordinate::new(lat.as_f64()?, lon.as_f64()?)),
            _ => None,
        }
    }

    /// Whether both components are finite and inside the WGS-84 ranges.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }

    pub fn to_position(self) -> Position {
        Position::from_lon_lat(self.lon, self.lat)
    }

    pub fn from_position(position: Position) -> Self {
        Self {
            lat: position.lat(),
            lon: position.lon(),
        }
    }
}

/// The document as served, before entries are checked one by one.
#[derive(Deserialize)]
struct RawDataset {
    ski_areas: HashMap<String, Value>,
    tile_url: String,
}

/// The document served at `map_data.json`.
#[derive(Debug, Clone, PartialEq)]
pub struct SkiDataset {
    pub ski_areas: HashMap<String, Coordinate>,
    pub tile_url: String,
}

impl SkiDataset {
    /// Parses and validates a dataset from raw JSON bytes.
    ///
    /// # Arguments
    /// * `bytes` - The response body or file contents.
    ///
    /// # Returns
    /// The validated dataset, or an error if the body is not a dataset document
    /// or its tile template is unusable. Malformed entries are dropped.
    pub fn from_json(bytes: &[u8]) -> Result<Self, ErrorTypes> {
        let raw: RawDataset = serde_json::from_slice(bytes)
            .map_err(|e| ErrorTypes::new(105, format!("Failed to parse map data: {}", e)))?;

        let ski_areas = raw
            .ski_areas
            .into_iter()
            .filter_map(|(name, value)| match Coordinate::from_json(&value) {
                Some(coordinate) => Some((name, coordinate)),
                None => {
                    warn!("Dropping ski area {:?}: expected [lat, lon], got {}", name, value);
                    None
                }
            })
            .collect();

        SkiDataset {
            ski_areas,
            tile_url: raw.tile_url,
        }
        .validate()
    }

    /// Drops entries with out-of-range coordinates and rejects tile templates
    /// missing a required placeholder.
    pub fn validate(mut self) -> Result<Self, ErrorTypes> {
        if let Some(missing) = REQUIRED_PLACEHOLDERS
            .iter()
            .find(|placeholder| !self.tile_url.contains(*placeholder))
        {
            return Err(ErrorTypes::new(
                106,
                format!(
                    "Tile url template {:?} is missing {}",
                    self.tile_url, missing
                ),
            ));
        }

        self.ski_areas.retain(|name, coordinate| {
            let valid = coordinate.is_valid();
            if !valid {
                warn!(
                    "Dropping ski area {:?}: invalid coordinate [{}, {}]",
                    name, coordinate.lat, coordinate.lon
                );
            }
            valid
        });

        Ok(self)
    }

    /// Resolves a relative tile template (`/tiles/{z}/...` or `tiles/{z}/...`)
    /// against the URL the dataset was fetched from.
    ///
    /// Only the part before the first placeholder goes through URL resolution,
    /// so the `{..}` placeholders are kept as written. Credentials of the
    /// dataset URL are not carried over. Absolute templates come out
    /// unchanged, and datasets read from disk (`dataset_url` is `None`) are
    /// left alone.
    pub fn resolve_tile_url(&mut self, dataset_url: Option<&str>) {
        let Some(mut base) = dataset_url.and_then(|url| Url::parse(url).ok()) else {
            return;
        };
        let _ = base.set_username("");
        let _ = base.set_password(None);

        let split = self.tile_url.find('{').unwrap_or(self.tile_url.len());
        let (fixed, placeholders) = self.tile_url.split_at(split);
        let fixed = if fixed.is_empty() { "./" } else { fixed };

        match base.join(fixed) {
            Ok(resolved) => self.tile_url = format!("{}{}", resolved, placeholders),
            Err(e) => warn!("Leaving tile url {:?} unresolved: {}", self.tile_url, e),
        }
    }

    pub fn len(&self) -> usize {
        self.ski_areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ski_areas.is_empty()
    }
}
