use walkers::Position;

/// Zoom level of the initial view.
pub const HOME_ZOOM: f64 = 6.0;

/// Returns the center of the initial view, over the Alps and the Carpathian basin.
///
/// # Returns
///
/// A `Position` struct with the coordinates the map opens at.
pub fn home() -> Position {
    Position::from_lon_lat(16.01, 47.85)
}
