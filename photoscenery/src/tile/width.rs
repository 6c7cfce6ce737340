//! Longitude width of a tile as a function of latitude.

/// Longitude span of a tile, in degrees, at `lat`.
///
/// A step function of `|lat|`: 12° at the poles shrinking to 0.125° around
/// the equator, so tiles keep a roughly constant ground width.
pub fn tile_width(lat: f64) -> f64 {
    match lat.abs() {
        l if l >= 89.0 => 12.0,
        l if l >= 86.0 => 4.0,
        l if l >= 83.0 => 2.0,
        l if l >= 76.0 => 1.0,
        l if l >= 62.0 => 0.5,
        l if l > 22.0 => 0.25,
        _ => 0.125,
    }
}

/// Number of tile columns in one degree of longitude at `lat`.
///
/// Tiles wider than a degree still count as one column.
pub fn columns_per_degree(lat: f64) -> u32 {
    let width = tile_width(lat);
    if width >= 1.0 {
        1
    } else {
        (1.0 / width).round() as u32
    }
}
