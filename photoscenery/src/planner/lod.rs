//! Level-of-detail policy.
//!
//! Maps a tile's distance from the focal point to a size tier, and a size
//! tier to pixel dimensions and the sub-image grid needed to fetch them.

use std::fmt;

use crate::coord::feet_to_nm;

/// Tiles closer than this to the focal point keep the requested tier.
pub const ORIGIN_TILE_DISTANCE_NM: f64 = 0.1;

/// Relative distance under which tiles get at most tier 5.
pub const NEAR_RELATIVE_DISTANCE: f64 = 0.1;

/// Relative distance under which tiles get at most tier 4.
pub const MEDIUM_RELATIVE_DISTANCE: f64 = 0.3;

/// Highest tier that can be requested (32768 px).
pub const MAX_REQUESTED_TIER: u8 = 6;

/// Highest tier with a resolution table entry.
pub const MAX_TABLE_TIER: u8 = 5;

/// Latitude up to which tiles are square in pixels.
pub const SQUARE_ASPECT_MAX_LAT: f64 = 22.5;

/// Widths and grid sizes per tier; the 2:1 table halves the height.
const TIER_TABLE: [(u32, u32); 6] = [
    (512, 1),
    (1024, 1),
    (2048, 1),
    (4096, 2),
    (8192, 4),
    (16384, 8),
];

/// Pixel dimensions of a tile and how many cells per axis fetch them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileResolution {
    pub pixel_w: u32,
    pub pixel_h: u32,
    /// Sub-image cells per axis (1, 2, 4 or 8)
    pub grid_size: u32,
}

impl TileResolution {
    /// Resolution of `tier` at latitude `lat`. Tiers above 5 use tier 5.
    ///
    /// # Example
    ///
    /// ```
    /// use photoscenery::planner::TileResolution;
    ///
    /// let r = TileResolution::for_tier(3, 45.0);
    /// assert_eq!((r.pixel_w, r.pixel_h, r.grid_size), (4096, 2048, 2));
    /// ```
    pub fn for_tier(tier: u8, lat: f64) -> Self {
        let (width, grid_size) = TIER_TABLE[tier.min(MAX_TABLE_TIER) as usize];
        let pixel_h = if lat.abs() <= SQUARE_ASPECT_MAX_LAT {
            width
        } else {
            width / 2
        };
        Self {
            pixel_w: width,
            pixel_h,
            grid_size,
        }
    }

    /// Width of one sub-image cell.
    pub fn cell_w(&self) -> u32 {
        self.pixel_w / self.grid_size
    }

    /// Height of one sub-image cell.
    pub fn cell_h(&self) -> u32 {
        self.pixel_h / self.grid_size
    }
}

impl fmt::Display for TileResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{} ({}x{} grid)",
            self.pixel_w, self.pixel_h, self.grid_size, self.grid_size
        )
    }
}

/// Requested tier range after the downgrade counter has been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LodPolicy {
    size: u8,
    size_down: u8,
}

impl LodPolicy {
    /// Build a policy from the requested tier, floor tier and the number of
    /// downgrades earned by earlier incomplete runs.
    ///
    /// A floor above the requested tier is lowered to it. A non-zero
    /// downgrade lowers both by that many tiers, within `[0, 5]`.
    pub fn new(size: u8, size_down: u8, downgrade: u32) -> Self {
        let size = size.min(MAX_REQUESTED_TIER);
        let size_down = size_down.min(size);
        if downgrade == 0 {
            return Self { size, size_down };
        }
        let lower = |tier: u8| -> u8 {
            (tier as i64 - downgrade as i64).clamp(0, MAX_TABLE_TIER as i64) as u8
        };
        Self {
            size: lower(size),
            size_down: lower(size_down),
        }
    }

    pub fn size(&self) -> u8 {
        self.size
    }

    pub fn size_down(&self) -> u8 {
        self.size_down
    }

    /// Tier for a tile `distance_nm` away from the focal point.
    ///
    /// `relDist = sqrt(distance² + altitude²) / radius`, with the altitude
    /// taken from the live position when there is one.
    pub fn resolve_tier(&self, distance_nm: f64, altitude_ft: f64, radius_nm: f64) -> u8 {
        // A degenerate region has no radius to grade against
        if distance_nm < ORIGIN_TILE_DISTANCE_NM || radius_nm <= 0.0 {
            return self.size;
        }

        let altitude_nm = feet_to_nm(altitude_ft);
        let relative = (distance_nm * distance_nm + altitude_nm * altitude_nm).sqrt() / radius_nm;

        if relative < NEAR_RELATIVE_DISTANCE {
            self.size.min(5)
        } else if relative < MEDIUM_RELATIVE_DISTANCE {
            self.size.min(4)
        } else {
            let span = (self.size - self.size_down) as f64;
            let tier = (self.size as f64 - span * relative).round_ties_even();
            tier.clamp(self.size_down as f64, self.size as f64) as u8
        }
    }

    /// Tier and resolution in one step.
    pub fn resolve(
        &self,
        distance_nm: f64,
        altitude_ft: f64,
        radius_nm: f64,
        lat: f64,
    ) -> (u8, TileResolution) {
        let tier = self.resolve_tier(distance_nm, altitude_ft, radius_nm);
        (tier, TileResolution::for_tier(tier, lat))
    }
}
