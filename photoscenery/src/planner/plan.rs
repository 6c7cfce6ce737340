//! Region to tile-list planning.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::coord::{round_to, GeoPoint, PositionSample};
use crate::geodesy;
use crate::tile::{tile_width, CellName, TileBounds, TileId, ROW_HEIGHT_DEG};

use super::lod::{LodPolicy, TileResolution};
use super::region::NormalizedRegion;

/// One tile to fetch, with the resolution chosen for it.
///
/// Immutable: re-tiering builds a new item.
#[derive(Debug, Clone, PartialEq)]
pub struct TileWorkItem {
    pub id: TileId,
    pub bounds: TileBounds,
    /// Half the midpoint distance to the focal point, in nm
    pub distance_nm: f64,
    pub tier: u8,
    pub resolution: TileResolution,
}

impl TileWorkItem {
    pub fn pixel_w(&self) -> u32 {
        self.resolution.pixel_w
    }

    pub fn pixel_h(&self) -> u32 {
        self.resolution.pixel_h
    }

    pub fn grid_size(&self) -> u32 {
        self.resolution.grid_size
    }

    /// Copy of this item with a different distance and tier.
    pub fn with_lod(&self, distance_nm: f64, tier: u8, resolution: TileResolution) -> Self {
        Self {
            distance_nm,
            tier,
            resolution,
            ..self.clone()
        }
    }
}

/// Planner output: tiles nearest-first, focal tile leading.
#[derive(Debug, Clone)]
pub struct TilePlan {
    pub items: Vec<TileWorkItem>,
    /// The requested box is smaller than a full 1° cell
    pub is_subregion: bool,
    pub region: NormalizedRegion,
    /// Candidates dropped because they could not be addressed
    pub skipped: usize,
}

impl TilePlan {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = TileId> + '_ {
        self.items.iter().map(|item| item.id)
    }

    /// For a sub-degree region, the 1° cell whose full set of sub-tiles
    /// decides completeness: the cell holding the region's lower-left corner.
    pub fn completeness_cell(&self) -> Option<CellName> {
        if !self.is_subregion {
            return None;
        }
        let bbox = self.region.bbox;
        CellName::new(bbox.lat_ll.floor() as i32, bbox.lon_ll.floor() as i32).ok()
    }
}

/// Turns a normalised region into an ordered list of [`TileWorkItem`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionPlanner {
    size: u8,
    size_down: u8,
}

fn wrap_lon(lon: f64) -> f64 {
    if lon >= 180.0 {
        lon - 360.0
    } else {
        lon
    }
}

/// Midpoint distance from `focus` to a tile, halved and rounded to 0.001 nm.
fn tile_distance_nm(focus: &GeoPoint, lat: f64, lon: f64) -> Result<f64, geodesy::GeodesyError> {
    let nm = geodesy::distance_nm(lon, lat, focus.lon(), focus.lat())?;
    Ok(round_to(nm / 2.0, 3))
}

/// Distance fed to the LOD policy: zero for the tile under the focal point.
fn lod_distance(bounds: &TileBounds, focal: &GeoPoint, distance_nm: f64) -> f64 {
    if bounds.contains(focal.lat(), focal.lon()) {
        0.0
    } else {
        distance_nm
    }
}

impl RegionPlanner {
    /// Planner for requested tier `size` (0..=6) with floor tier `size_down`.
    pub fn new(size: u8, size_down: u8) -> Self {
        Self { size, size_down }
    }

    pub fn size(&self) -> u8 {
        self.size
    }

    pub fn size_down(&self) -> u8 {
        self.size_down
    }

    /// Plan every tile touching the region.
    ///
    /// `focus` is the live position if one is tracked; otherwise the region
    /// centre is the focal point. `downgrade` is the number of tiers to
    /// drop after earlier incomplete runs.
    pub fn plan(
        &self,
        region: &NormalizedRegion,
        focus: Option<PositionSample>,
        downgrade: u32,
    ) -> TilePlan {
        self.plan_filtered(region, focus, downgrade, None)
    }

    /// Like [`plan`](Self::plan), keeping only the ids in `only` when given.
    pub fn plan_filtered(
        &self,
        region: &NormalizedRegion,
        focus: Option<PositionSample>,
        downgrade: u32,
        only: Option<&HashSet<TileId>>,
    ) -> TilePlan {
        let policy = LodPolicy::new(self.size, self.size_down, downgrade);
        let (focal, altitude_ft) = match focus {
            Some(sample) => (sample.point, sample.altitude_ft),
            None => (region.center, 0.0),
        };
        let bbox = region.bbox;

        let mut candidates = Vec::new();
        let mut skipped = 0;

        let row_start = (bbox.lat_ll / ROW_HEIGHT_DEG).floor() as i64;
        let row_end = (bbox.lat_ur / ROW_HEIGHT_DEG).ceil() as i64;
        for row in row_start..row_end.max(row_start + 1) {
            let lat_min = row as f64 * ROW_HEIGHT_DEG;
            let lat_center = lat_min + ROW_HEIGHT_DEG / 2.0;
            let width = tile_width(lat_center);

            let col_start = (bbox.lon_ll / width).floor() as i64;
            let col_end = (bbox.lon_ur / width).ceil() as i64;
            for col in col_start..col_end.max(col_start + 1) {
                let lon_min = col as f64 * width;
                // Sample inside the first degree of the bucket so wide polar
                // tiles are addressed by their bucket origin
                let sample_lon = wrap_lon(lon_min + width.min(1.0) / 2.0);
                let id = match TileId::encode(lat_center, sample_lon) {
                    Ok(id) => id,
                    Err(e) => {
                        warn!(lat = lat_center, lon = sample_lon, error = %e, "Skipping unaddressable tile");
                        skipped += 1;
                        continue;
                    }
                };
                if only.is_some_and(|set| !set.contains(&id)) {
                    continue;
                }

                let mid_lon = wrap_lon(lon_min + width / 2.0);
                let distance_nm = match tile_distance_nm(&focal, lat_center, mid_lon) {
                    Ok(d) => d,
                    Err(e) => {
                        warn!(tile = %id, error = %e, "Skipping tile with no distance");
                        skipped += 1;
                        continue;
                    }
                };

                let bounds = id.bounds();
                let (tier, resolution) = policy.resolve(
                    lod_distance(&bounds, &focal, distance_nm),
                    altitude_ft,
                    region.radius_nm,
                    lat_min,
                );
                candidates.push(TileWorkItem {
                    id,
                    bounds,
                    distance_nm,
                    tier,
                    resolution,
                });
            }
        }

        let items = order_candidates(candidates, &focal);
        let is_subregion = bbox.lat_span() < 1.0 || bbox.lon_span() < 1.0;

        debug!(
            tiles = items.len(),
            skipped,
            is_subregion,
            size = policy.size(),
            size_down = policy.size_down(),
            "Planned region"
        );

        TilePlan {
            items,
            is_subregion,
            region: *region,
            skipped,
        }
    }

    /// Recompute an item's distance and tier against a newer focal sample.
    ///
    /// Used right before a tile is fetched, so a moving focal point only
    /// affects tiles that have not been committed yet.
    pub fn retier(
        &self,
        item: &TileWorkItem,
        region: &NormalizedRegion,
        focus: Option<PositionSample>,
        downgrade: u32,
    ) -> TileWorkItem {
        let policy = LodPolicy::new(self.size, self.size_down, downgrade);
        let (focal, altitude_ft) = match focus {
            Some(sample) => (sample.point, sample.altitude_ft),
            None => (region.center, 0.0),
        };
        let (lat, lon) = item.bounds.center();
        let distance_nm = tile_distance_nm(&focal, lat, lon).unwrap_or(item.distance_nm);
        let (tier, resolution) = policy.resolve(
            lod_distance(&item.bounds, &focal, distance_nm),
            altitude_ft,
            region.radius_nm,
            item.bounds.lat_min,
        );
        item.with_lod(distance_nm, tier, resolution)
    }
}

/// Sort nearest-first, drop repeated ids, and lead with the focal tile.
fn order_candidates(mut candidates: Vec<TileWorkItem>, focal: &GeoPoint) -> Vec<TileWorkItem> {
    candidates.sort_by(|a, b| {
        a.distance_nm
            .total_cmp(&b.distance_nm)
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut seen = HashSet::with_capacity(candidates.len());
    let mut items: Vec<TileWorkItem> = Vec::with_capacity(candidates.len());
    for item in candidates {
        if seen.insert(item.id) {
            items.push(item);
        }
    }

    if let Some(pos) = items
        .iter()
        .position(|item| item.bounds.contains(focal.lat(), focal.lon()))
    {
        let focal_tile = items.remove(pos);
        items.insert(0, focal_tile);
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::RegionQuery;

    fn point(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint::new(lat, lon).unwrap()
    }

    fn polar(lat: f64, lon: f64, radius: f64) -> NormalizedRegion {
        RegionQuery::polar(point(lat, lon), radius)
            .unwrap()
            .normalize()
            .unwrap()
    }

    #[test]
    fn test_focal_tile_leads() {
        let region = polar(-29.94, -44.9, 5.0);
        let plan = RegionPlanner::new(5, 0).plan(&region, None, 0);

        assert!(!plan.is_empty());
        let first = &plan.items[0];
        assert_eq!(first.id, TileId::encode(-29.94, -44.9).unwrap());
        assert!(first.bounds.contains(-29.94, -44.9));
        assert_eq!(first.tier, 5);
    }

    #[test]
    fn test_items_sorted_and_unique() {
        let region = polar(45.3, 7.6, 10.0);
        let plan = RegionPlanner::new(4, 1).plan(&region, None, 0);

        let ids: HashSet<_> = plan.ids().collect();
        assert_eq!(ids.len(), plan.len());
        for pair in plan.items[1..].windows(2) {
            assert!(pair[0].distance_nm <= pair[1].distance_nm);
        }
    }

    #[test]
    fn test_plan_covers_box() {
        let region = RegionQuery::bounding_box(point(10.0, 20.0), point(10.25, 20.25))
            .unwrap()
            .normalize()
            .unwrap();
        let plan = RegionPlanner::new(2, 0).plan(&region, None, 0);
        // 2 rows x 2 columns of 0.125° tiles
        assert_eq!(plan.len(), 4);
        assert!(plan.is_subregion);
        assert_eq!(plan.completeness_cell().unwrap().to_string(), "e020n10");
        assert_eq!(plan.skipped, 0);
        for item in &plan.items {
            assert_eq!(item.bounds.width(), 0.125);
            assert_eq!(item.resolution.pixel_w, item.resolution.pixel_h);
        }
    }

    #[test]
    fn test_degenerate_box_grades_every_tile_at_size() {
        // A box this small has a diagonal that rounds to 0 nm
        let region = RegionQuery::bounding_box(point(9.999995, 19.999995), point(10.000005, 20.000005))
            .unwrap()
            .normalize()
            .unwrap();
        assert_eq!(region.radius_nm, 0.0);
        let plan = RegionPlanner::new(3, 0).plan(&region, None, 0);
        assert!(plan.len() > 1);
        assert!(plan.items.iter().all(|item| item.tier == 3));
    }

    #[test]
    fn test_full_degree_box_is_not_subregion() {
        let region = RegionQuery::bounding_box(point(50.0, 5.0), point(51.0, 6.0))
            .unwrap()
            .normalize()
            .unwrap();
        let plan = RegionPlanner::new(1, 0).plan(&region, None, 0);
        assert!(!plan.is_subregion);
        assert_eq!(plan.completeness_cell(), None);
        // 8 rows x 4 columns of 0.25° tiles
        assert_eq!(plan.len(), 32);
    }

    #[test]
    fn test_tiers_fall_off_with_distance() {
        let region = polar(0.05, 0.05, 20.0);
        let plan = RegionPlanner::new(5, 0).plan(&region, None, 0);
        let nearest = plan.items.first().unwrap();
        let farthest = plan.items.last().unwrap();
        assert!(nearest.tier >= farthest.tier);
        assert!(farthest.tier < 5);
    }

    #[test]
    fn test_live_focus_overrides_center() {
        let region = polar(45.3, 7.6, 10.0);
        let focus = PositionSample::at(point(45.4, 7.7));
        let plan = RegionPlanner::new(3, 0).plan(&region, Some(focus), 0);
        assert!(plan.items[0].bounds.contains(45.4, 7.7));
    }

    #[test]
    fn test_downgrade_lowers_focal_tier() {
        let region = polar(45.3, 7.6, 10.0);
        let plan = RegionPlanner::new(5, 0).plan(&region, None, 2);
        assert_eq!(plan.items[0].tier, 3);
    }

    #[test]
    fn test_filtered_plan() {
        let region = polar(45.3, 7.6, 10.0);
        let planner = RegionPlanner::new(3, 0);
        let full = planner.plan(&region, None, 0);
        let keep: HashSet<TileId> = full.ids().skip(2).take(3).collect();
        let filtered = planner.plan_filtered(&region, None, 0, Some(&keep));
        assert_eq!(filtered.len(), 3);
        assert!(filtered.ids().all(|id| keep.contains(&id)));
    }

    #[test]
    fn test_retier_builds_new_item() {
        let region = polar(45.3, 7.6, 10.0);
        let planner = RegionPlanner::new(5, 0);
        let plan = planner.plan(&region, None, 0);
        let far = plan.items.last().unwrap().clone();

        // Moving onto the far tile gives it full resolution
        let (lat, lon) = far.bounds.center();
        let focus = PositionSample::at(point(lat, lon));
        let updated = planner.retier(&far, &region, Some(focus), 0);
        assert_eq!(updated.id, far.id);
        assert_eq!(updated.tier, 5);
        assert!(updated.distance_nm < far.distance_nm);
    }

    #[test]
    fn test_polar_cap_plans_without_panicking() {
        let region = polar(89.5, 10.0, 20.0);
        let plan = RegionPlanner::new(1, 0).plan(&region, None, 0);
        assert!(!plan.is_empty());
        assert!(plan.items.iter().all(|item| item.bounds.width() >= 4.0));
    }
}
