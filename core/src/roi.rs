//! Region of interest: the polygon(s) bounding an analysis, and the clipping
//! and masking operations that restrict grids to it.

use geo::{Area, BoundingRect, Contains, LineString, MultiPolygon, Point, Polygon, Rect};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::math::polygon::{self, Coord};
use crate::prelude::{SpillError, StageResult};
use crate::raster::{BinaryMask, Crs, Extent, GridGeometry, RasterGrid, MASK_NODATA};

/// Immutable analysis region: a multipolygon in the grid's CRS.
///
/// A cell belongs to the region when its centre does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionOfInterest {
    shape: MultiPolygon<f64>,
    crs: Crs,
}

impl RegionOfInterest {
    /// Builds a region from closed or open rings. A ring lying inside an
    /// earlier polygon becomes a hole of it; any other ring starts a new
    /// polygon, so an island inside a hole is kept.
    pub fn new(rings: Vec<Vec<Coord>>, crs: Crs) -> StageResult<Self> {
        let mut polygons: Vec<Polygon<f64>> = Vec::new();
        for (idx, ring) in rings.into_iter().enumerate() {
            let ring = validated_ring(idx, ring)?;
            let anchor = Point::from(ring.0[0]);
            match polygons.iter_mut().find(|p| p.contains(&anchor)) {
                Some(outer) => outer.interiors_push(ring),
                None => polygons.push(Polygon::new(ring, Vec::new())),
            }
        }
        Self::from_multi_polygon(MultiPolygon(polygons), crs)
    }

    /// Wraps an existing multipolygon after the same checks as [`Self::new`].
    pub fn from_multi_polygon(shape: MultiPolygon<f64>, crs: Crs) -> StageResult<Self> {
        if shape.0.is_empty() {
            return Err(SpillError::InvalidGeometry(
                "region of interest has no rings".into(),
            ));
        }
        for (idx, polygon) in shape.iter().enumerate() {
            let rings = std::iter::once(polygon.exterior()).chain(polygon.interiors());
            for ring in rings {
                validated_ring(idx, ring.coords().map(|c| [c.x, c.y]).collect())?;
            }
        }
        Ok(Self { shape, crs })
    }

    pub fn rectangle(min_x: f64, min_y: f64, max_x: f64, max_y: f64, crs: Crs) -> StageResult<Self> {
        Self::new(
            vec![vec![
                [min_x, min_y],
                [max_x, min_y],
                [max_x, max_y],
                [min_x, max_y],
            ]],
            crs,
        )
    }

    /// Rectangle covering the full extent of `geometry`.
    pub fn from_extent(geometry: &GridGeometry) -> Self {
        let e = geometry.extent();
        let rect = Rect::new([e.min_x, e.min_y], [e.max_x, e.max_y]);
        Self {
            shape: MultiPolygon(vec![rect.to_polygon()]),
            crs: geometry.crs(),
        }
    }

    pub fn shape(&self) -> &MultiPolygon<f64> {
        &self.shape
    }

    pub fn crs(&self) -> Crs {
        self.crs
    }

    pub fn extent(&self) -> Extent {
        match self.shape.bounding_rect() {
            Some(rect) => Extent {
                min_x: rect.min().x,
                min_y: rect.min().y,
                max_x: rect.max().x,
                max_y: rect.max().y,
            },
            None => Extent {
                min_x: f64::INFINITY,
                min_y: f64::INFINITY,
                max_x: f64::NEG_INFINITY,
                max_y: f64::NEG_INFINITY,
            },
        }
    }

    /// Planar area in squared CRS units, holes excluded.
    pub fn area(&self) -> f64 {
        self.shape.unsigned_area()
    }

    pub fn contains(&self, point: Coord) -> bool {
        self.shape.contains(&Point::from(point))
    }

    /// Fails unless the region shares a CRS with `geometry` and overlaps it.
    pub fn check_against(&self, geometry: &GridGeometry) -> StageResult<()> {
        if self.crs != geometry.crs() {
            return Err(SpillError::InvalidGeometry(format!(
                "region CRS {:?} differs from grid CRS {:?}",
                self.crs,
                geometry.crs()
            )));
        }
        if !self.extent().intersects(&geometry.extent()) {
            return Err(SpillError::InvalidGeometry(
                "region of interest does not intersect the grid extent".into(),
            ));
        }
        Ok(())
    }

    /// Per-cell membership, `true` where the cell centre lies inside.
    pub fn membership(&self, geometry: &GridGeometry) -> StageResult<Array2<bool>> {
        self.check_against(geometry)?;
        let (rows, cols) = geometry.shape();
        let transform = geometry.transform();
        let mut inside = Array2::from_elem((rows, cols), false);
        let mut crossings = Vec::new();

        for row in 0..rows {
            let [_, y] = transform.cell_center(row, 0);
            crossings.clear();
            for polygon in &self.shape {
                polygon::push_polygon_crossings(polygon, y, &mut crossings);
            }
            if crossings.is_empty() {
                continue;
            }
            crossings.sort_by(|a, b| a.total_cmp(b));
            for col in 0..cols {
                let [x, _] = transform.cell_center(row, col);
                if polygon::inside_scanline(&crossings, x) {
                    inside[[row, col]] = true;
                }
            }
        }
        Ok(inside)
    }

    /// Copy of `grid` with every cell outside the region set to no-data.
    pub fn clip(&self, grid: &RasterGrid) -> StageResult<RasterGrid> {
        let inside = self.membership(grid.geometry())?;
        let nodata = grid.nodata();
        let mut values = grid.values().clone();
        values.zip_mut_with(&inside, |v, &keep| {
            if !keep {
                *v = nodata;
            }
        });
        Ok(grid.derive(values))
    }

    /// Copy of `mask` with every cell outside the region set to no-data.
    pub fn restrict(&self, mask: &BinaryMask) -> StageResult<BinaryMask> {
        let inside = self.membership(mask.geometry())?;
        let mut cells = mask.cells().clone();
        cells.zip_mut_with(&inside, |v, &keep| {
            if !keep {
                *v = MASK_NODATA;
            }
        });
        Ok(BinaryMask::from_parts(mask.geometry().clone(), cells))
    }
}

/// Closed ring with finite vertices enclosing a non-zero area.
fn validated_ring(idx: usize, ring: Vec<Coord>) -> StageResult<LineString<f64>> {
    if ring.iter().flatten().any(|v| !v.is_finite()) {
        return Err(SpillError::InvalidGeometry(format!(
            "ring {} has non-finite coordinates",
            idx
        )));
    }
    let mut ring = LineString::from(ring);
    ring.close();
    if ring.0.len() < 4 {
        return Err(SpillError::InvalidGeometry(format!(
            "ring {} needs at least 3 vertices",
            idx
        )));
    }
    if Polygon::new(ring.clone(), Vec::new()).unsigned_area() == 0.0 {
        return Err(SpillError::InvalidGeometry(format!(
            "ring {} encloses no area",
            idx
        )));
    }
    Ok(ring)
}
