use serde::{Deserialize, Serialize};

use crate::math::geodesy;
use crate::prelude::{SpillError, StageResult};

/// Coordinate reference system of a grid or region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Crs {
    /// WGS84 longitude/latitude in degrees.
    Geographic,
    /// Universal Transverse Mercator, metres.
    Utm { zone: u8, north: bool },
    /// Any area-preserving planar projection in metres (e.g. EPSG:6933).
    EqualArea { epsg: u32 },
}

impl Crs {
    pub fn is_geographic(&self) -> bool {
        matches!(self, Crs::Geographic)
    }

    fn validate(&self) -> StageResult<()> {
        match *self {
            Crs::Utm { zone, .. } if !(1..=60).contains(&zone) => Err(
                SpillError::InvalidParameter(format!("UTM zone {} out of range 1..=60", zone)),
            ),
            _ => Ok(()),
        }
    }
}

/// Affine mapping from lattice vertices to ground coordinates.
///
/// Vertex `(col, row) = (0, 0)` is the outer corner of the first cell; a
/// north-up grid has a negative `pixel_height`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub origin_y: f64,
    pub pixel_width: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    pub fn north_up(origin_x: f64, origin_y: f64, cell_size: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            pixel_width: cell_size,
            pixel_height: -cell_size,
        }
    }

    pub fn vertex(&self, col: f64, row: f64) -> [f64; 2] {
        [
            self.origin_x + col * self.pixel_width,
            self.origin_y + row * self.pixel_height,
        ]
    }

    pub fn cell_center(&self, row: usize, col: usize) -> [f64; 2] {
        self.vertex(col as f64 + 0.5, row as f64 + 0.5)
    }
}

/// Axis-aligned bounds in ground coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Extent {
    pub fn intersects(&self, other: &Extent) -> bool {
        self.min_x < other.max_x
            && other.min_x < self.max_x
            && self.min_y < other.max_y
            && other.min_y < self.max_y
    }
}

/// Size, georeferencing, and CRS shared by every grid derived from one source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridGeometry {
    width: usize,
    height: usize,
    transform: GeoTransform,
    crs: Crs,
}

impl GridGeometry {
    pub fn new(width: usize, height: usize, transform: GeoTransform, crs: Crs) -> StageResult<Self> {
        if width == 0 || height == 0 {
            return Err(SpillError::InvalidParameter(format!(
                "grid must be non-empty, got {}x{}",
                width, height
            )));
        }
        let finite = [
            transform.origin_x,
            transform.origin_y,
            transform.pixel_width,
            transform.pixel_height,
        ]
        .iter()
        .all(|v| v.is_finite());
        if !finite || transform.pixel_width == 0.0 || transform.pixel_height == 0.0 {
            return Err(SpillError::InvalidParameter(
                "geotransform needs finite, non-zero pixel sizes".into(),
            ));
        }
        crs.validate()?;

        let geometry = Self {
            width,
            height,
            transform,
            crs,
        };
        if crs.is_geographic() {
            let extent = geometry.extent();
            if extent.min_y < -90.0 || extent.max_y > 90.0 {
                return Err(SpillError::InvalidParameter(
                    "geographic grid extends beyond the poles".into(),
                ));
            }
        }
        Ok(geometry)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// `(rows, cols)`, matching the `ndarray` shape of grid values.
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    pub fn cell_count(&self) -> usize {
        self.width * self.height
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    pub fn crs(&self) -> Crs {
        self.crs
    }

    pub fn extent(&self) -> Extent {
        let [x0, y0] = self.transform.vertex(0.0, 0.0);
        let [x1, y1] = self.transform.vertex(self.width as f64, self.height as f64);
        Extent {
            min_x: x0.min(x1),
            min_y: y0.min(y1),
            max_x: x0.max(x1),
            max_y: y0.max(y1),
        }
    }

    /// Nominal ground size `(x, y)` of one cell in metres.
    ///
    /// Geographic grids are measured at their centre latitude.
    pub fn ground_cell_size(&self) -> (f64, f64) {
        let dx = self.transform.pixel_width.abs();
        let dy = self.transform.pixel_height.abs();
        match self.crs {
            Crs::Geographic => {
                let extent = self.extent();
                let lat = 0.5 * (extent.min_y + extent.max_y);
                (
                    dx * geodesy::metres_per_degree_lon(lat),
                    dy * geodesy::metres_per_degree_lat(lat),
                )
            }
            Crs::Utm { .. } | Crs::EqualArea { .. } => (dx, dy),
        }
    }

    /// True ground area of cell `(row, col)` in square metres.
    pub fn cell_area(&self, row: usize, col: usize) -> f64 {
        let t = &self.transform;
        match self.crs {
            Crs::Geographic => {
                let [_, lat_a] = t.vertex(0.0, row as f64);
                let [_, lat_b] = t.vertex(0.0, row as f64 + 1.0);
                geodesy::quadrangle_area(t.pixel_width, lat_a, lat_b)
            }
            Crs::Utm { .. } => {
                let [easting, _] = t.cell_center(row, col);
                let k = geodesy::utm_scale_factor(easting);
                (t.pixel_width * t.pixel_height).abs() / (k * k)
            }
            Crs::EqualArea { .. } => (t.pixel_width * t.pixel_height).abs(),
        }
    }
}
