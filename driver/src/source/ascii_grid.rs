//! ESRI ASCII grid (`.asc`) reader.

use anyhow::{bail, Context};
use log::info;
use ndarray::Array2;
use spillcore::interface::{RasterSource, SourceRequest};
use spillcore::{Crs, GeoTransform, GridGeometry, RasterGrid};
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_NODATA: f32 = -9999.0;

/// Raster source reading one ASCII grid from disk.
pub struct AsciiGridSource {
    path: PathBuf,
    crs: Crs,
}

impl AsciiGridSource {
    pub fn new<P: AsRef<Path>>(path: P, crs: Crs) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            crs,
        }
    }
}

impl RasterSource for AsciiGridSource {
    type Error = anyhow::Error;

    fn fetch(&self, request: &SourceRequest<'_>) -> anyhow::Result<RasterGrid> {
        info!(
            "reading layer {} from {}",
            request.layer,
            self.path.display()
        );
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("reading ASCII grid {}", self.path.display()))?;
        parse_ascii_grid(&contents, self.crs)
            .with_context(|| format!("parsing ASCII grid {}", self.path.display()))
    }
}

#[derive(Default)]
struct Header {
    ncols: Option<usize>,
    nrows: Option<usize>,
    x_corner: Option<f64>,
    y_corner: Option<f64>,
    x_center: Option<f64>,
    y_center: Option<f64>,
    cell_size: Option<f64>,
    nodata: Option<f32>,
}

pub fn parse_ascii_grid(contents: &str, crs: Crs) -> anyhow::Result<RasterGrid> {
    let mut header = Header::default();
    let mut lines = contents.lines().peekable();

    while let Some(&line) = lines.peek() {
        let mut parts = line.split_whitespace();
        let key = match parts.next() {
            // The body starts at the first line that opens with a number,
            // including `nan`/`inf` spellings.
            Some(key) if key.parse::<f32>().is_err() => key.to_ascii_lowercase(),
            Some(_) => break,
            None => {
                lines.next();
                continue;
            }
        };
        let value = parts
            .next()
            .with_context(|| format!("header key {} has no value", key))?;
        match key.as_str() {
            "ncols" => header.ncols = Some(value.parse().context("parsing ncols")?),
            "nrows" => header.nrows = Some(value.parse().context("parsing nrows")?),
            "xllcorner" => header.x_corner = Some(value.parse().context("parsing xllcorner")?),
            "yllcorner" => header.y_corner = Some(value.parse().context("parsing yllcorner")?),
            "xllcenter" => header.x_center = Some(value.parse().context("parsing xllcenter")?),
            "yllcenter" => header.y_center = Some(value.parse().context("parsing yllcenter")?),
            "cellsize" => header.cell_size = Some(value.parse().context("parsing cellsize")?),
            "nodata_value" => header.nodata = Some(value.parse().context("parsing NODATA_value")?),
            other => bail!("unknown header key {}", other),
        }
        lines.next();
    }

    let ncols = header.ncols.context("missing ncols")?;
    let nrows = header.nrows.context("missing nrows")?;
    let cell_size = header.cell_size.context("missing cellsize")?;
    let x_left = match (header.x_corner, header.x_center) {
        (Some(x), _) => x,
        (None, Some(x)) => x - 0.5 * cell_size,
        (None, None) => bail!("missing xllcorner/xllcenter"),
    };
    let y_bottom = match (header.y_corner, header.y_center) {
        (Some(y), _) => y,
        (None, Some(y)) => y - 0.5 * cell_size,
        (None, None) => bail!("missing yllcorner/yllcenter"),
    };
    let nodata = header.nodata.unwrap_or(DEFAULT_NODATA);
    let cell_total = ncols
        .checked_mul(nrows)
        .with_context(|| format!("{} x {} grid overflows", ncols, nrows))?;

    let values = lines
        .flat_map(str::split_whitespace)
        .map(|token| {
            token
                .parse::<f32>()
                .with_context(|| format!("parsing cell value {}", token))
        })
        .collect::<anyhow::Result<Vec<f32>>>()?;
    if values.len() != cell_total {
        bail!(
            "expected {} cell values, found {}",
            cell_total,
            values.len()
        );
    }

    let transform = GeoTransform::north_up(x_left, y_bottom + nrows as f64 * cell_size, cell_size);
    let geometry = GridGeometry::new(ncols, nrows, transform, crs)?;
    let values = Array2::from_shape_vec((nrows, ncols), values)?;
    Ok(RasterGrid::new(geometry, values, nodata)?)
}
