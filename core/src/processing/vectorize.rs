//! Raster-to-vector conversion of binary masks.
//!
//! Components are labelled with an explicit-stack flood fill, then the outer
//! boundary of each component is walked along cell edges starting from its
//! first cell in raster order. Interior holes are not reported.

use geo::orient::{Direction, Orient};
use geo::{Area, Contains, LineString, Point, Polygon};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::math::polygon::{self, Coord};
use crate::math::stats::CompensatedSum;
use crate::prelude::{ProcessingStage, SpillError, StageResult};
use crate::raster::{BinaryMask, GridGeometry};
use crate::telemetry::log::LogManager;

/// Neighbourhood rule linking flagged cells into components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Adjacency {
    #[default]
    Four,
    Eight,
}

impl Adjacency {
    fn offsets(self) -> &'static [(isize, isize)] {
        match self {
            Adjacency::Four => &[(-1, 0), (0, -1), (0, 1), (1, 0)],
            Adjacency::Eight => &[
                (-1, -1),
                (-1, 0),
                (-1, 1),
                (0, -1),
                (0, 1),
                (1, -1),
                (1, 0),
                (1, 1),
            ],
        }
    }
}

impl FromStr for Adjacency {
    type Err = SpillError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "four" | "4" => Ok(Self::Four),
            "eight" | "8" => Ok(Self::Eight),
            other => Err(SpillError::InvalidParameter(format!(
                "unknown adjacency '{}'",
                other
            ))),
        }
    }
}

/// Inclusive cell-index bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellBox {
    pub min_row: usize,
    pub min_col: usize,
    pub max_row: usize,
    pub max_col: usize,
}

impl CellBox {
    fn at(row: usize, col: usize) -> Self {
        Self {
            min_row: row,
            min_col: col,
            max_row: row,
            max_col: col,
        }
    }

    fn include(&mut self, row: usize, col: usize) {
        self.min_row = self.min_row.min(row);
        self.min_col = self.min_col.min(col);
        self.max_row = self.max_row.max(row);
        self.max_col = self.max_col.max(col);
    }
}

/// Maximal set of linked flagged cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectedComponent {
    pub label: u32,
    pub cell_count: usize,
    pub bbox: CellBox,
    /// First member cell in raster order.
    pub seed: (usize, usize),
}

/// Label image (0 = background) plus the components it encodes.
#[derive(Debug, Clone)]
pub struct ComponentLabels {
    labels: Array2<u32>,
    components: Vec<ConnectedComponent>,
}

impl ComponentLabels {
    pub fn labels(&self) -> &Array2<u32> {
        &self.labels
    }

    pub fn components(&self) -> &[ConnectedComponent] {
        &self.components
    }

    fn is_member(&self, label: u32, row: isize, col: isize) -> bool {
        if row < 0 || col < 0 {
            return false;
        }
        self.labels.get((row as usize, col as usize)) == Some(&label)
    }
}

/// Labels the flagged cells of `mask` in raster order.
pub fn label_components(mask: &BinaryMask, adjacency: Adjacency) -> ComponentLabels {
    let cells = mask.cells();
    let (rows, cols) = cells.dim();
    let mut labels = Array2::<u32>::zeros((rows, cols));
    let mut components = Vec::new();
    let mut stack = Vec::new();

    for row in 0..rows {
        for col in 0..cols {
            if cells[[row, col]] != 1 || labels[[row, col]] != 0 {
                continue;
            }
            let label = components.len() as u32 + 1;
            let mut bbox = CellBox::at(row, col);
            let mut cell_count = 0;
            labels[[row, col]] = label;
            stack.push((row, col));

            while let Some((r, c)) = stack.pop() {
                cell_count += 1;
                bbox.include(r, c);
                for &(dr, dc) in adjacency.offsets() {
                    let nr = r as isize + dr;
                    let nc = c as isize + dc;
                    if nr < 0 || nc < 0 || nr >= rows as isize || nc >= cols as isize {
                        continue;
                    }
                    let (nr, nc) = (nr as usize, nc as usize);
                    if cells[[nr, nc]] == 1 && labels[[nr, nc]] == 0 {
                        labels[[nr, nc]] = label;
                        stack.push((nr, nc));
                    }
                }
            }

            components.push(ConnectedComponent {
                label,
                cell_count,
                bbox,
                seed: (row, col),
            });
        }
    }

    ComponentLabels { labels, components }
}

/// Direction of travel along the cell-edge lattice, in raster orientation
/// (rows grow downwards).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Heading {
    East,
    South,
    West,
    North,
}

impl Heading {
    fn step(self) -> (isize, isize) {
        match self {
            Heading::East => (1, 0),
            Heading::South => (0, 1),
            Heading::West => (-1, 0),
            Heading::North => (0, -1),
        }
    }

    fn turn_right(self) -> Self {
        match self {
            Heading::East => Heading::South,
            Heading::South => Heading::West,
            Heading::West => Heading::North,
            Heading::North => Heading::East,
        }
    }

    fn turn_left(self) -> Self {
        match self {
            Heading::East => Heading::North,
            Heading::North => Heading::West,
            Heading::West => Heading::South,
            Heading::South => Heading::East,
        }
    }

    /// `(row, col)` offsets from a lattice vertex to the cells ahead-left and
    /// ahead-right of the walker.
    fn ahead(self) -> ((isize, isize), (isize, isize)) {
        match self {
            Heading::East => ((-1, 0), (0, 0)),
            Heading::South => ((0, 0), (0, -1)),
            Heading::West => ((0, -1), (-1, -1)),
            Heading::North => ((-1, -1), (-1, 0)),
        }
    }
}

/// Walks the outer boundary of `component`, keeping its cells on the right.
///
/// Returns lattice vertices `(col, row)` at every change of direction. Where
/// two member cells meet only at a corner the walker follows the diagonal
/// link. Under four-connectivity the cells are also joined by an edge path,
/// so the link seals off a background pocket that is filled like any other
/// hole and the ring stays simple. Under eight-connectivity a link that is
/// the only connection leaves the ring touching itself at that corner.
fn trace_outer_boundary(
    labels: &ComponentLabels,
    component: &ConnectedComponent,
) -> StageResult<Vec<(isize, isize)>> {
    let (seed_row, seed_col) = component.seed;
    let start = (seed_col as isize, seed_row as isize);
    let max_steps = 4 * component.cell_count + 4;

    let mut vertex = start;
    let mut heading = Heading::East;
    let mut corners = vec![start];
    for _ in 0..max_steps {
        let (dx, dy) = heading.step();
        vertex = (vertex.0 + dx, vertex.1 + dy);
        if vertex == start {
            return Ok(corners);
        }

        let ((lr, lc), (rr, rc)) = heading.ahead();
        let left = labels.is_member(component.label, vertex.1 + lr, vertex.0 + lc);
        let right = labels.is_member(component.label, vertex.1 + rr, vertex.0 + rc);
        let next = match (left, right) {
            (true, _) => heading.turn_left(),
            (false, true) => heading,
            (false, false) => heading.turn_right(),
        };
        if next != heading {
            corners.push(vertex);
            heading = next;
        }
    }

    Err(SpillError::Internal(format!(
        "boundary walk of component {} did not close",
        component.label
    )))
}

/// Closed exterior ring of one connected component, in ground coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolygonFeature {
    id: u32,
    ring: Vec<Coord>,
    cell_count: usize,
    cell_bbox: CellBox,
    ground_area_m2: f64,
}

impl PolygonFeature {
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Exterior ring in trace order, interior on the right (clockwise in a
    /// north-up frame); the first vertex is repeated at the end.
    pub fn ring(&self) -> &[Coord] {
        &self.ring
    }

    /// Exterior ring wound counter-clockwise, as GeoJSON requires.
    pub fn counter_clockwise_ring(&self) -> Vec<Coord> {
        self.to_polygon()
            .orient(Direction::Default)
            .exterior()
            .coords()
            .map(|c| [c.x, c.y])
            .collect()
    }

    pub fn to_polygon(&self) -> Polygon<f64> {
        Polygon::new(LineString::from(self.ring.clone()), Vec::new())
    }

    pub fn cell_count(&self) -> usize {
        self.cell_count
    }

    pub fn cell_bbox(&self) -> CellBox {
        self.cell_bbox
    }

    /// True ground area of the member cells in square metres.
    pub fn ground_area_m2(&self) -> f64 {
        self.ground_area_m2
    }

    /// Planar area enclosed by the ring, in squared CRS units.
    pub fn enclosed_area(&self) -> f64 {
        self.to_polygon().unsigned_area()
    }

    pub fn contains(&self, point: Coord) -> bool {
        self.to_polygon().contains(&Point::from(point))
    }
}

/// Converts flagged regions of a mask into polygon features.
#[derive(Debug, Clone)]
pub struct Vectorizer {
    adjacency: Adjacency,
    logger: LogManager,
}

impl Vectorizer {
    pub fn new(adjacency: Adjacency) -> Self {
        Self {
            adjacency,
            logger: LogManager::new("vectorize"),
        }
    }

    pub fn adjacency(&self) -> Adjacency {
        self.adjacency
    }

    /// One feature per component, ordered by the raster position of each
    /// component's first cell.
    pub fn apply(&self, mask: &BinaryMask) -> StageResult<Vec<PolygonFeature>> {
        let labels = label_components(mask, self.adjacency);
        let geometry = mask.geometry();
        let transform = geometry.transform();

        let mut ground = vec![CompensatedSum::new(); labels.components().len()];
        for ((row, col), &label) in labels.labels().indexed_iter() {
            if label != 0 {
                ground[label as usize - 1].add(geometry.cell_area(row, col));
            }
        }

        let mut features = Vec::with_capacity(labels.components().len());
        for (component, area) in labels.components().iter().zip(&ground) {
            let corners = trace_outer_boundary(&labels, component)?;
            let mut ring: Vec<Coord> = corners
                .iter()
                .map(|&(x, y)| transform.vertex(x as f64, y as f64))
                .collect();
            ring.push(ring[0]);
            features.push(PolygonFeature {
                id: component.label,
                ring,
                cell_count: component.cell_count,
                cell_bbox: component.bbox,
                ground_area_m2: area.total(),
            });
        }

        self.logger.detail(&format!(
            "{} components ({:?}-connected)",
            features.len(),
            self.adjacency
        ));
        Ok(features)
    }
}

impl ProcessingStage<BinaryMask> for Vectorizer {
    type Output = Vec<PolygonFeature>;

    fn name(&self) -> &'static str {
        self.logger.stage()
    }

    fn execute(&self, input: &BinaryMask) -> StageResult<Vec<PolygonFeature>> {
        self.apply(input)
    }
}

/// Traces one exterior ring per connected component of `mask`.
pub fn vectorize(mask: &BinaryMask, adjacency: Adjacency) -> StageResult<Vec<PolygonFeature>> {
    Vectorizer::new(adjacency).apply(mask)
}

/// Burns `polygons` onto an empty mask: a cell is flagged when its centre
/// lies inside any ring.
pub fn rasterize(polygons: &[PolygonFeature], geometry: &GridGeometry) -> BinaryMask {
    let (rows, cols) = geometry.shape();
    let transform = geometry.transform();
    let mut cells = Array2::<u8>::zeros((rows, cols));
    let mut crossings = Vec::new();
    for feature in polygons {
        let outline = feature.to_polygon();
        let bbox = feature.cell_bbox();
        for row in bbox.min_row..=bbox.max_row.min(rows.saturating_sub(1)) {
            let [_, y] = transform.cell_center(row, 0);
            crossings.clear();
            polygon::push_polygon_crossings(&outline, y, &mut crossings);
            crossings.sort_by(|a, b| a.total_cmp(b));
            for col in bbox.min_col..=bbox.max_col.min(cols.saturating_sub(1)) {
                let [x, _] = transform.cell_center(row, col);
                if polygon::inside_scanline(&crossings, x) {
                    cells[[row, col]] = 1;
                }
            }
        }
    }
    BinaryMask::from_parts(geometry.clone(), cells)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::{Crs, GeoTransform};

    fn mask(rows: &[&str]) -> BinaryMask {
        let height = rows.len();
        let width = rows[0].len();
        let geometry = GridGeometry::new(
            width,
            height,
            GeoTransform::north_up(0.0, height as f64, 1.0),
            Crs::EqualArea { epsg: 6933 },
        )
        .unwrap();
        let cells = Array2::from_shape_fn((height, width), |(r, c)| {
            u8::from(rows[r].as_bytes()[c] == b'#')
        });
        BinaryMask::from_cells(geometry, cells).unwrap()
    }

    #[test]
    fn empty_mask_yields_no_polygons() {
        let polygons = vectorize(&mask(&["...", "..."]), Adjacency::Four).unwrap();
        assert!(polygons.is_empty());
    }

    #[test]
    fn single_cell_becomes_unit_square() {
        let polygons = vectorize(&mask(&["...", ".#.", "..."]), Adjacency::Four).unwrap();
        assert_eq!(polygons.len(), 1);
        let ring = polygons[0].ring();
        assert_eq!(ring.len(), 5);
        assert_eq!(ring[0], ring[4]);
        assert_eq!(ring[0], [1.0, 2.0]);
        assert_eq!(polygons[0].enclosed_area(), 1.0);
        assert_eq!(polygons[0].ground_area_m2(), 1.0);
    }

    #[test]
    fn diagonal_cells_split_only_under_four_connectivity() {
        let m = mask(&["#.", ".#"]);
        assert_eq!(vectorize(&m, Adjacency::Four).unwrap().len(), 2);
        let eight = vectorize(&m, Adjacency::Eight).unwrap();
        assert_eq!(eight.len(), 1);
        assert_eq!(eight[0].cell_count(), 2);
        assert_eq!(eight[0].enclosed_area(), 2.0);
    }

    #[test]
    fn l_shape_ring_has_six_corners() {
        let polygons = vectorize(&mask(&["#..", "#..", "###"]), Adjacency::Four).unwrap();
        assert_eq!(polygons.len(), 1);
        assert_eq!(polygons[0].ring().len(), 7);
        assert_eq!(polygons[0].enclosed_area(), 5.0);
    }

    #[test]
    fn hole_is_filled_by_outer_ring() {
        let polygons = vectorize(&mask(&["###", "#.#", "###"]), Adjacency::Four).unwrap();
        assert_eq!(polygons.len(), 1);
        assert_eq!(polygons[0].cell_count(), 8);
        assert_eq!(polygons[0].enclosed_area(), 9.0);
    }

    #[test]
    fn pinched_component_gives_simple_ring_under_both_rules() {
        // The two arms meet at a single corner in the middle.
        let m = mask(&["##.", "#.#", "###"]);
        let four = vectorize(&m, Adjacency::Four).unwrap();
        let eight = vectorize(&m, Adjacency::Eight).unwrap();
        assert_eq!(four.len(), 1);
        assert_eq!(four[0].ring(), eight[0].ring());

        let ring = four[0].ring();
        assert_eq!(ring.first(), ring.last());
        let open = &ring[..ring.len() - 1];
        for (idx, vertex) in open.iter().enumerate() {
            assert!(!open[idx + 1..].contains(vertex), "vertex {:?} repeats", vertex);
        }
        assert_eq!(open.len(), 6);
        // The sealed pocket in the middle is filled; the open notch is not.
        assert_eq!(four[0].enclosed_area(), 8.0);
        assert_eq!(four[0].cell_count(), 7);
    }

    #[test]
    fn counter_clockwise_ring_reverses_trace_order() {
        let polygons = vectorize(&mask(&["#..", "#..", "###"]), Adjacency::Four).unwrap();
        let traced = polygons[0].ring();
        let ccw = polygons[0].counter_clockwise_ring();
        assert!(Polygon::new(LineString::from(traced.to_vec()), Vec::new()).signed_area() < 0.0);
        assert!(Polygon::new(LineString::from(ccw.clone()), Vec::new()).signed_area() > 0.0);
        assert_eq!(ccw.len(), traced.len());
        assert_eq!(ccw.first(), ccw.last());
    }

    #[test]
    fn components_touching_the_edge_are_kept_whole() {
        let polygons = vectorize(&mask(&["##..", "##..", "...#"]), Adjacency::Four).unwrap();
        assert_eq!(polygons.len(), 2);
        assert_eq!(polygons[0].cell_count(), 4);
        assert_eq!(polygons[0].enclosed_area(), 4.0);
        assert_eq!(polygons[1].cell_count(), 1);
    }

    #[test]
    fn rasterize_reproduces_simple_component() {
        let m = mask(&[".....", ".###.", ".##..", "....."]);
        let polygons = vectorize(&m, Adjacency::Four).unwrap();
        let burned = rasterize(&polygons, m.geometry());
        assert_eq!(burned.cells(), m.cells());
    }

    #[test]
    fn labels_follow_raster_order() {
        let labels = label_components(&mask(&["#.#", "...", "#.."]), Adjacency::Eight);
        let seeds: Vec<_> = labels.components().iter().map(|c| c.seed).collect();
        assert_eq!(seeds, vec![(0, 0), (0, 2), (2, 0)]);
        assert_eq!(labels.labels()[[2, 0]], 3);
    }
}
