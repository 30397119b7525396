use geo::{LineString, Polygon};

/// Ground coordinate pair `[x, y]`.
pub type Coord = [f64; 2];

/// Appends the x positions where the horizontal line at `y` crosses `ring`.
///
/// Vertices exactly on the line count for the edge above it only, so a
/// scanline through a vertex is never counted twice.
pub fn push_crossings(ring: &LineString<f64>, y: f64, out: &mut Vec<f64>) {
    for edge in ring.lines() {
        let (a, b) = (edge.start, edge.end);
        if (a.y > y) != (b.y > y) {
            out.push(a.x + (y - a.y) * (b.x - a.x) / (b.y - a.y));
        }
    }
}

/// Crossings of the exterior and every interior ring of `polygon`.
pub fn push_polygon_crossings(polygon: &Polygon<f64>, y: f64, out: &mut Vec<f64>) {
    push_crossings(polygon.exterior(), y, out);
    for hole in polygon.interiors() {
        push_crossings(hole, y, out);
    }
}

/// Even-odd test of `x` against the sorted crossings of its scanline.
pub fn inside_scanline(sorted: &[f64], x: f64) -> bool {
    (sorted.len() - sorted.partition_point(|&c| c <= x)) % 2 == 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(min: f64, max: f64) -> LineString<f64> {
        LineString::from(vec![[min, min], [max, min], [max, max], [min, max], [min, min]])
    }

    #[test]
    fn crossings_are_half_open_in_y() {
        let mut out = Vec::new();
        push_crossings(&square(0.0, 1.0), 0.5, &mut out);
        out.sort_by(|a, b| a.total_cmp(b));
        assert_eq!(out, vec![0.0, 1.0]);

        out.clear();
        push_crossings(&square(0.0, 1.0), 1.0, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn holes_add_their_own_crossings() {
        let polygon = Polygon::new(square(0.0, 10.0), vec![square(4.0, 6.0)]);
        let mut out = Vec::new();
        push_polygon_crossings(&polygon, 5.0, &mut out);
        out.sort_by(|a, b| a.total_cmp(b));
        assert_eq!(out, vec![0.0, 4.0, 6.0, 10.0]);
        assert!(inside_scanline(&out, 2.0));
        assert!(!inside_scanline(&out, 5.0));
        assert!(!inside_scanline(&out, 11.0));
    }
}
