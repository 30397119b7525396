use spillcore::processing::PolygonFeature;

/// One `POLYGON` per line, in feature order.
pub fn to_wkt_lines(features: &[PolygonFeature]) -> String {
    let mut out = String::new();
    for feature in features {
        let coords: Vec<String> = feature
            .ring()
            .iter()
            .map(|[x, y]| format!("{} {}", x, y))
            .collect();
        out.push_str(&format!("POLYGON (({}))\n", coords.join(", ")));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use spillcore::processing::{vectorize, Adjacency};
    use spillcore::{BinaryMask, Crs, GeoTransform, GridGeometry};

    #[test]
    fn unit_cell_serialises_closed_ring() {
        let geometry =
            GridGeometry::new(1, 1, GeoTransform::north_up(0.0, 1.0, 1.0), Crs::EqualArea { epsg: 6933 })
                .unwrap();
        let mask = BinaryMask::from_cells(geometry, ndarray::array![[1]]).unwrap();
        let wkt = to_wkt_lines(&vectorize(&mask, Adjacency::Four).unwrap());
        assert_eq!(wkt, "POLYGON ((0 1, 1 1, 1 0, 0 0, 0 1))\n");
    }
}
