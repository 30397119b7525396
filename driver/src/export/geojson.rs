use serde_json::{json, Value};
use spillcore::processing::PolygonFeature;
use spillcore::Crs;

/// EPSG code for a CRS, when it has one.
pub fn epsg_code(crs: Crs) -> u32 {
    match crs {
        Crs::Geographic => 4326,
        Crs::Utm { zone, north: true } => 32600 + u32::from(zone),
        Crs::Utm { zone, north: false } => 32700 + u32::from(zone),
        Crs::EqualArea { epsg } => epsg,
    }
}

/// GeoJSON `FeatureCollection` with one `Polygon` per feature, exterior
/// rings counter-clockwise (RFC 7946 §3.1.6).
///
/// Projected collections carry a named `crs` member, since plain GeoJSON
/// assumes WGS84.
pub fn feature_collection(features: &[PolygonFeature], crs: Crs) -> Value {
    let features: Vec<Value> = features
        .iter()
        .map(|feature| {
            json!({
                "type": "Feature",
                "id": feature.id(),
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [feature.counter_clockwise_ring()],
                },
                "properties": {
                    "id": feature.id(),
                    "cells": feature.cell_count(),
                    "area_m2": feature.ground_area_m2(),
                },
            })
        })
        .collect();

    let mut collection = json!({
        "type": "FeatureCollection",
        "features": features,
    });
    if !crs.is_geographic() {
        collection["crs"] = json!({
            "type": "name",
            "properties": { "name": format!("urn:ogc:def:crs:EPSG::{}", epsg_code(crs)) },
        });
    }
    collection
}
