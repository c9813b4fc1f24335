//! GeoJSON exchange of [`Feature`] collections.

use std::fs;
use std::io::BufWriter;
use std::path::Path;
use std::str::FromStr;

use geojson::{FeatureCollection, GeoJson, JsonObject, JsonValue, Value};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::feature::{AttrValue, Attributes, Coordinate, Feature, Geometry};

/// Read every feature of a GeoJSON FeatureCollection.
pub fn read_features(path: &Path) -> Result<Vec<Feature>> {
    let text = fs::read_to_string(path)?;
    let features = parse_features(&text).map_err(|err| match err {
        Error::NotAFeatureCollection { .. } => Error::NotAFeatureCollection {
            path: path.to_path_buf(),
        },
        other => other,
    })?;
    debug!(path = %path.display(), count = features.len(), "read features");
    Ok(features)
}

/// Parse a GeoJSON FeatureCollection from text.
pub fn parse_features(text: &str) -> Result<Vec<Feature>> {
    let collection = match GeoJson::from_str(text)? {
        GeoJson::FeatureCollection(collection) => collection,
        _ => {
            return Err(Error::NotAFeatureCollection {
                path: Default::default(),
            })
        }
    };
    collection.features.into_iter().map(from_geojson).collect()
}

/// Write features as a GeoJSON FeatureCollection, creating parent folders.
pub fn write_features(path: &Path, features: &[Feature]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let collection = FeatureCollection {
        bbox: None,
        features: features.iter().map(to_geojson).collect(),
        foreign_members: None,
    };
    let writer = BufWriter::new(fs::File::create(path)?);
    serde_json::to_writer(writer, &collection)?;
    info!(path = %path.display(), count = features.len(), "wrote features");
    Ok(())
}

fn from_geojson(feature: geojson::Feature) -> Result<Feature> {
    let geometry = feature.geometry.ok_or_else(|| Error::InvalidFeature {
        message: "feature without geometry".to_string(),
    })?;
    let geometry = match geometry.value {
        Value::Point(position) => Geometry::Point(to_coordinate(&position)?),
        Value::LineString(positions) => Geometry::LineString(to_coordinates(&positions)?),
        Value::MultiLineString(parts) => Geometry::MultiLineString(
            parts
                .iter()
                .map(|part| to_coordinates(part))
                .collect::<Result<_>>()?,
        ),
        other => {
            return Err(Error::UnsupportedGeometry {
                kind: value_kind(&other).to_string(),
            })
        }
    };

    let mut attributes = Attributes::new();
    for (key, value) in feature.properties.unwrap_or_default() {
        let value = match value {
            JsonValue::Null => continue,
            JsonValue::Bool(flag) => AttrValue::Bool(flag),
            JsonValue::String(text) => AttrValue::Text(text),
            JsonValue::Number(number) => match number.as_i64() {
                Some(int) => AttrValue::Int(int),
                None => AttrValue::Float(number.as_f64().unwrap_or(f64::NAN)),
            },
            JsonValue::Array(_) | JsonValue::Object(_) => {
                return Err(Error::InvalidFeature {
                    message: format!("property '{key}' is not a scalar"),
                })
            }
        };
        attributes.insert(key, value);
    }

    Ok(Feature {
        geometry,
        attributes,
    })
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Point(_) => "Point",
        Value::MultiPoint(_) => "MultiPoint",
        Value::LineString(_) => "LineString",
        Value::MultiLineString(_) => "MultiLineString",
        Value::Polygon(_) => "Polygon",
        Value::MultiPolygon(_) => "MultiPolygon",
        Value::GeometryCollection(_) => "GeometryCollection",
    }
}

fn to_coordinate(position: &[f64]) -> Result<Coordinate> {
    match position {
        [x, y] => Ok(Coordinate::planar(*x, *y)),
        [x, y, z, ..] => Ok(Coordinate::new(*x, *y, *z)),
        _ => Err(Error::InvalidFeature {
            message: format!("position with {} ordinates", position.len()),
        }),
    }
}

fn to_coordinates(positions: &[Vec<f64>]) -> Result<Vec<Coordinate>> {
    positions.iter().map(|p| to_coordinate(p)).collect()
}

fn to_position(coord: &Coordinate) -> Vec<f64> {
    if coord.has_elevation() {
        vec![coord.x, coord.y, coord.z]
    } else {
        vec![coord.x, coord.y]
    }
}

fn to_geojson(feature: &Feature) -> geojson::Feature {
    let value = match &feature.geometry {
        Geometry::Point(coord) => Value::Point(to_position(coord)),
        Geometry::LineString(coords) => Value::LineString(coords.iter().map(to_position).collect()),
        Geometry::MultiLineString(parts) => Value::MultiLineString(
            parts
                .iter()
                .map(|part| part.iter().map(to_position).collect())
                .collect(),
        ),
    };

    let mut properties = JsonObject::new();
    for (key, value) in &feature.attributes {
        let json = match value {
            AttrValue::Text(text) => JsonValue::from(text.as_str()),
            AttrValue::Int(int) => JsonValue::from(*int),
            AttrValue::Float(float) if float.is_finite() => JsonValue::from(*float),
            AttrValue::Float(_) => JsonValue::Null,
            AttrValue::Bool(flag) => JsonValue::from(*flag),
        };
        properties.insert(key.clone(), json);
    }

    geojson::Feature {
        bbox: None,
        geometry: Some(geojson::Geometry::new(value)),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SAMPLE: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "geometry": {"type": "LineString", "coordinates": [[0, 0, 10000], [100, 0]]},
                "properties": {"XML_GID": "12", "open": 1, "cost": 2.5, "flag": true, "gone": null}
            },
            {
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [5, 5, 0]},
                "properties": null
            }
        ]
    }"#;

    #[test]
    fn parses_coordinates_and_scalar_properties() {
        let features = parse_features(SAMPLE).expect("sample parses");
        assert_eq!(features.len(), 2);

        let line = features[0].line_coords().expect("line geometry");
        assert_eq!(line[0].z, 10000.0);
        assert!(!line[1].has_elevation());
        assert_eq!(features[0].text("XML_GID"), "12");
        assert_eq!(features[0].int("open"), Some(1));
        assert_eq!(features[0].float("cost"), Some(2.5));
        assert_eq!(features[0].get("flag"), Some(&AttrValue::Bool(true)));
        assert!(features[0].get("gone").is_none());
        assert!(features[1].attributes.is_empty());
    }

    #[test]
    fn rejects_bare_geometry() {
        let err = parse_features(r#"{"type": "Point", "coordinates": [0, 0]}"#)
            .expect_err("not a collection");
        assert!(matches!(err, Error::NotAFeatureCollection { .. }));
    }

    #[test]
    fn rejects_polygons() {
        let text = r#"{"type": "FeatureCollection", "features": [{"type": "Feature",
            "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,0]]]},
            "properties": {}}]}"#;
        let err = parse_features(text).expect_err("polygons unsupported");
        assert!(matches!(err, Error::UnsupportedGeometry { .. }));
    }

    #[test]
    fn written_features_read_back() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nested/out.geojson");
        let features = parse_features(SAMPLE).expect("sample parses");

        write_features(&path, &features).expect("write succeeds");
        let back = read_features(&path).expect("read succeeds");

        assert_eq!(back.len(), features.len());
        for (read, original) in back.iter().zip(&features) {
            assert!(read.geometry.equals_exact(&original.geometry));
            assert_eq!(read.attributes, original.attributes);
        }
    }
}
