//! Feature model exchanged between the pipeline stages.
//!
//! A [`Feature`] is a geometry plus a named attribute map. Elevations are
//! stored as decimeters in [`Coordinate::z`]; use [`Coordinate::elevation`] to
//! obtain meters. An undefined elevation is represented by `NaN`.

use std::collections::BTreeMap;
use std::fmt;

use tracing::warn;

use crate::error::{Error, Result};

/// A 3D vertex. `z` holds the elevation in decimeters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Coordinate {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Vertex without elevation information.
    pub fn planar(x: f64, y: f64) -> Self {
        Self { x, y, z: f64::NAN }
    }

    /// Elevation in meters.
    pub fn elevation(&self) -> f64 {
        self.z / 10.0
    }

    pub fn has_elevation(&self) -> bool {
        !self.z.is_nan()
    }

    /// Planar Euclidean distance.
    pub fn distance(&self, other: &Coordinate) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn equals_2d(&self, other: &Coordinate) -> bool {
        self.x == other.x && self.y == other.y
    }

    /// Equal in all three ordinates; two undefined elevations compare equal.
    pub fn equals_3d(&self, other: &Coordinate) -> bool {
        self.equals_2d(other)
            && (self.z == other.z || (self.z.is_nan() && other.z.is_nan()))
    }

    pub fn is_finite_2d(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3}, {:.1})", self.x, self.y, self.z)
    }
}

/// Geometry of a feature.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Coordinate),
    LineString(Vec<Coordinate>),
    MultiLineString(Vec<Vec<Coordinate>>),
}

impl Geometry {
    /// All vertices in order.
    pub fn coordinates(&self) -> Vec<Coordinate> {
        match self {
            Geometry::Point(coord) => vec![*coord],
            Geometry::LineString(coords) => coords.clone(),
            Geometry::MultiLineString(parts) => parts.iter().flatten().copied().collect(),
        }
    }

    /// Vertices of a single line, `None` for points and multi-lines.
    pub fn as_line(&self) -> Option<&[Coordinate]> {
        match self {
            Geometry::LineString(coords) => Some(coords),
            _ => None,
        }
    }

    pub fn as_point(&self) -> Option<Coordinate> {
        match self {
            Geometry::Point(coord) => Some(*coord),
            _ => None,
        }
    }

    /// Planar length; zero for points.
    pub fn length(&self) -> f64 {
        match self {
            Geometry::Point(_) => 0.0,
            Geometry::LineString(coords) => crate::geometry::line_length(coords),
            Geometry::MultiLineString(parts) => {
                parts.iter().map(|part| crate::geometry::line_length(part)).sum()
            }
        }
    }

    /// Exact equality including vertex order and elevations.
    pub fn equals_exact(&self, other: &Geometry) -> bool {
        let (a, b) = (self.coordinates(), other.coordinates());
        std::mem::discriminant(self) == std::mem::discriminant(other)
            && a.len() == b.len()
            && a.iter().zip(&b).all(|(left, right)| left.equals_3d(right))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Geometry::Point(_) => "Point",
            Geometry::LineString(_) => "LineString",
            Geometry::MultiLineString(_) => "MultiLineString",
        }
    }
}

/// Attribute value attached to a feature.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl AttrValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Int(value) => Some(*value as f64),
            AttrValue::Float(value) => Some(*value),
            AttrValue::Text(text) => text.trim().parse().ok(),
            AttrValue::Bool(_) => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AttrValue::Int(value) => Some(*value),
            AttrValue::Float(value) if value.fract() == 0.0 => Some(*value as i64),
            AttrValue::Text(text) => text.trim().parse().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Text(text) => f.write_str(text),
            AttrValue::Int(value) => write!(f, "{value}"),
            AttrValue::Float(value) => write!(f, "{value}"),
            AttrValue::Bool(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Text(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Int(value)
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        AttrValue::Float(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

/// Named attributes of a feature, looked up by key.
pub type Attributes = BTreeMap<String, AttrValue>;

/// A geometry with its attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub geometry: Geometry,
    pub attributes: Attributes,
}

impl Feature {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            attributes: Attributes::new(),
        }
    }

    pub fn line(coords: Vec<Coordinate>) -> Self {
        Self::new(Geometry::LineString(coords))
    }

    pub fn point(coord: Coordinate) -> Self {
        Self::new(Geometry::Point(coord))
    }

    /// Builder-style attribute setter.
    pub fn with(mut self, key: &str, value: impl Into<AttrValue>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: &str, value: impl Into<AttrValue>) {
        self.attributes.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.attributes.get(key)
    }

    /// Attribute rendered as text; empty when absent.
    pub fn text(&self, key: &str) -> String {
        self.get(key).map(ToString::to_string).unwrap_or_default()
    }

    /// Attribute rendered as text, failing when absent.
    pub fn require_text(&self, key: &str) -> Result<String> {
        self.get(key)
            .map(ToString::to_string)
            .ok_or_else(|| Error::MissingAttribute {
                attribute: key.to_string(),
            })
    }

    pub fn int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(AttrValue::as_i64)
    }

    pub fn float(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(AttrValue::as_f64)
    }

    /// Vertices of a line feature.
    pub fn line_coords(&self) -> Result<&[Coordinate]> {
        self.geometry
            .as_line()
            .ok_or_else(|| Error::UnsupportedGeometry {
                kind: self.geometry.kind().to_string(),
            })
    }
}

/// Remove features whose geometry exactly equals an earlier one.
///
/// Returns the number of removed features.
pub fn clean_duplicate_features(features: &mut Vec<Feature>, label: &str) -> usize {
    let before = features.len();
    let mut kept: Vec<Feature> = Vec::with_capacity(before);
    for feature in features.drain(..) {
        if kept
            .iter()
            .any(|existing| existing.geometry.equals_exact(&feature.geometry))
        {
            warn!(
                kind = label,
                id = %feature.text(crate::constants::XML_GID),
                "deleting duplicate feature"
            );
            continue;
        }
        kept.push(feature);
    }
    *features = kept;
    before - features.len()
}
