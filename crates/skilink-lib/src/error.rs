use std::path::PathBuf;

use thiserror::Error;

/// Convenient result alias for the ski-link library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// A mandatory input dataset (lifts or slopes) could not be found.
    #[error("mandatory {kind} dataset not found at {path}")]
    MissingInput { kind: &'static str, path: PathBuf },

    /// Raised when a feature file does not hold a GeoJSON FeatureCollection.
    #[error("{path} is not a feature collection")]
    NotAFeatureCollection { path: PathBuf },

    /// Raised when a feature cannot be converted into the internal model.
    #[error("invalid feature: {message}")]
    InvalidFeature { message: String },

    /// Raised when a geometry type other than Point, LineString or
    /// MultiLineString is encountered.
    #[error("unsupported geometry type {kind}")]
    UnsupportedGeometry { kind: String },

    /// Raised when an attribute required by a matching stage is absent.
    #[error("feature is missing attribute {attribute}")]
    MissingAttribute { attribute: String },

    /// Raised when an identifier cannot be turned into a numeric r_id.
    #[error("identifier '{value}' cannot be used to build an r_id")]
    InvalidIdentifier { value: String },

    /// Raised when an edge feature does not have exactly two vertices.
    #[error("edge {r_id} ({edge_type}) has {vertices} vertices, expected 2")]
    DegenerateEdge {
        r_id: String,
        edge_type: String,
        vertices: usize,
    },

    /// Raised when an edge feature contains an undefined vertex.
    #[error("edge {r_id} has an undefined vertex")]
    NullVertex { r_id: String },

    /// Raised when a merged feature carries an unknown `XML_TYPE`.
    #[error("edge {r_id} has unknown type '{edge_type}'")]
    UnknownEdgeType { r_id: String, edge_type: String },

    /// Raised when a cost mode outside 0..=3 is requested.
    #[error("unsupported cost mode {mode}; expected 0, 1, 2 or 3")]
    UnsupportedCostMode { mode: u8 },

    /// Wrapper for IO errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Wrapper for JSON serialization errors.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Wrapper for GeoJSON parsing errors.
    #[error(transparent)]
    GeoJson(#[from] Box<geojson::Error>),

    /// Raised when the configuration file is not valid TOML.
    #[error("failed to parse configuration {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl From<geojson::Error> for Error {
    fn from(err: geojson::Error) -> Self {
        Error::GeoJson(Box::new(err))
    }
}
