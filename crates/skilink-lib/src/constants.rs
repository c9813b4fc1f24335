//! Attribute keys, identifier prefixes and geometric tolerances shared by the
//! matching, simplification and graph stages.

/// Feature identifier attribute carried by lifts, slopes and bus lines.
pub const XML_GID: &str = "XML_GID";

/// Feature category attribute (`slopes`, `lifts`, `buses`, `links`).
pub const XML_TYPE: &str = "XML_TYPE";

/// Ski region name.
pub const DE_GR_L_0: &str = "DE_GR_L_0";

/// Sub-region name.
pub const DE_GR_L_1: &str = "DE_GR_L_1";

/// Declared slope colour ("Blau", "Rot", "Schwarz").
pub const DE_GR_L_3: &str = "DE_GR_L_3";

/// Bus stop display name.
pub const DE_NAME: &str = "DE_NAME";

/// Bus stop identifier.
pub const PT_ID: &str = "PT_ID";

/// Bus line identifier.
pub const DB_ID: &str = "DB_ID";

/// Numeric slope difficulty written by the multi-line split.
pub const DIFFICULTY: &str = "difficulty";

/// Routing identifier of links, segments and merged edges.
pub const R_ID: &str = "r_id";

/// Prefix digit of slope segments and slope-to-slope / slope-to-lift links.
pub const SLOPE_PREFIX: char = '1';

/// Prefix digit of lifts and lift-to-lift links.
pub const LIFT_PREFIX: char = '2';

/// Prefix digit of bus segments and bus links.
pub const BUS_PREFIX: char = '3';

/// Margin added to every configured distance or height threshold.
pub const THRESHOLD_MARGIN: f64 = 0.5;

/// A lift end projected onto a slope must be farther than this from both slope
/// ends to count as a mid-point connection.
pub const SLOPE_LIFT_MIN_ENDPOINT_CLEARANCE: f64 = 100.0;

/// Douglas-Peucker tolerance applied to multi-vertex intersections.
pub const INTERSECTION_SIMPLIFY_TOLERANCE: f64 = 100.0;

/// Envelope expansion used when querying topology vertices around a feature.
pub const ENVELOPE_PADDING: f64 = 5.0;

/// An intersection point closer than this to a slope lies on it.
pub const INTERSECTION_ON_LINE_TOLERANCE: f64 = 0.001;

/// A link end point closer than this to a slope lies on it.
pub const LINK_ON_LINE_TOLERANCE: f64 = 0.05;

/// Bus stops farther than this from a bus line are not projected onto it.
pub const BUS_STOP_MAX_OFFSET: f64 = 50.0;

/// Split points of slopes closer than this to the previous cut are merged.
pub const SLOPE_SPLIT_TOLERANCE: f64 = 0.001;

/// Split points of bus lines closer than this to the previous cut are merged.
pub const BUS_SPLIT_TOLERANCE: f64 = 1.0;

/// Distinct graph nodes closer than this are reported as duplicates.
pub const DUPLICATE_NODE_TOLERANCE: f64 = 0.001;
