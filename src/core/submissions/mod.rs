//! Submission conversion
//!
//! Central's CSV export is turned into two documents holding the same
//! features in the same order: an OSM XML change file and a GeoJSON
//! `FeatureCollection`. Rows without coordinates or tags are skipped with a
//! warning; near-empty rows are skipped silently.

pub mod convert;
pub mod feature;
pub mod geojson;
pub mod osm;

pub use convert::{ConversionSummary, ConvertedFiles, SubmissionConverter};
pub use feature::{column_name, Extraction, Feature, FeatureExtractor};
pub use geojson::GeoJsonWriter;
pub use osm::OsmWriter;
