//! Feature extraction from one submission row

use crate::config::SubmissionConfig;
use std::collections::{BTreeMap, HashSet};

/// Columns Central adds to every export, in JSON and CSV spelling
const METADATA_COLUMNS: &[&str] = &[
    "submissionDate",
    "SubmissionDate",
    "submitterID",
    "SubmitterID",
    "submitterName",
    "SubmitterName",
    "KEY",
    "instanceID",
    "deviceid",
    "DeviceID",
    "start",
    "end",
    "today",
    "attachmentsPresent",
    "AttachmentsPresent",
    "attachmentsExpected",
    "AttachmentsExpected",
    "status",
    "Status",
    "reviewState",
    "ReviewState",
    "formVersion",
    "FormVersion",
    "edits",
    "Edits",
    "__version__",
];

const USER_COLUMNS: &[&str] = &["submitterName", "SubmitterName", "username"];
const TIMESTAMP_COLUMNS: &[&str] = &["end", "submissionDate", "SubmissionDate"];
const LAT_COLUMNS: &[&str] = &["lat", "latitude"];
const LON_COLUMNS: &[&str] = &["lon", "longitude"];

/// A point with its OSM tags
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub lat: f64,
    pub lon: f64,
    pub tags: BTreeMap<String, String>,
    pub user: Option<String>,

    /// UTC, `%Y-%m-%dT%H:%M:%SZ`
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    /// At most one populated column
    Empty,

    /// Populated, but without tags or coordinates
    Malformed(String),

    Feature(Feature),
}

/// Turns rows into [`Feature`]s following the submission settings
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    geometry_columns: Vec<String>,
    ignored: HashSet<String>,
    tag_renames: BTreeMap<String, String>,
}

impl FeatureExtractor {
    pub fn new(config: &SubmissionConfig) -> Self {
        let ignored = METADATA_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .chain(config.ignore_columns.iter().cloned())
            .chain(config.geometry_columns.iter().cloned())
            .chain(LAT_COLUMNS.iter().chain(LON_COLUMNS).map(|c| c.to_string()))
            .chain(USER_COLUMNS.iter().map(|c| c.to_string()))
            .collect();

        Self {
            geometry_columns: config.geometry_columns.clone(),
            ignored,
            tag_renames: config.tag_renames.clone(),
        }
    }

    /// `headers` must already be reduced with [`column_name`]
    pub fn extract<'a>(
        &self,
        headers: &[String],
        values: impl IntoIterator<Item = &'a str>,
    ) -> Extraction {
        let row: BTreeMap<&str, &str> = headers
            .iter()
            .map(String::as_str)
            .zip(values)
            .map(|(k, v)| (k, v.trim()))
            .filter(|(_, v)| !v.is_empty())
            .collect();

        if row.len() <= 1 {
            return Extraction::Empty;
        }

        let Some((lat, lon)) = self.coordinates(&row) else {
            return Extraction::Malformed("no coordinates".to_string());
        };

        let tags: BTreeMap<String, String> = row
            .iter()
            .filter(|(k, _)| !self.ignored.contains(**k))
            .map(|(k, v)| {
                let key = self.tag_renames.get(*k).map(String::as_str).unwrap_or(*k);
                (key.to_string(), v.to_string())
            })
            .collect();

        if tags.is_empty() {
            return Extraction::Malformed("no tags".to_string());
        }

        let user = first_of(&row, USER_COLUMNS).map(str::to_string);
        let timestamp = first_of(&row, TIMESTAMP_COLUMNS).and_then(osm_timestamp);

        Extraction::Feature(Feature {
            lat,
            lon,
            tags,
            user,
            timestamp,
        })
    }

    fn coordinates(&self, row: &BTreeMap<&str, &str>) -> Option<(f64, f64)> {
        let geopoint = self
            .geometry_columns
            .iter()
            .find_map(|column| row.get(column.as_str()));
        if let Some(value) = geopoint {
            let mut parts = value.split_whitespace();
            let lat = parts.next()?.parse().ok()?;
            let lon = parts.next()?.parse().ok()?;
            return valid_point(lat, lon);
        }

        let lat = first_of(row, LAT_COLUMNS)?.parse().ok()?;
        let lon = first_of(row, LON_COLUMNS)?.parse().ok()?;
        valid_point(lat, lon)
    }
}

/// Reduce an export column name to its field name
///
/// `group-field` and `/data/group/field` both become `field`.
pub fn column_name(raw: &str) -> String {
    raw.trim()
        .rsplit(['-', '/'])
        .next()
        .unwrap_or(raw)
        .to_string()
}

fn first_of<'a>(row: &BTreeMap<&str, &'a str>, columns: &[&str]) -> Option<&'a str> {
    columns.iter().find_map(|c| row.get(c).copied())
}

fn valid_point(lat: f64, lon: f64) -> Option<(f64, f64)> {
    ((-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon)).then_some((lat, lon))
}

fn osm_timestamp(value: &str) -> Option<String> {
    chrono::DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|t| {
            t.with_timezone(&chrono::Utc)
                .format("%Y-%m-%dT%H:%M:%SZ")
                .to_string()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| column_name(n)).collect()
    }

    fn extractor() -> FeatureExtractor {
        let mut config = SubmissionConfig::default();
        config
            .tag_renames
            .insert("building_type".to_string(), "building".to_string());
        FeatureExtractor::new(&config)
    }

    #[test]
    fn test_column_name_reduction() {
        assert_eq!(column_name("survey-building_type"), "building_type");
        assert_eq!(column_name("/data/details/name"), "name");
        assert_eq!(column_name("name"), "name");
    }

    #[test]
    fn test_extracts_geopoint_and_tags() {
        let h = headers(&["start", "all-geopoint", "all-building_type", "submitterName", "end"]);
        let row = [
            "2023-05-10T12:00:00.000+03:00",
            "-1.25 36.8 1650 4.5",
            "residential",
            "mapper1",
            "2023-05-10T12:30:00.000+03:00",
        ];
        let Extraction::Feature(f) = extractor().extract(&h, row) else {
            panic!("expected a feature");
        };
        assert_eq!((f.lat, f.lon), (-1.25, 36.8));
        assert_eq!(f.tags.len(), 1);
        assert_eq!(f.tags["building"], "residential");
        assert_eq!(f.user.as_deref(), Some("mapper1"));
        assert_eq!(f.timestamp.as_deref(), Some("2023-05-10T09:30:00Z"));
    }

    #[test]
    fn test_lat_lon_columns() {
        let h = headers(&["latitude", "longitude", "amenity"]);
        let Extraction::Feature(f) = extractor().extract(&h, ["10.5", "-20.25", "cafe"]) else {
            panic!("expected a feature");
        };
        assert_eq!((f.lat, f.lon), (10.5, -20.25));
        assert!(f.user.is_none());
    }

    #[test]
    fn test_near_empty_row() {
        let h = headers(&["geopoint", "name", "amenity"]);
        assert_eq!(extractor().extract(&h, ["", "x", " "]), Extraction::Empty);
    }

    #[test]
    fn test_missing_coordinates_and_tags() {
        let h = headers(&["geopoint", "name", "amenity"]);
        assert!(matches!(
            extractor().extract(&h, ["", "x", "cafe"]),
            Extraction::Malformed(_)
        ));

        let h = headers(&["geopoint", "start", "end"]);
        assert_eq!(
            extractor().extract(&h, ["1 2", "a", "b"]),
            Extraction::Malformed("no tags".to_string())
        );
    }

    #[test]
    fn test_out_of_range_coordinates() {
        let h = headers(&["geopoint", "amenity"]);
        assert!(matches!(
            extractor().extract(&h, ["95 10", "cafe"]),
            Extraction::Malformed(_)
        ));
    }
}
