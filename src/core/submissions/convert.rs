//! CSV submission export → OSM + GeoJSON

use super::feature::{column_name, Extraction, FeatureExtractor};
use super::geojson::GeoJsonWriter;
use super::osm::OsmWriter;
use crate::config::SubmissionConfig;
use crate::domain::Result;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

/// Record counts for one conversion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConversionSummary {
    pub records: usize,
    pub features: usize,
    pub empty: usize,
    pub malformed: usize,
}

/// Files written by [`SubmissionConverter::convert_csv`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConvertedFiles {
    pub osm: PathBuf,
    pub geojson: PathBuf,
    pub summary: ConversionSummary,
}

pub struct SubmissionConverter {
    extractor: FeatureExtractor,
}

impl SubmissionConverter {
    pub fn new(config: &SubmissionConfig) -> Self {
        Self {
            extractor: FeatureExtractor::new(config),
        }
    }

    /// Convert CSV from `input`, writing both documents
    ///
    /// Every feature goes to both outputs in the same order. Both outputs are
    /// framed even when no record produced a feature.
    pub fn convert<R: Read, O: Write, G: Write>(
        &self,
        input: R,
        osm_out: O,
        geojson_out: G,
    ) -> Result<ConversionSummary> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(input);
        let headers: Vec<String> = reader.headers()?.iter().map(column_name).collect();

        let mut osm = OsmWriter::new(osm_out)?;
        let mut geojson = GeoJsonWriter::new(geojson_out)?;
        let mut summary = ConversionSummary::default();

        for (row, record) in reader.records().enumerate() {
            summary.records += 1;
            // header is line 1
            let line = row as u64 + 2;

            let record = match record {
                Ok(record) => record,
                Err(e) => {
                    let line = e.position().map_or(line, |p| p.line());
                    tracing::warn!(line, error = %e, "Skipping unreadable submission record");
                    summary.malformed += 1;
                    continue;
                }
            };

            match self.extractor.extract(&headers, record.iter()) {
                Extraction::Feature(feature) => {
                    osm.write_feature(&feature)?;
                    geojson.write_feature(&feature)?;
                    summary.features += 1;
                }
                Extraction::Empty => summary.empty += 1,
                Extraction::Malformed(reason) => {
                    tracing::warn!(line, reason = %reason, "Skipping malformed submission record");
                    summary.malformed += 1;
                }
            }
        }

        osm.finish()?;
        geojson.finish()?;

        tracing::info!(
            records = summary.records,
            features = summary.features,
            malformed = summary.malformed,
            "Converted submissions"
        );
        Ok(summary)
    }

    /// Write `{filespec}.osm` and `{filespec}.geojson`
    ///
    /// With empty `data` the CSV is read from `filespec` itself.
    pub fn convert_csv(&self, filespec: &Path, data: &[u8]) -> Result<ConvertedFiles> {
        let osm_path = with_suffix(filespec, ".osm");
        let geojson_path = with_suffix(filespec, ".geojson");

        let osm_out = BufWriter::new(File::create(&osm_path)?);
        let geojson_out = BufWriter::new(File::create(&geojson_path)?);

        let summary = if data.is_empty() {
            self.convert(File::open(filespec)?, osm_out, geojson_out)?
        } else {
            self.convert(data, osm_out, geojson_out)?
        };

        Ok(ConvertedFiles {
            osm: osm_path,
            geojson: geojson_path,
            summary,
        })
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffix_is_appended() {
        assert_eq!(
            with_suffix(Path::new("/tmp/subs.csv"), ".osm"),
            PathBuf::from("/tmp/subs.csv.osm")
        );
    }

    #[test]
    fn test_counts_stay_in_sync() {
        let csv = "SubmissionDate,all-geopoint,all-amenity,KEY\n\
                   2023-01-01,1 2,cafe,uuid:1\n\
                   2023-01-01,,bar,uuid:2\n\
                   ,,,\n";
        let converter = SubmissionConverter::new(&SubmissionConfig::default());
        let mut osm = Vec::new();
        let mut geojson = Vec::new();
        let summary = converter.convert(csv.as_bytes(), &mut osm, &mut geojson).unwrap();

        assert_eq!(
            summary,
            ConversionSummary {
                records: 3,
                features: 1,
                empty: 1,
                malformed: 1,
            }
        );
        let osm = String::from_utf8(osm).unwrap();
        assert_eq!(osm.matches("<node ").count(), 1);
        let geojson: serde_json::Value = serde_json::from_slice(&geojson).unwrap();
        assert_eq!(geojson["features"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_unreadable_record_is_skipped_and_outputs_stay_framed() {
        let csv: &[u8] = b"geopoint,amenity\n1 2,cafe\n3 4,caf\xff\n5 6,bar\n";
        let converter = SubmissionConverter::new(&SubmissionConfig::default());
        let mut osm = Vec::new();
        let mut geojson = Vec::new();
        let summary = converter.convert(csv, &mut osm, &mut geojson).unwrap();

        assert_eq!(summary.records, 3);
        assert_eq!(summary.features, 2);
        assert_eq!(summary.malformed, 1);

        let osm = String::from_utf8(osm).unwrap();
        assert!(osm.trim_end().ends_with("</osm>"));
        assert_eq!(osm.matches("<node ").count(), 2);
        assert!(osm.contains(r#"v="bar""#));
        let geojson: serde_json::Value = serde_json::from_slice(&geojson).unwrap();
        assert_eq!(geojson["features"].as_array().unwrap().len(), 2);
    }
}
