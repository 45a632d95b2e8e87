//! GeoJSON output

use super::feature::Feature;
use crate::domain::Result;
use serde_json::json;
use std::io::Write;

/// Streams features into a `FeatureCollection` of points
pub struct GeoJsonWriter<W: Write> {
    out: W,
    written: usize,
}

impl<W: Write> GeoJsonWriter<W> {
    /// Writes the collection header
    pub fn new(mut out: W) -> Result<Self> {
        out.write_all(br#"{"type":"FeatureCollection","features":["#)?;
        Ok(Self { out, written: 0 })
    }

    pub fn write_feature(&mut self, feature: &Feature) -> Result<()> {
        if self.written > 0 {
            self.out.write_all(b",")?;
        }
        let value = json!({
            "type": "Feature",
            "geometry": {
                "type": "Point",
                "coordinates": [feature.lon, feature.lat],
            },
            "properties": feature.tags,
        });
        self.out.write_all(b"\n")?;
        serde_json::to_writer(&mut self.out, &value)?;
        self.written += 1;
        Ok(())
    }

    /// Closes the collection and returns the sink
    pub fn finish(mut self) -> Result<W> {
        self.out.write_all(b"\n]}\n")?;
        self.out.flush()?;
        Ok(self.out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_output_is_a_valid_feature_collection() {
        let feature = Feature {
            lat: -1.25,
            lon: 36.8,
            tags: BTreeMap::from([("amenity".to_string(), "cafe".to_string())]),
            user: None,
            timestamp: None,
        };

        let mut writer = GeoJsonWriter::new(Vec::new()).unwrap();
        writer.write_feature(&feature).unwrap();
        writer.write_feature(&feature).unwrap();
        let bytes = writer.finish().unwrap();

        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["type"], "FeatureCollection");
        assert_eq!(value["features"].as_array().unwrap().len(), 2);
        assert_eq!(value["features"][0]["geometry"]["coordinates"][0], 36.8);
        assert_eq!(value["features"][0]["properties"]["amenity"], "cafe");
    }

    #[test]
    fn test_empty_collection() {
        let bytes = GeoJsonWriter::new(Vec::new()).unwrap().finish().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(value["features"].as_array().unwrap().is_empty());
    }
}
