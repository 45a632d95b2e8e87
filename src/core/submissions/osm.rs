//! OSM XML output

use super::feature::Feature;
use crate::domain::Result;
use quick_xml::escape::escape;
use std::io::Write;

pub const OSM_HEADER: &str =
    "<?xml version='1.0' encoding='UTF-8'?>\n<osm version=\"0.6\" generator=\"odk-relay\">\n";
pub const OSM_FOOTER: &str = "</osm>\n";

/// Streams features as OSM nodes with negative (new) ids
pub struct OsmWriter<W: Write> {
    out: W,
    next_id: i64,
}

impl<W: Write> OsmWriter<W> {
    /// Writes the document header
    pub fn new(mut out: W) -> Result<Self> {
        out.write_all(OSM_HEADER.as_bytes())?;
        Ok(Self { out, next_id: -1 })
    }

    pub fn write_feature(&mut self, feature: &Feature) -> Result<()> {
        let mut node = format!(
            "  <node id=\"{}\" version=\"1\" lat=\"{}\" lon=\"{}\"",
            self.next_id, feature.lat, feature.lon
        );
        if let Some(timestamp) = &feature.timestamp {
            node.push_str(&format!(" timestamp=\"{}\"", escape(timestamp.as_str())));
        }
        if let Some(user) = &feature.user {
            node.push_str(&format!(" user=\"{}\"", escape(user.as_str())));
        }
        node.push_str(">\n");

        for (key, value) in &feature.tags {
            node.push_str(&format!(
                "    <tag k=\"{}\" v=\"{}\"/>\n",
                escape(key.as_str()),
                escape(value.as_str())
            ));
        }
        node.push_str("  </node>\n");

        self.out.write_all(node.as_bytes())?;
        self.next_id -= 1;
        Ok(())
    }

    /// Writes the footer and returns the sink
    pub fn finish(mut self) -> Result<W> {
        self.out.write_all(OSM_FOOTER.as_bytes())?;
        self.out.flush()?;
        Ok(self.out)
    }
}
