//! Typed metric records produced by one collection.

use tracing::debug;
use wemportal_core::Result;

use crate::catalog::{MetricCatalog, MetricKind};
use crate::parser::{self, ParsedValue};
use crate::scraper::RawDataPoint;

#[derive(Debug, Clone, PartialEq)]
pub struct MetricRecord {
    /// Fully qualified metric name, namespace included.
    pub name: String,
    pub kind: MetricKind,
    pub value: ParsedValue,
    pub help: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub records: Vec<MetricRecord>,
}

impl Snapshot {
    /// Translates raw points through the catalog. Unknown labels are skipped;
    /// a known label with unparsable text fails the whole snapshot.
    pub fn translate(points: &[RawDataPoint], catalog: &MetricCatalog) -> Result<Self> {
        let mut records = Vec::with_capacity(points.len());
        for point in points {
            let Some(def) = catalog.lookup(&point.label) else {
                debug!(label = %point.label, "Skipping label without catalog entry");
                continue;
            };
            let value = parser::parse(&point.text, def)?;
            records.push(MetricRecord {
                name: def.metric_name(),
                kind: def.kind,
                value,
                help: def.label.to_string(),
            });
        }
        Ok(Self { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&MetricRecord> {
        self.records.iter().find(|r| r.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wemportal_core::Error;

    fn sample_text(kind: MetricKind, strip: Option<usize>) -> String {
        match (kind, strip) {
            (MetricKind::Info, _) => "Heizen".to_string(),
            (_, Some(k)) => format!("7{}", " ".repeat(k)),
            (_, None) => "7".to_string(),
        }
    }

    #[test]
    fn test_one_record_per_catalog_entry() {
        let catalog = MetricCatalog::standard();
        let points: Vec<RawDataPoint> = catalog
            .iter()
            .map(|d| RawDataPoint::new(d.label, sample_text(d.kind, d.unit_strip)))
            .collect();

        let snapshot = Snapshot::translate(&points, &catalog).unwrap();
        assert_eq!(snapshot.len(), catalog.len());
        for (record, def) in snapshot.records.iter().zip(catalog.iter()) {
            assert_eq!(record.name, def.metric_name());
            assert_eq!(record.kind, def.kind);
            assert_eq!(record.help, def.label);
        }
    }

    #[test]
    fn test_unknown_label_is_skipped() {
        let catalog = MetricCatalog::standard();
        let points = vec![
            RawDataPoint::new("Unbekannter Wert", "kaputt"),
            RawDataPoint::new("LWT", "30.5 °C"),
        ];
        let snapshot = Snapshot::translate(&points, &catalog).unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(
            snapshot.get("wemportal_lwt_temperature_celsius").unwrap().value,
            ParsedValue::Number(30.5)
        );
    }

    #[test]
    fn test_malformed_known_label_fails() {
        let catalog = MetricCatalog::standard();
        let points = vec![
            RawDataPoint::new("LWT", "30.5 °C"),
            RawDataPoint::new("Druckgas", "--- °C"),
        ];
        let err = Snapshot::translate(&points, &catalog).unwrap_err();
        assert!(matches!(err, Error::MalformedValue { ref label, .. } if label == "Druckgas"));
    }

    #[test]
    fn test_record_carries_parser_value() {
        let catalog = MetricCatalog::standard();
        let points = vec![
            RawDataPoint::new("Stellung Umschaltventil", "Heizen"),
            RawDataPoint::new("Status E-Heizung 1", parser::OFF_TEXT),
        ];
        let snapshot = Snapshot::translate(&points, &catalog).unwrap();
        for (record, point) in snapshot.records.iter().zip(&points) {
            let def = catalog.lookup(&point.label).unwrap();
            assert_eq!(record.value, parser::parse(&point.text, def).unwrap());
        }
        assert_eq!(snapshot.records[1].value.as_number(), Some(0.0));
    }

    #[test]
    fn test_empty_scrape_is_empty_snapshot() {
        let snapshot = Snapshot::translate(&[], &MetricCatalog::standard()).unwrap();
        assert!(snapshot.is_empty());
    }
}
