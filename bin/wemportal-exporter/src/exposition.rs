//! Snapshot → Prometheus text exposition format.

use prometheus::proto::{Counter, Gauge, LabelPair, Metric, MetricFamily, MetricType};
use prometheus::{Encoder, TextEncoder};
use wemportal_collector::{MetricKind, MetricRecord, ParsedValue, Snapshot};
use wemportal_core::{Error, Result};

pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

const INFO_LABEL: &str = "value";

pub fn render(snapshot: &Snapshot) -> Result<String> {
    let families: Vec<MetricFamily> = snapshot.records.iter().map(family).collect();

    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder
        .encode(&families, &mut buffer)
        .map_err(|e| Error::Exposition(format!("failed to encode {} families: {}", families.len(), e)))?;

    String::from_utf8(buffer).map_err(|e| Error::Exposition(format!("encoder produced invalid UTF-8: {}", e)))
}

fn family(record: &MetricRecord) -> MetricFamily {
    let mut metric = Metric::default();
    let (name, field_type) = match (record.kind, &record.value) {
        (MetricKind::Counter, ParsedValue::Number(v)) => {
            let mut counter = Counter::default();
            counter.set_value(*v);
            metric.set_counter(counter);
            (format!("{}_total", record.name), MetricType::COUNTER)
        }
        (_, ParsedValue::Number(v)) => {
            metric.set_gauge(gauge(*v));
            (record.name.clone(), MetricType::GAUGE)
        }
        (_, ParsedValue::Info(text)) => {
            let mut label = LabelPair::default();
            label.set_name(INFO_LABEL.to_string());
            label.set_value(text.clone());
            metric.mut_label().push(label);
            metric.set_gauge(gauge(1.0));
            (format!("{}_info", record.name), MetricType::GAUGE)
        }
    };

    let mut family = MetricFamily::default();
    family.set_name(name);
    family.set_help(record.help.clone());
    family.set_field_type(field_type);
    family.mut_metric().push(metric);
    family
}

fn gauge(value: f64) -> Gauge {
    let mut gauge = Gauge::default();
    gauge.set_value(value);
    gauge
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, kind: MetricKind, value: ParsedValue, help: &str) -> MetricRecord {
        MetricRecord {
            name: name.to_string(),
            kind,
            value,
            help: help.to_string(),
        }
    }

    #[test]
    fn test_render_gauge() {
        let snapshot = Snapshot {
            records: vec![record(
                "wemportal_current_outside_temperature_celsius",
                MetricKind::Gauge,
                ParsedValue::Number(3.5),
                "Außentemperatur",
            )],
        };
        let text = render(&snapshot).unwrap();
        assert!(text.contains("# HELP wemportal_current_outside_temperature_celsius Außentemperatur"));
        assert!(text.contains("# TYPE wemportal_current_outside_temperature_celsius gauge"));
        assert!(text.contains("wemportal_current_outside_temperature_celsius 3.5"));
    }

    #[test]
    fn test_render_counter_gets_total_suffix() {
        let snapshot = Snapshot {
            records: vec![record(
                "wemportal_compressor_cycles",
                MetricKind::Counter,
                ParsedValue::Number(1234.0),
                "Schaltspiele Verdichter",
            )],
        };
        let text = render(&snapshot).unwrap();
        assert!(text.contains("# TYPE wemportal_compressor_cycles_total counter"));
        assert!(text.contains("wemportal_compressor_cycles_total 1234"));
    }

    #[test]
    fn test_render_info_as_labelled_gauge() {
        let snapshot = Snapshot {
            records: vec![record(
                "wemportal_crossover_valve_setting",
                MetricKind::Info,
                ParsedValue::Info("Heizen".into()),
                "Stellung Umschaltventil",
            )],
        };
        let text = render(&snapshot).unwrap();
        assert!(text.contains("# TYPE wemportal_crossover_valve_setting_info gauge"));
        assert!(text.contains("wemportal_crossover_valve_setting_info{value=\"Heizen\"} 1"));
    }

    #[test]
    fn test_render_empty_snapshot() {
        assert_eq!(render(&Snapshot::default()).unwrap(), "");
    }
}
