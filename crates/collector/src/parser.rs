//! Portal text → typed value.

use wemportal_core::{Error, Result};

use crate::catalog::{MetricDefinition, MetricKind};

/// What the portal shows for a switched-off unit.
pub const OFF_TEXT: &str = "Aus";

#[derive(Debug, Clone, PartialEq)]
pub enum ParsedValue {
    Number(f64),
    Info(String),
}

impl ParsedValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            Self::Info(_) => None,
        }
    }
}

pub fn parse(raw: &str, def: &MetricDefinition) -> Result<ParsedValue> {
    if def.kind == MetricKind::Info {
        return Ok(ParsedValue::Info(raw.to_string()));
    }
    if raw == OFF_TEXT {
        return Ok(ParsedValue::Number(0.0));
    }

    let numeric = match def.unit_strip {
        Some(k) if k > 0 => strip_suffix_chars(raw, k).ok_or_else(|| malformed(raw, def))?,
        _ => raw,
    };

    numeric
        .trim()
        .parse::<f64>()
        .map(ParsedValue::Number)
        .map_err(|_| malformed(raw, def))
}

/// Drops the last `k` characters; `None` when the text is shorter than that.
fn strip_suffix_chars(text: &str, k: usize) -> Option<&str> {
    let count = text.chars().count();
    if count < k {
        return None;
    }
    let end = text
        .char_indices()
        .nth(count - k)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    Some(&text[..end])
}

fn malformed(raw: &str, def: &MetricDefinition) -> Error {
    Error::MalformedValue {
        label: def.label.to_string(),
        text: raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{MetricCatalog, TIMESTAMP_LABEL};

    fn def(label: &str) -> MetricDefinition {
        MetricCatalog::standard().lookup(label).unwrap().clone()
    }

    #[test]
    fn test_celsius_example() {
        let v = parse("21.5 °C", &def("Außentemperatur")).unwrap();
        assert_eq!(v, ParsedValue::Number(21.5));
    }

    #[test]
    fn test_off_is_zero_for_every_numeric_definition() {
        let catalog = MetricCatalog::standard();
        for d in catalog.iter().filter(|d| d.kind.is_numeric()) {
            assert_eq!(
                parse(OFF_TEXT, d).unwrap(),
                ParsedValue::Number(0.0),
                "{}",
                d.label
            );
        }
    }

    #[test]
    fn test_strip_matches_prefix_parse() {
        let catalog = MetricCatalog::standard();
        for d in catalog.iter() {
            let Some(k) = d.unit_strip else { continue };
            let unit: String = "X".repeat(k);
            let text = format!("-3.25{}", unit);
            assert_eq!(parse(&text, d).unwrap(), ParsedValue::Number(-3.25), "{}", d.label);
        }
    }

    #[test]
    fn test_other_units() {
        assert_eq!(
            parse("1.2m3/h", &def("Volumenstrom")).unwrap(),
            ParsedValue::Number(1.2)
        );
        assert_eq!(
            parse("12.7 KWh", &def("WW Energie Tag")).unwrap(),
            ParsedValue::Number(12.7)
        );
        assert_eq!(
            parse("55 %", &def("Drehzahl Pumpe")).unwrap(),
            ParsedValue::Number(55.0)
        );
    }

    #[test]
    fn test_no_strip_parses_full_text() {
        assert_eq!(
            parse("1234", &def("Schaltspiele Verdichter")).unwrap(),
            ParsedValue::Number(1234.0)
        );
        assert_eq!(
            parse("1", &def("Status E-Heizung 1")).unwrap(),
            ParsedValue::Number(1.0)
        );
    }

    #[test]
    fn test_info_kept_verbatim() {
        assert_eq!(
            parse("Heizen", &def("Stellung Umschaltventil")).unwrap(),
            ParsedValue::Info("Heizen".into())
        );
        assert_eq!(
            parse(OFF_TEXT, &def("Stellung Umschaltventil")).unwrap(),
            ParsedValue::Info(OFF_TEXT.into())
        );
        assert_eq!(
            parse("19.10.2026 12:00", &def(TIMESTAMP_LABEL)).unwrap(),
            ParsedValue::Info("19.10.2026 12:00".into())
        );
    }

    #[test]
    fn test_malformed_values() {
        let err = parse("-- °C", &def("Außentemperatur")).unwrap_err();
        assert!(matches!(err, Error::MalformedValue { ref label, .. } if label == "Außentemperatur"));
        assert!(!err.is_automation());

        assert!(parse("°C", &def("Außentemperatur")).is_err());
        assert!(parse("", &def("Schaltspiele E1")).is_err());
        assert!(parse("viele", &def("Schaltspiele E1")).is_err());
    }

    #[test]
    fn test_strip_counts_characters() {
        assert_eq!(strip_suffix_chars("21.5 °C", 3), Some("21.5"));
        assert_eq!(strip_suffix_chars("ab", 3), None);
        assert_eq!(strip_suffix_chars("abc", 3), Some(""));
    }
}
