//! Reading the labelled data points off the specialist page.

use std::collections::HashMap;

use tracing::debug;
use wemportal_browser::{Browser, ElementText};
use wemportal_core::Result;

use crate::catalog::TIMESTAMP_LABEL;
use crate::portal;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDataPoint {
    pub label: String,
    pub text: String,
}

impl RawDataPoint {
    pub fn new(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageScrape {
    pub timestamp: String,
    /// Synthetic timestamp point first, then the page's points in document order.
    pub points: Vec<RawDataPoint>,
}

pub struct PageScraper;

impl PageScraper {
    pub async fn scrape(browser: &mut dyn Browser) -> Result<PageScrape> {
        let timestamp = browser.text(portal::LAST_UPDATE).await?;
        let names = browser.query_all(portal::DATA_NAMES).await?;
        let values = browser.query_all(portal::DATA_VALUES).await?;

        let mut points = Vec::with_capacity(names.len() + 1);
        points.push(RawDataPoint::new(TIMESTAMP_LABEL, timestamp.clone()));
        points.extend(correlate(&names, &values));

        debug!(
            timestamp = %timestamp,
            names = names.len(),
            values = values.len(),
            points = points.len(),
            "Scraped page"
        );

        Ok(PageScrape { timestamp, points })
    }
}

/// Pairs label elements with value elements sharing the same id stem.
///
/// Unpaired elements are dropped. A label seen twice keeps its first position
/// and takes the last value. A row labelled like the synthetic timestamp is
/// dropped too; the last-update element owns that point.
pub fn correlate(names: &[ElementText], values: &[ElementText]) -> Vec<RawDataPoint> {
    let by_stem: HashMap<&str, &str> = values
        .iter()
        .filter_map(|v| Some((id_stem(&v.id, portal::VALUE_ID_SUFFIX_LEN)?, v.text.as_str())))
        .collect();

    let mut points: Vec<RawDataPoint> = Vec::new();
    let mut position: HashMap<&str, usize> = HashMap::new();

    for name in names {
        if name.text == TIMESTAMP_LABEL {
            continue;
        }
        let Some(stem) = id_stem(&name.id, portal::NAME_ID_SUFFIX_LEN) else {
            continue;
        };
        let Some(text) = by_stem.get(stem) else {
            continue;
        };
        match position.get(name.text.as_str()) {
            Some(&i) => points[i].text = text.to_string(),
            None => {
                position.insert(name.text.as_str(), points.len());
                points.push(RawDataPoint::new(name.text.clone(), *text));
            }
        }
    }
    points
}

fn id_stem(id: &str, suffix_len: usize) -> Option<&str> {
    if id.len() <= suffix_len {
        return None;
    }
    id.get(..id.len() - suffix_len)
}
