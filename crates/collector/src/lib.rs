//! Collecting the specialist data of a Weishaupt WEM portal session as metric snapshots.

pub mod catalog;
pub mod orchestrator;
pub mod parser;
pub mod portal;
pub mod scraper;
pub mod session;
pub mod snapshot;

#[cfg(test)]
mod testing;

pub use catalog::{MetricCatalog, MetricDefinition, MetricKind};
pub use orchestrator::{CollectionOrchestrator, CollectionPolicy, SessionStats};
pub use parser::ParsedValue;
pub use scraper::{PageScrape, PageScraper, RawDataPoint};
pub use session::{SessionManager, SessionSettings, SessionState};
pub use snapshot::{MetricRecord, Snapshot};
