//! CDP-based browser automation for the portal session.
//!
//! - `cdp`: WebSocket JSON-RPC client for one page target
//! - `driver`: the `Browser` / `BrowserLauncher` traits and their CDP implementation
//! - `launcher`: starting Chrome with a debugging port and a throwaway profile

pub mod cdp;
pub mod driver;
pub mod launcher;

pub use driver::{Browser, BrowserLauncher, CdpBrowser, ElementHandle, ElementText};
pub use launcher::{ChromeLauncher, LaunchOptions};
