//! Scripted in-memory browser for session and orchestrator tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use wemportal_browser::{Browser, BrowserLauncher, ElementHandle, ElementText};
use wemportal_core::config::PortalConfig;
use wemportal_core::{Credentials, Error, Result};

use crate::portal;
use crate::session::SessionSettings;

/// Shared state behind every browser a [`ScriptedLauncher`] hands out.
#[derive(Debug)]
pub struct Script {
    pub calls: Vec<String>,
    pub launches: usize,
    pub closes: usize,
    /// The next N launches fail.
    pub fail_launches: usize,
    /// The next N timestamp reads fail as if the browser died.
    pub fail_scrapes: usize,
    pub always_fail_scrapes: bool,
    /// Answers for `is_stale`; `false` once drained.
    pub stale: VecDeque<bool>,
    pub timestamp: String,
    pub rows: Vec<(String, String)>,
    /// A browser call is between its entry and its exit.
    in_call: bool,
    /// Calls that entered while another one was still running.
    pub overlaps: usize,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            launches: 0,
            closes: 0,
            fail_launches: 0,
            fail_scrapes: 0,
            always_fail_scrapes: false,
            stale: VecDeque::new(),
            timestamp: "19.10.2026 12:00".to_string(),
            rows: vec![
                ("Außentemperatur".into(), "3.5 °C".into()),
                ("Schaltspiele Verdichter".into(), "1234".into()),
                ("Stellung Umschaltventil".into(), "Heizen".into()),
                ("Status E-Heizung 1".into(), "Aus".into()),
                ("Nicht im Katalog".into(), "egal".into()),
            ],
            in_call: false,
            overlaps: 0,
        }
    }
}

impl Script {
    pub fn count(&self, call: &str) -> usize {
        self.calls.iter().filter(|c| c.as_str() == call).count()
    }
}

pub type SharedScript = Arc<Mutex<Script>>;

pub fn shared(script: Script) -> SharedScript {
    Arc::new(Mutex::new(script))
}

pub struct ScriptedBrowser {
    script: SharedScript,
}

impl ScriptedBrowser {
    pub fn new(script: SharedScript) -> Self {
        Self { script }
    }

    /// Marks entry, gives other tasks a chance to run, then marks exit.
    async fn record(&self, call: String) -> std::sync::MutexGuard<'_, Script> {
        {
            let mut script = self.script.lock().unwrap();
            if script.in_call {
                script.overlaps += 1;
            }
            script.in_call = true;
        }
        tokio::task::yield_now().await;
        let mut script = self.script.lock().unwrap();
        script.in_call = false;
        script.calls.push(call);
        script
    }
}

#[async_trait]
impl Browser for ScriptedBrowser {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        self.record(format!("navigate:{}", url)).await;
        Ok(())
    }

    async fn click(&mut self, selector: &str) -> Result<()> {
        self.record(format!("click:{}", selector)).await;
        Ok(())
    }

    async fn type_text(&mut self, selector: &str, _text: &str) -> Result<()> {
        self.record(format!("type:{}", selector)).await;
        Ok(())
    }

    async fn wait_for_present(&mut self, selector: &str, _timeout: Duration) -> Result<()> {
        self.record(format!("present:{}", selector)).await;
        Ok(())
    }

    async fn wait_for_clickable(&mut self, selector: &str, _timeout: Duration) -> Result<()> {
        self.record(format!("clickable:{}", selector)).await;
        Ok(())
    }

    async fn text(&mut self, selector: &str) -> Result<String> {
        let mut script = self.record(format!("text:{}", selector)).await;
        if selector != portal::LAST_UPDATE {
            return Err(Error::Automation(format!("element not found: {}", selector)));
        }
        if script.always_fail_scrapes || script.fail_scrapes > 0 {
            script.fail_scrapes = script.fail_scrapes.saturating_sub(1);
            return Err(Error::Automation("chrome not reachable".into()));
        }
        Ok(script.timestamp.clone())
    }

    async fn query_all(&mut self, selector: &str) -> Result<Vec<ElementText>> {
        let script = self.record(format!("query:{}", selector)).await;
        let (suffix, pick_value) = match selector {
            portal::DATA_NAMES => ("DataName", false),
            portal::DATA_VALUES => ("DataValue", true),
            _ => return Ok(Vec::new()),
        };
        Ok(script
            .rows
            .iter()
            .enumerate()
            .map(|(i, (label, value))| ElementText {
                id: format!("ctl00_r{}_{}", i, suffix),
                text: if pick_value { value.clone() } else { label.clone() },
            })
            .collect())
    }

    async fn element_handle(&mut self, selector: &str) -> Result<ElementHandle> {
        self.record(format!("handle:{}", selector)).await;
        Ok(ElementHandle(selector.to_string()))
    }

    async fn is_stale(&mut self, _handle: &ElementHandle) -> Result<bool> {
        let mut script = self.record("stale".to_string()).await;
        Ok(script.stale.pop_front().unwrap_or(false))
    }

    async fn enter_frame(&mut self, index: usize) -> Result<()> {
        self.record(format!("frame:{}", index)).await;
        Ok(())
    }

    async fn leave_frame(&mut self) -> Result<()> {
        self.record("frame:top".to_string()).await;
        Ok(())
    }

    async fn close(&mut self) {
        let mut script = self.record("close".to_string()).await;
        script.closes += 1;
    }
}

pub struct ScriptedLauncher {
    script: SharedScript,
}

impl ScriptedLauncher {
    pub fn new(script: SharedScript) -> Self {
        Self { script }
    }
}

#[async_trait]
impl BrowserLauncher for ScriptedLauncher {
    async fn launch(&self) -> Result<Box<dyn Browser>> {
        tokio::task::yield_now().await;
        {
            let mut script = self.script.lock().unwrap();
            script.launches += 1;
            if script.fail_launches > 0 {
                script.fail_launches -= 1;
                return Err(Error::Automation("failed to launch chrome".into()));
            }
        }
        Ok(Box::new(ScriptedBrowser::new(self.script.clone())))
    }
}

pub fn credentials() -> Credentials {
    Credentials {
        user: "installer".into(),
        password: "secret".into(),
        access_code: "1234".into(),
    }
}

/// Zero poll timeout: one staleness probe per load wait.
pub fn settings() -> SessionSettings {
    let mut portal = PortalConfig::default();
    portal.load_poll_timeout_ms = 0;
    portal.load_poll_interval_ms = 1;
    SessionSettings::from_config(&portal)
}
