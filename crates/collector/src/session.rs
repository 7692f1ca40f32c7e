//! The single authenticated portal session and its lifecycle.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info};
use wemportal_browser::{Browser, BrowserLauncher};
use wemportal_core::config::PortalConfig;
use wemportal_core::{Credentials, Error, Result};

use crate::portal;
use crate::scraper::{PageScrape, PageScraper};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Authenticating,
    Ready,
    Refreshing,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Uninitialized => "uninitialized",
            Self::Authenticating => "authenticating",
            Self::Ready => "ready",
            Self::Refreshing => "refreshing",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub portal_url: String,
    pub step_timeout: Duration,
    pub load_poll_timeout: Duration,
    pub load_poll_interval: Duration,
}

impl SessionSettings {
    pub fn from_config(config: &PortalConfig) -> Self {
        Self {
            portal_url: config.url.clone(),
            step_timeout: config.step_timeout(),
            load_poll_timeout: config.load_poll_timeout(),
            load_poll_interval: config.load_poll_interval(),
        }
    }
}

/// Outcome of one staleness probe on the refresh control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadProbe {
    /// The server replaced the control: a reload happened, keep watching.
    Replaced,
    /// The control survived the whole probe window: loading is over.
    Settled,
}

pub struct SessionManager {
    launcher: Arc<dyn BrowserLauncher>,
    credentials: Credentials,
    settings: SessionSettings,
    browser: Option<Box<dyn Browser>>,
    state: SessionState,
    page_fresh: bool,
    collections_since_restart: u64,
    restarts: u64,
    /// A session came up at least once; bringing another one up is a restart.
    launched_before: bool,
}

impl SessionManager {
    pub fn new(
        launcher: Arc<dyn BrowserLauncher>,
        credentials: Credentials,
        settings: SessionSettings,
    ) -> Self {
        Self {
            launcher,
            credentials,
            settings,
            browser: None,
            state: SessionState::Uninitialized,
            page_fresh: false,
            collections_since_restart: 0,
            restarts: 0,
            launched_before: false,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_page_fresh(&self) -> bool {
        self.page_fresh
    }

    pub fn collections_since_restart(&self) -> u64 {
        self.collections_since_restart
    }

    pub fn restarts(&self) -> u64 {
        self.restarts
    }

    /// Launch a browser, log in, unlock the specialist page and wait for it
    /// to load. On failure the half-built browser is torn down again.
    pub async fn start(&mut self) -> Result<()> {
        self.teardown().await;
        self.collections_since_restart = 0;
        self.state = SessionState::Authenticating;

        let mut browser = match self.launcher.launch().await {
            Ok(b) => b,
            Err(e) => {
                self.state = SessionState::Uninitialized;
                return Err(e);
            }
        };

        let result: Result<()> = async {
            login(browser.as_mut(), &self.credentials, &self.settings).await?;
            wait_until_loaded(browser.as_mut(), &self.settings).await
        }
        .await;

        if let Err(e) = result {
            browser.close().await;
            self.state = SessionState::Uninitialized;
            return Err(e);
        }

        self.browser = Some(browser);
        self.state = SessionState::Ready;
        self.page_fresh = true;
        self.launched_before = true;
        info!("Session ready");
        Ok(())
    }

    /// Start a session if none is usable. Replacing a session that was up
    /// before counts as a restart.
    pub async fn ensure_started(&mut self) -> Result<()> {
        if self.state == SessionState::Ready && self.browser.is_some() {
            return Ok(());
        }
        if self.launched_before {
            self.restart().await
        } else {
            self.start().await
        }
    }

    /// Click the portal's refresh control unless the page is already fresh.
    pub async fn ensure_fresh(&mut self) -> Result<()> {
        if self.page_fresh {
            return Ok(());
        }
        let Some(browser) = self.browser.as_deref_mut() else {
            return Err(no_session());
        };
        self.state = SessionState::Refreshing;
        let result = refresh(browser, &self.settings).await;
        self.settle(&result);
        result?;
        self.page_fresh = true;
        Ok(())
    }

    pub async fn wait_until_loaded(&mut self) -> Result<()> {
        let Some(browser) = self.browser.as_deref_mut() else {
            return Err(no_session());
        };
        let result = wait_until_loaded(browser, &self.settings).await;
        self.settle(&result);
        result
    }

    /// Tear down the browser unconditionally and start over.
    pub async fn restart(&mut self) -> Result<()> {
        self.restarts += 1;
        info!(restarts = self.restarts, "Restarting browser session");
        self.start().await
    }

    /// Restart once more than `limit` collections ran on this session.
    pub async fn ensure_recycled(&mut self, limit: u64) -> Result<()> {
        if self.collections_since_restart <= limit {
            return Ok(());
        }
        info!(
            collections = self.collections_since_restart,
            "Recycling browser session"
        );
        let result = self.restart().await;
        self.collections_since_restart = 0;
        result
    }

    pub async fn scrape(&mut self) -> Result<PageScrape> {
        let Some(browser) = self.browser.as_deref_mut() else {
            return Err(no_session());
        };
        let result = PageScraper::scrape(browser).await;
        if matches!(&result, Err(e) if e.is_automation()) {
            self.state = SessionState::Uninitialized;
        }
        result
    }

    pub fn record_collection(&mut self) {
        self.collections_since_restart += 1;
    }

    /// The next collection has to trigger a server-side refresh again.
    pub fn mark_stale(&mut self) {
        self.page_fresh = false;
    }

    /// Explicit teardown at process shutdown.
    pub async fn shutdown(&mut self) {
        info!("Shutting down browser session");
        self.teardown().await;
    }

    async fn teardown(&mut self) {
        if let Some(mut browser) = self.browser.take() {
            browser.close().await;
        }
        self.state = SessionState::Uninitialized;
        self.page_fresh = false;
    }

    fn settle(&mut self, result: &Result<()>) {
        self.state = match result {
            Err(e) if e.is_automation() => SessionState::Uninitialized,
            _ => SessionState::Ready,
        };
    }
}

async fn login(
    browser: &mut dyn Browser,
    credentials: &Credentials,
    settings: &SessionSettings,
) -> Result<()> {
    browser.navigate(&settings.portal_url).await?;

    info!(user = %credentials.user, "Logging in");
    browser.click(portal::LOGIN_USER).await?;
    browser.type_text(portal::LOGIN_USER, &credentials.user).await?;
    browser.type_text(portal::LOGIN_PASSWORD, &credentials.password).await?;
    browser.click(portal::LOGIN_SUBMIT).await?;

    info!("Opening specialist page");
    browser
        .wait_for_present(portal::MENU_DEVICE, settings.step_timeout)
        .await?;
    browser.click(portal::MENU_DEVICE).await?;
    browser
        .wait_for_present(portal::MENU_SPECIALIST, settings.step_timeout)
        .await?;
    browser.click(portal::MENU_SPECIALIST).await?;

    browser.enter_frame(portal::ACCESS_CODE_FRAME).await?;
    browser
        .wait_for_present(portal::ACCESS_CODE_INPUT, settings.step_timeout)
        .await?;
    browser.click(portal::ACCESS_CODE_INPUT).await?;
    browser
        .type_text(portal::ACCESS_CODE_INPUT, &credentials.access_code)
        .await?;
    browser.click(portal::ACCESS_CODE_SUBMIT).await?;
    browser.leave_frame().await?;
    Ok(())
}

async fn refresh(browser: &mut dyn Browser, settings: &SessionSettings) -> Result<()> {
    info!("Refreshing page");
    browser
        .wait_for_clickable(portal::REFRESH_BUTTON, settings.step_timeout)
        .await?;
    browser.click(portal::REFRESH_BUTTON).await?;
    wait_until_loaded(browser, settings).await
}

/// Watches the refresh control until one probe window passes without the
/// server replacing it.
async fn wait_until_loaded(browser: &mut dyn Browser, settings: &SessionSettings) -> Result<()> {
    loop {
        browser
            .wait_for_present(portal::REFRESH_BUTTON, settings.step_timeout)
            .await?;
        let start = Instant::now();
        match probe_reload(browser, settings).await? {
            LoadProbe::Replaced => {
                debug!(took_ms = start.elapsed().as_millis() as u64, "Page reload took");
            }
            LoadProbe::Settled => {
                info!("Page loaded");
                return Ok(());
            }
        }
    }
}

async fn probe_reload(browser: &mut dyn Browser, settings: &SessionSettings) -> Result<LoadProbe> {
    let handle = browser.element_handle(portal::REFRESH_BUTTON).await?;
    let deadline = Instant::now() + settings.load_poll_timeout;
    loop {
        if browser.is_stale(&handle).await? {
            return Ok(LoadProbe::Replaced);
        }
        if Instant::now() >= deadline {
            debug!(
                window_ms = settings.load_poll_timeout.as_millis() as u64,
                "Refresh control settled"
            );
            return Ok(LoadProbe::Settled);
        }
        tokio::time::sleep(settings.load_poll_interval).await;
    }
}

fn no_session() -> Error {
    Error::Automation("no browser session".into())
}
