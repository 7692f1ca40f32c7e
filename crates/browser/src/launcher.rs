//! Launching Chrome with a debugging port and attaching to its page target.

use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};
use tracing::{debug, info};
use wemportal_core::config::BrowserConfig;
use wemportal_core::{Error, Result};

use crate::cdp::CdpClient;
use crate::driver::{remove_profile, Browser, BrowserLauncher, CdpBrowser};

/// Options fixed for every session the launcher creates.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub binary: Option<String>,
    pub headless: bool,
    pub disable_gpu: bool,
    pub extra_args: Vec<String>,
    pub ready_timeout: Duration,
    /// Per-command CDP timeout and the bound for document loads.
    pub command_timeout: Duration,
    pub profiles_dir: PathBuf,
}

impl LaunchOptions {
    pub fn from_config(config: &BrowserConfig, command_timeout: Duration, profiles_dir: PathBuf) -> Self {
        Self {
            binary: config.binary.clone(),
            headless: config.headless,
            disable_gpu: config.disable_gpu,
            extra_args: config.extra_args.clone(),
            ready_timeout: Duration::from_secs(config.ready_timeout_secs),
            command_timeout,
            profiles_dir,
        }
    }
}

pub struct ChromeLauncher {
    options: LaunchOptions,
}

impl ChromeLauncher {
    pub fn new(options: LaunchOptions) -> Self {
        Self { options }
    }
}

#[async_trait]
impl BrowserLauncher for ChromeLauncher {
    async fn launch(&self) -> Result<Box<dyn Browser>> {
        let options = &self.options;
        let browser_path = match &options.binary {
            Some(path) => path.clone(),
            None => find_browser_binary()
                .ok_or_else(|| Error::Automation("Chrome/Chromium not found. Please install it.".into()))?,
        };

        let debug_port = find_free_port().await?;
        let profile_dir = options.profiles_dir.join(format!("profile-{}", debug_port));
        std::fs::create_dir_all(&profile_dir)?;

        match spawn_and_attach(options, &browser_path, debug_port, &profile_dir).await {
            Ok((child, cdp)) => Ok(Box::new(CdpBrowser::new(
                child,
                cdp,
                profile_dir,
                options.command_timeout,
            ))),
            Err(e) => {
                remove_profile(&profile_dir).await;
                Err(e)
            }
        }
    }
}

/// Starts Chrome on `debug_port` and attaches to its page target. A child
/// that never gets attached is killed when dropped.
async fn spawn_and_attach(
    options: &LaunchOptions,
    browser_path: &str,
    debug_port: u16,
    profile_dir: &Path,
) -> Result<(Child, CdpClient)> {
    let args = build_browser_args(options, debug_port, profile_dir);

    info!(
        binary = %browser_path,
        port = debug_port,
        headless = options.headless,
        "Launching browser"
    );

    let child = Command::new(browser_path)
        .args(&args)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| Error::Automation(format!("failed to launch {}: {}", browser_path, e)))?;

    wait_for_cdp_ready(debug_port, options.ready_timeout).await?;
    let page_ws_url = get_page_ws_url(debug_port).await?;

    let cdp = CdpClient::connect(&page_ws_url, options.command_timeout)
        .await
        .map_err(|e| Error::Automation(e.to_string()))?;
    for domain in ["Page", "Runtime", "DOM"] {
        cdp.enable_domain(domain)
            .await
            .map_err(|e| Error::Automation(e.to_string()))?;
    }

    info!(ws_url = %page_ws_url, "CDP connection established (page target)");
    Ok((child, cdp))
}

fn build_browser_args(options: &LaunchOptions, debug_port: u16, profile_dir: &Path) -> Vec<String> {
    let mut args = vec![
        format!("--remote-debugging-port={}", debug_port),
        format!("--user-data-dir={}", profile_dir.display()),
        "--no-first-run".to_string(),
        "--no-default-browser-check".to_string(),
        "--disable-background-networking".to_string(),
        "--disable-extensions".to_string(),
        "--disable-sync".to_string(),
        "--disable-translate".to_string(),
        "--password-store=basic".to_string(),
    ];
    if options.headless {
        args.push("--headless=new".to_string());
    }
    if options.disable_gpu {
        args.push("--disable-gpu".to_string());
    }
    args.extend(options.extra_args.iter().cloned());
    args.push("--window-size=1280,720".to_string());
    args.push("about:blank".to_string());
    args
}

/// Find a Chrome/Chromium binary on this system.
pub fn find_browser_binary() -> Option<String> {
    let candidates: &[&str] = if cfg!(target_os = "macos") {
        &[
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
        ]
    } else if cfg!(target_os = "linux") {
        &[
            "google-chrome",
            "google-chrome-stable",
            "chromium",
            "chromium-browser",
            "/usr/bin/google-chrome",
            "/usr/bin/chromium",
        ]
    } else {
        &[
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
        ]
    };

    for candidate in candidates {
        if Path::new(candidate).exists() {
            return Some(candidate.to_string());
        }
        if !candidate.contains('/') && !candidate.contains('\\') && which::which(candidate).is_ok() {
            return Some(candidate.to_string());
        }
    }
    None
}

async fn find_free_port() -> Result<u16> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();
    drop(listener);
    Ok(port)
}

/// Polls /json/version until Chrome answers.
async fn wait_for_cdp_ready(port: u16, timeout: Duration) -> Result<()> {
    let start = std::time::Instant::now();
    let url = format!("http://127.0.0.1:{}/json/version", port);

    loop {
        if start.elapsed() > timeout {
            return Err(Error::Timeout(format!(
                "Chrome CDP not ready after {}s on port {}",
                timeout.as_secs(),
                port
            )));
        }

        if let Ok(resp) = reqwest::get(&url).await {
            if let Ok(body) = resp.json::<Value>().await {
                if body.get("webSocketDebuggerUrl").is_some() {
                    debug!(port, "CDP endpoint ready");
                    return Ok(());
                }
            }
        }

        tokio::time::sleep(Duration::from_millis(200)).await;
    }
}

/// WebSocket URL of the first "page" target, retried while Chrome creates it.
async fn get_page_ws_url(port: u16) -> Result<String> {
    let url = format!("http://127.0.0.1:{}/json/list", port);

    for attempt in 0..10 {
        if attempt > 0 {
            tokio::time::sleep(Duration::from_millis(300)).await;
        }

        let resp = match reqwest::get(&url).await {
            Ok(r) => r,
            Err(_) => continue,
        };
        let targets: Vec<Value> = match resp.json().await {
            Ok(t) => t,
            Err(_) => continue,
        };

        if let Some(ws_url) = page_ws_url(&targets) {
            return Ok(ws_url);
        }
    }

    Err(Error::Automation("no page target found after retries".to_string()))
}

fn page_ws_url(targets: &[Value]) -> Option<String> {
    targets
        .iter()
        .filter(|t| t.get("type").and_then(|v| v.as_str()) == Some("page"))
        .find_map(|t| t.get("webSocketDebuggerUrl").and_then(|v| v.as_str()))
        .map(|s| s.to_string())
}
