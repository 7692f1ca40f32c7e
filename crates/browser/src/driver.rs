//! The automation seam: what the portal session needs from a browser.

use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::process::Child;
use tracing::debug;
use wemportal_core::{Error, Result};

use crate::cdp::{CdpClient, CdpError};

/// `id` attribute and rendered text of one matched element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementText {
    pub id: String,
    pub text: String,
}

/// Reference to a live DOM node, used to detect when the page replaced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementHandle(pub String);

/// One exclusively owned browser with a single page.
///
/// Selectors are CSS selectors evaluated against the current document, which
/// is the top-level one unless [`Browser::enter_frame`] was called. A missing
/// element is `Error::Automation`; an elapsed wait is `Error::Timeout`.
#[async_trait]
pub trait Browser: Send {
    async fn navigate(&mut self, url: &str) -> Result<()>;

    async fn click(&mut self, selector: &str) -> Result<()>;

    async fn type_text(&mut self, selector: &str, text: &str) -> Result<()>;

    async fn wait_for_present(&mut self, selector: &str, timeout: Duration) -> Result<()>;

    /// Present, rendered and not disabled.
    async fn wait_for_clickable(&mut self, selector: &str, timeout: Duration) -> Result<()>;

    async fn text(&mut self, selector: &str) -> Result<String>;

    async fn query_all(&mut self, selector: &str) -> Result<Vec<ElementText>>;

    async fn element_handle(&mut self, selector: &str) -> Result<ElementHandle>;

    /// True once the node behind `handle` is detached or its document is gone.
    async fn is_stale(&mut self, handle: &ElementHandle) -> Result<bool>;

    async fn enter_frame(&mut self, index: usize) -> Result<()>;

    async fn leave_frame(&mut self) -> Result<()>;

    /// Tear the browser down. Best effort; never fails.
    async fn close(&mut self);
}

#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn Browser>>;
}

const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// [`Browser`] backed by a Chrome child process and its CDP page target.
pub struct CdpBrowser {
    process: Child,
    cdp: CdpClient,
    profile_dir: PathBuf,
    frame: Option<usize>,
    load_timeout: Duration,
}

impl CdpBrowser {
    pub(crate) fn new(
        process: Child,
        cdp: CdpClient,
        profile_dir: PathBuf,
        load_timeout: Duration,
    ) -> Self {
        Self {
            process,
            cdp,
            profile_dir,
            frame: None,
            load_timeout,
        }
    }

    fn document(&self) -> String {
        document_expr(self.frame)
    }

    async fn eval(&self, expression: &str) -> Result<Value> {
        self.cdp.evaluate(expression).await.map_err(automation_err)
    }

    async fn poll_until(&self, expression: &str, timeout: Duration, what: &str) -> Result<()> {
        let start = Instant::now();
        loop {
            if poll_outcome(self.cdp.evaluate(expression).await)? {
                debug!(
                    what,
                    waited_ms = start.elapsed().as_millis() as u64,
                    "Condition met"
                );
                return Ok(());
            }
            if start.elapsed() > timeout {
                return Err(Error::Timeout(format!(
                    "{} not reached after {}ms",
                    what,
                    timeout.as_millis()
                )));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

#[async_trait]
impl Browser for CdpBrowser {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        self.frame = None;
        self.cdp.navigate(url).await.map_err(automation_err)?;
        self.poll_until(
            "document.readyState === 'complete'",
            self.load_timeout,
            "document load",
        )
        .await
    }

    async fn click(&mut self, selector: &str) -> Result<()> {
        let js = format!(
            concat!(
                "(function() {{ var el = {}.querySelector('{}');",
                " if (!el) return false;",
                " el.scrollIntoView({{block: 'center'}});",
                " el.click(); return true; }})()"
            ),
            self.document(),
            escape_js(selector)
        );
        match self.eval(&js).await?.as_bool() {
            Some(true) => Ok(()),
            _ => Err(not_found(selector)),
        }
    }

    async fn type_text(&mut self, selector: &str, text: &str) -> Result<()> {
        let focus = format!(
            concat!(
                "(function() {{ var el = {}.querySelector('{}');",
                " if (!el) return false;",
                " el.focus(); return true; }})()"
            ),
            self.document(),
            escape_js(selector)
        );
        if self.eval(&focus).await?.as_bool() != Some(true) {
            return Err(not_found(selector));
        }

        self.cdp.insert_text(text).await.map_err(automation_err)?;

        // Frameworks listening for input events need a nudge.
        let notify = format!(
            "{}.querySelector('{}')?.dispatchEvent(new Event('input', {{bubbles: true}}))",
            self.document(),
            escape_js(selector)
        );
        self.eval(&notify).await?;
        Ok(())
    }

    async fn wait_for_present(&mut self, selector: &str, timeout: Duration) -> Result<()> {
        let js = format!("!!{}.querySelector('{}')", self.document(), escape_js(selector));
        self.poll_until(&js, timeout, selector).await
    }

    async fn wait_for_clickable(&mut self, selector: &str, timeout: Duration) -> Result<()> {
        let js = format!(
            concat!(
                "(function() {{ var el = {}.querySelector('{}');",
                " return !!el && !el.disabled && el.getClientRects().length > 0; }})()"
            ),
            self.document(),
            escape_js(selector)
        );
        self.poll_until(&js, timeout, selector).await
    }

    async fn text(&mut self, selector: &str) -> Result<String> {
        let js = format!(
            concat!(
                "(function() {{ var el = {}.querySelector('{}');",
                " return el ? (el.innerText || '').trim() : null; }})()"
            ),
            self.document(),
            escape_js(selector)
        );
        match self.eval(&js).await? {
            Value::String(s) => Ok(s),
            _ => Err(not_found(selector)),
        }
    }

    async fn query_all(&mut self, selector: &str) -> Result<Vec<ElementText>> {
        let js = format!(
            concat!(
                "Array.from({}.querySelectorAll('{}'))",
                ".map(function(el) {{ return [el.id || '', (el.innerText || '').trim()]; }})"
            ),
            self.document(),
            escape_js(selector)
        );
        Ok(element_texts(&self.eval(&js).await?))
    }

    async fn element_handle(&mut self, selector: &str) -> Result<ElementHandle> {
        let js = format!("{}.querySelector('{}')", self.document(), escape_js(selector));
        match self.cdp.evaluate_handle(&js).await.map_err(automation_err)? {
            Some(object_id) => Ok(ElementHandle(object_id)),
            None => Err(not_found(selector)),
        }
    }

    async fn is_stale(&mut self, handle: &ElementHandle) -> Result<bool> {
        match self
            .cdp
            .call_function_on(&handle.0, "function() { return !this.isConnected; }")
            .await
        {
            Ok(value) => Ok(value.as_bool().unwrap_or(true)),
            // The object died with its execution context: the page was reloaded.
            Err(CdpError::Protocol { .. }) => Ok(true),
            Err(e) => Err(automation_err(e)),
        }
    }

    async fn enter_frame(&mut self, index: usize) -> Result<()> {
        let js = format!(
            "(function() {{ try {{ return !!window.frames[{}].document; }} catch (e) {{ return false; }} }})()",
            index
        );
        if self.eval(&js).await?.as_bool() != Some(true) {
            return Err(Error::Automation(format!("no accessible frame at index {}", index)));
        }
        self.frame = Some(index);
        Ok(())
    }

    async fn leave_frame(&mut self) -> Result<()> {
        self.frame = None;
        Ok(())
    }

    async fn close(&mut self) {
        if let Err(e) = self.cdp.send_command("Browser.close", serde_json::json!({})).await {
            debug!("CDP Browser.close failed (may already be closed): {}", e);
        }
        let _ = self.process.kill().await;
        remove_profile(&self.profile_dir).await;
    }
}

impl Drop for CdpBrowser {
    fn drop(&mut self) {
        let _ = self.process.start_kill();
    }
}

/// Deletes a throwaway Chrome profile. Best effort.
pub(crate) async fn remove_profile(dir: &Path) {
    if let Err(e) = tokio::fs::remove_dir_all(dir).await {
        debug!(dir = %dir.display(), "Profile cleanup skipped: {}", e);
    }
}

fn document_expr(frame: Option<usize>) -> String {
    match frame {
        Some(index) => format!("window.frames[{}].document", index),
        None => "document".to_string(),
    }
}

fn escape_js(selector: &str) -> String {
    selector.replace('\\', "\\\\").replace('\'', "\\'")
}

fn element_texts(value: &Value) -> Vec<ElementText> {
    value
        .as_array()
        .map(|rows| {
            rows.iter()
                .filter_map(|row| {
                    let id = row.get(0)?.as_str()?;
                    let text = row.get(1)?.as_str()?;
                    Some(ElementText {
                        id: id.to_string(),
                        text: text.to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

/// One evaluation inside a wait. A postback tears down the execution context
/// under the running evaluation; that reads as "not yet", not as a failure.
fn poll_outcome(outcome: std::result::Result<Value, CdpError>) -> Result<bool> {
    match outcome {
        Ok(value) => Ok(value.as_bool() == Some(true)),
        Err(CdpError::Protocol { method, detail }) => {
            debug!(method = %method, %detail, "Context replaced while polling");
            Ok(false)
        }
        Err(e) => Err(automation_err(e)),
    }
}

fn not_found(selector: &str) -> Error {
    Error::Automation(format!("element not found: {}", selector))
}

fn automation_err(e: CdpError) -> Error {
    match e {
        CdpError::Timeout(method) => Error::Timeout(format!("CDP command '{}'", method)),
        other => Error::Automation(format!("CDP: {}", other)),
    }
}
