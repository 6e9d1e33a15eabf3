//! Chromium driver over the Chrome `DevTools` Protocol.
//!
//! chromiumoxide is async; [`CdpDriver`] owns a tokio runtime and blocks on
//! each call so it can sit behind the synchronous [`PageDriver`] contract.
//! Clicks and typing go through real input events on the located element.
//! Reads are single script evaluations so every observation is one snapshot.

use super::PageDriver;
use crate::config::BrowserSettings;
use crate::locators::Selector;
use crate::result::{HarnessError, HarnessResult};
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
use chromiumoxide::element::Element as CdpElement;
use chromiumoxide::page::Page as CdpPage;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

fn cdp_error(context: &str, e: impl std::fmt::Display) -> HarnessError {
    HarnessError::driver(format!("{context}: {e}"))
}

/// Blocking chromium session with one page
pub struct CdpDriver {
    runtime: Runtime,
    browser: Option<CdpBrowser>,
    page: CdpPage,
    handler: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for CdpDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CdpDriver")
            .field("open", &self.browser.is_some())
            .finish_non_exhaustive()
    }
}

impl CdpDriver {
    /// Launch chromium and open a blank page
    pub fn launch(settings: &BrowserSettings) -> HarnessResult<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()?;

        let mut builder = CdpConfig::builder().window_size(settings.viewport_width, settings.viewport_height);
        if !settings.headless {
            builder = builder.with_head();
        }
        if !settings.sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(path) = &settings.chromium_path {
            builder = builder.chrome_executable(path);
        }
        let config = builder.build().map_err(|e| cdp_error("browser config", e))?;

        let (browser, page, handler) = runtime.block_on(async {
            let (browser, mut handler) = CdpBrowser::launch(config)
                .await
                .map_err(|e| cdp_error("launch", e))?;
            let handle = tokio::spawn(async move {
                while let Some(event) = handler.next().await {
                    if event.is_err() {
                        break;
                    }
                }
            });
            let page = browser
                .new_page("about:blank")
                .await
                .map_err(|e| cdp_error("new page", e))?;
            Ok::<_, HarnessError>((browser, page, handle))
        })?;
        info!(headless = settings.headless, "chromium launched");

        Ok(Self {
            runtime,
            browser: Some(browser),
            page,
            handler: Some(handler),
        })
    }

    fn ensure_open(&self) -> HarnessResult<()> {
        if self.browser.is_none() {
            return Err(HarnessError::driver("session closed"));
        }
        Ok(())
    }

    fn eval<T: DeserializeOwned>(&self, script: String) -> HarnessResult<T> {
        self.ensure_open()?;
        self.runtime.block_on(async {
            self.page
                .evaluate(script)
                .await
                .map_err(|e| cdp_error("evaluate", e))?
                .into_value::<T>()
                .map_err(|e| cdp_error("evaluate result", e))
        })
    }

    async fn locate(page: &CdpPage, selector: &Selector) -> HarnessResult<CdpElement> {
        let found = match selector {
            Selector::XPath(expr) => page.find_xpath(expr.as_str()).await,
            Selector::Css(css) => page.find_element(css.as_str()).await,
        };
        found.map_err(|_| HarnessError::ElementNotFound {
            locator: selector.to_string(),
        })
    }
}

impl PageDriver for CdpDriver {
    fn navigate(&mut self, url: &str) -> HarnessResult<()> {
        self.ensure_open()?;
        debug!(url, "navigate");
        self.runtime.block_on(async {
            self.page
                .goto(url)
                .await
                .map_err(|e| cdp_error("navigate", e))?
                .wait_for_navigation()
                .await
                .map_err(|e| cdp_error("navigate", e))?;
            Ok(())
        })
    }

    fn count(&self, selector: &Selector) -> HarnessResult<usize> {
        self.eval(selector.to_count_query())
    }

    fn is_interactable(&self, selector: &Selector) -> HarnessResult<bool> {
        self.eval(format!(
            "(() => {{ const el = {}; if (!el) return false; \
             if (el.disabled) return false; \
             const style = window.getComputedStyle(el); \
             if (style.visibility === 'hidden' || style.pointerEvents === 'none') return false; \
             return el.getClientRects().length > 0; }})()",
            selector.to_query()
        ))
    }

    fn click(&mut self, selector: &Selector) -> HarnessResult<()> {
        self.ensure_open()?;
        self.runtime.block_on(async {
            let element = Self::locate(&self.page, selector).await?;
            element
                .click()
                .await
                .map_err(|e| HarnessError::ElementNotInteractable {
                    locator: selector.to_string(),
                    message: e.to_string(),
                })?;
            Ok(())
        })
    }

    fn send_keys(&mut self, selector: &Selector, text: &str) -> HarnessResult<()> {
        self.ensure_open()?;
        self.runtime.block_on(async {
            let element = Self::locate(&self.page, selector).await?;
            let not_interactable = |e: chromiumoxide::error::CdpError| HarnessError::ElementNotInteractable {
                locator: selector.to_string(),
                message: e.to_string(),
            };
            element.click().await.map_err(not_interactable)?;
            element.type_str(text).await.map_err(not_interactable)?;
            Ok(())
        })
    }

    fn select_by_visible_text(&mut self, selector: &Selector, label: &str) -> HarnessResult<()> {
        let label_js = serde_json::to_string(label)?;
        let outcome: String = self.eval(format!(
            "(() => {{ const el = {}; if (!el) return 'missing'; \
             const opt = Array.from(el.options || []).find(o => o.text.trim() === {label_js}); \
             if (!opt) return 'no-option'; \
             el.value = opt.value; \
             el.dispatchEvent(new Event('input', {{ bubbles: true }})); \
             el.dispatchEvent(new Event('change', {{ bubbles: true }})); \
             return 'ok'; }})()",
            selector.to_query()
        ))?;
        match outcome.as_str() {
            "ok" => Ok(()),
            "missing" => Err(HarnessError::ElementNotFound {
                locator: selector.to_string(),
            }),
            _ => Err(HarnessError::ElementNotFound {
                locator: format!("option {label:?} in {selector}"),
            }),
        }
    }

    fn is_checked(&self, selector: &Selector) -> HarnessResult<bool> {
        let checked: Option<bool> = self.eval(format!(
            "(() => {{ const el = {}; return el ? !!el.checked : null; }})()",
            selector.to_query()
        ))?;
        checked.ok_or_else(|| HarnessError::ElementNotFound {
            locator: selector.to_string(),
        })
    }

    fn cell_texts(&self, rows: &Selector, cells: &[Selector]) -> HarnessResult<Vec<Vec<String>>> {
        let cell_queries: Vec<String> = cells
            .iter()
            .map(|c| format!("(() => {{ const c = {}; return c ? c.textContent.trim() : ''; }})()", c.to_query_within("row")))
            .collect();
        self.eval(format!(
            "{}.map(row => [{}])",
            rows.to_all_query(),
            cell_queries.join(", ")
        ))
    }

    fn close(&mut self) -> HarnessResult<()> {
        let Some(mut browser) = self.browser.take() else {
            return Ok(());
        };
        let handler = self.handler.take();
        self.runtime.block_on(async {
            let closed = browser.close().await.map_err(|e| cdp_error("close", e));
            if let Err(e) = browser.wait().await {
                warn!(error = %e, "waiting for chromium to exit failed");
            }
            if let Some(handle) = handler {
                handle.abort();
            }
            closed.map(|_| ())
        })?;
        info!("chromium closed");
        Ok(())
    }
}

impl Drop for CdpDriver {
    fn drop(&mut self) {
        if self.browser.is_some() {
            if let Err(e) = self.close() {
                warn!(error = %e, "closing chromium on drop failed");
            }
        }
    }
}
