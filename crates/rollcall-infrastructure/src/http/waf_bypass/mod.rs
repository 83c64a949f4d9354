mod browser_setup;
mod challenge;
mod cleanup;

use anyhow::{Context, Result};
use chromiumoxide::browser::Browser;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use log::{info, warn};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::TimeoutConfig;
use crate::http::client::{extract_domain, USER_AGENT};
use crate::http::solver::TurnstileSolver;

use browser_setup::find_browser;
use cleanup::cleanup_browser;

/// Session proof acquired by the bypass: every cookie the browser context
/// holds, plus the challenge token when one was produced.
#[derive(Debug, Clone)]
pub struct BypassData {
    pub cookies: HashMap<String, String>,
    pub token: Option<String>,
}

impl BypassData {
    pub fn has_token(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

/// Drives a disposable browser session against a portal page to satisfy
/// its WAF: detect the challenge widget, obtain a token via the active
/// solver strategy or simulated interaction, and harvest cookies.
pub struct WafBypassService {
    headless: bool,
    solver: Arc<TurnstileSolver>,
    screenshot_dir: Option<PathBuf>,
}

impl WafBypassService {
    pub fn new(headless: bool, solver: Arc<TurnstileSolver>) -> Self {
        Self {
            headless,
            solver,
            screenshot_dir: None,
        }
    }

    /// Save per-stage debug screenshots under `dir`.
    pub fn with_screenshot_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.screenshot_dir = dir;
        self
    }

    /// Acquire `{cookies, token}` for one account.
    ///
    /// An absent widget or an unproduced token is not an error; the
    /// check-in proceeds with whatever state exists. A launch failure or
    /// an empty cookie jar is: callers must be able to distinguish
    /// "bypass not needed" from "bypass required but failed".
    pub async fn acquire(
        &self,
        login_url: &str,
        account_name: &str,
        expected_cookies: &[String],
    ) -> Result<BypassData> {
        info!(
            "[{}] Starting browser for WAF bypass (chromiumoxide)...",
            account_name
        );

        let (browser, handler_task, temp_dir) =
            self.launch_browser_with_config(account_name).await?;

        let result = self
            .run_challenge_flow(&browser, login_url, account_name)
            .await;

        // Tear down on every exit path before inspecting the result
        cleanup_browser(browser, handler_task, temp_dir, account_name).await;

        let data = result?;

        if data.cookies.is_empty() {
            anyhow::bail!(
                "No cookies obtained from browser context. The page likely never loaded or the WAF blocked the session."
            );
        }

        if !expected_cookies.is_empty() {
            let captured = expected_cookies
                .iter()
                .filter(|name| data.cookies.contains_key(name.as_str()))
                .count();
            info!(
                "[{}] Captured {}/{} expected WAF cookies",
                account_name,
                captured,
                expected_cookies.len()
            );
        }

        info!(
            "[{}] WAF data acquired (cookies: {}, token: {})",
            account_name,
            data.cookies.len(),
            if data.has_token() { "yes" } else { "no" }
        );

        Ok(data)
    }

    async fn run_challenge_flow(
        &self,
        browser: &Browser,
        login_url: &str,
        account_name: &str,
    ) -> Result<BypassData> {
        let timeouts = TimeoutConfig::global();

        let page = browser
            .new_page("about:blank")
            .await
            .context("Failed to create browser page")?;
        page.set_user_agent(USER_AGENT)
            .await
            .context("Failed to set user agent")?;

        info!("[{}] Navigating to {}", account_name, login_url);

        // A WAF interstitial can hold navigation far past any sane load
        // time; whatever state was reached is still worth harvesting
        match tokio::time::timeout(timeouts.page_load, page.goto(login_url)).await {
            Ok(Ok(_)) => info!("[{}] Page loaded", account_name),
            Ok(Err(e)) => warn!(
                "[{}] Navigation failed: {}, continuing with reached state",
                account_name, e
            ),
            Err(_) => warn!(
                "[{}] Navigation timed out, continuing with reached state",
                account_name
            ),
        }

        tokio::time::sleep(timeouts.page_settle).await;
        self.save_debug_screenshot(&page, account_name, "01_loaded")
            .await;

        let mut token = None;

        if challenge::detect_widget(&page).await {
            info!("[{}] Challenge widget detected", account_name);
            token = self.obtain_token(&page, login_url, account_name).await;
            if token.is_none() {
                warn!(
                    "[{}] No challenge token within budget, proceeding with cookies only",
                    account_name
                );
                self.save_debug_screenshot(&page, account_name, "02_no_token")
                    .await;
            }
        } else {
            info!(
                "[{}] No challenge widget detected, collecting cookies only",
                account_name
            );
        }

        let cookies = challenge::collect_cookies(&page).await?;
        Ok(BypassData { cookies, token })
    }

    /// Remote solve first when a solver backend is active, simulated
    /// interaction otherwise or as the degradation path.
    async fn obtain_token(
        &self,
        page: &Page,
        login_url: &str,
        account_name: &str,
    ) -> Option<String> {
        if self.solver.is_remote() {
            match challenge::extract_site_key(page).await {
                Some(site_key) => {
                    info!(
                        "[{}] Extracted site key: {}...",
                        account_name,
                        &site_key[..site_key.len().min(20)]
                    );
                    let site_url = extract_domain(login_url)
                        .unwrap_or_else(|_| login_url.to_string());
                    if let Some(token) = self
                        .solver
                        .solve(&site_url, &site_key, account_name)
                        .await
                    {
                        return Some(token);
                    }
                    warn!(
                        "[{}] Remote solve failed, degrading to simulated interaction",
                        account_name
                    );
                }
                None => {
                    warn!(
                        "[{}] No site key found, degrading to simulated interaction",
                        account_name
                    );
                }
            }
        }

        challenge::simulate_interaction(page, account_name).await;
        challenge::poll_for_token(page, account_name, TimeoutConfig::global().token_wait).await
    }

    async fn save_debug_screenshot(&self, page: &Page, account_name: &str, stage: &str) {
        let Some(dir) = &self.screenshot_dir else {
            return;
        };

        if let Err(e) = std::fs::create_dir_all(dir) {
            warn!(
                "[{}] Failed to create screenshot directory: {}",
                account_name, e
            );
            return;
        }

        let path = dir.join(format!("{}_{}.png", account_name, stage));
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(true)
            .build();

        match page.save_screenshot(params, &path).await {
            Ok(_) => info!("[{}] Debug screenshot saved: {:?}", account_name, path),
            Err(e) => warn!("[{}] Failed to save screenshot: {}", account_name, e),
        }
    }
}

/// Check which browser is available on the system
pub fn check_available_browser() -> Option<String> {
    find_browser().map(|path| path.to_string_lossy().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bypass_data_token_presence() {
        let data = BypassData {
            cookies: HashMap::new(),
            token: Some("0.tok".to_string()),
        };
        assert!(data.has_token());

        let empty = BypassData {
            cookies: HashMap::new(),
            token: Some(String::new()),
        };
        assert!(!empty.has_token());

        let none = BypassData {
            cookies: HashMap::new(),
            token: None,
        };
        assert!(!none.has_token());
    }

    #[test]
    fn test_browser_detection() {
        let browser = check_available_browser();
        println!("Found browser: {:?}", browser);
        // Passes even when no browser is installed
    }
}
