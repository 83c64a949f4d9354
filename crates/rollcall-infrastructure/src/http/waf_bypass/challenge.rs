//! Page-side challenge handling: widget detection, site-key extraction,
//! simulated interaction, and token polling.

use anyhow::{Context, Result};
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchMouseEventParams, DispatchMouseEventType, MouseButton,
};
use chromiumoxide::Page;
use log::{debug, info};
use std::collections::HashMap;
use std::time::Duration;

use crate::config::TimeoutConfig;

const CHALLENGE_FRAME_SELECTOR: &str = r#"iframe[src*="challenges.cloudflare.com"]"#;

/// The widget exposes a page-global `turnstile` object once its script ran.
const WIDGET_FLAG_JS: &str = "typeof turnstile !== 'undefined'";

const FRAME_PRESENT_JS: &str =
    r#"document.querySelector('iframe[src*="challenges.cloudflare.com"]') !== null"#;

const SITE_KEY_FROM_FRAME_JS: &str = r#"(() => {
    const iframe = document.querySelector('iframe[src*="challenges.cloudflare.com"]');
    if (iframe) {
        const match = iframe.src.match(/sitekey=([^&]+)/);
        return match ? match[1] : null;
    }
    return null;
})()"#;

const SITE_KEY_FROM_SCRIPTS_JS: &str = r#"(() => {
    const scripts = document.querySelectorAll('script');
    for (const script of scripts) {
        const match = script.textContent.match(/sitekey['":\s]+['"]([^'"]+)['"]/);
        if (match) return match[1];
    }
    return null;
})()"#;

const TOKEN_JS: &str = r#"(() => {
    try {
        const token = turnstile.getResponse();
        return token ? token : null;
    } catch (_) {
        return null;
    }
})()"#;

/// Whether a challenge widget is present on the page right now. Absence is
/// not an error: the WAF simply did not challenge this session.
pub(super) async fn detect_widget(page: &Page) -> bool {
    eval_bool(page, FRAME_PRESENT_JS).await || eval_bool(page, WIDGET_FLAG_JS).await
}

/// Pull the widget's public site key out of the page: first from the
/// challenge iframe's src query string, then by scanning inline scripts
/// for a `sitekey` literal.
pub(super) async fn extract_site_key(page: &Page) -> Option<String> {
    if let Some(key) = eval_string(page, SITE_KEY_FROM_FRAME_JS).await {
        return Some(key);
    }
    eval_string(page, SITE_KEY_FROM_SCRIPTS_JS).await
}

/// Nudge the widget into auto-verifying: synthetic pointer movement, a
/// click on the widget, and a scroll perturbation.
pub(super) async fn simulate_interaction(page: &Page, account_name: &str) {
    info!(
        "[{}] Simulating user interaction on the challenge widget...",
        account_name
    );

    move_mouse(page, 200.0, 200.0).await;
    tokio::time::sleep(Duration::from_millis(500)).await;
    move_mouse(page, 400.0, 300.0).await;
    tokio::time::sleep(Duration::from_millis(500)).await;

    click_widget(page, account_name).await;

    let _ = page.evaluate("window.scrollTo(0, 100)").await;
    tokio::time::sleep(Duration::from_millis(300)).await;
    let _ = page.evaluate("window.scrollTo(0, 0)").await;
    tokio::time::sleep(Duration::from_secs(1)).await;
}

/// Poll the page-global token accessor until it yields or the budget runs
/// out.
pub(super) async fn poll_for_token(
    page: &Page,
    account_name: &str,
    budget: Duration,
) -> Option<String> {
    let interval = TimeoutConfig::global().token_poll_interval;
    let checks = (budget.as_secs() / interval.as_secs().max(1)).max(1);

    info!(
        "[{}] Waiting for challenge token (up to {}s)...",
        account_name,
        budget.as_secs()
    );

    for check in 1..=checks {
        tokio::time::sleep(interval).await;

        if let Some(token) = eval_string(page, TOKEN_JS).await {
            if !token.is_empty() {
                info!(
                    "[{}] Challenge token obtained after {}s",
                    account_name,
                    check * interval.as_secs()
                );
                return Some(token);
            }
        }

        if check % 5 == 0 {
            debug!(
                "[{}] Still waiting for token... ({}s)",
                account_name,
                check * interval.as_secs()
            );
        }
    }

    None
}

/// All cookies from the browser context. Providers rotate which names
/// matter, so completeness beats precision.
pub(super) async fn collect_cookies(page: &Page) -> Result<HashMap<String, String>> {
    let cookies = page
        .get_cookies()
        .await
        .context("Failed to read cookies from browser context")?;

    Ok(cookies.into_iter().map(|c| (c.name, c.value)).collect())
}

/// The checkbox lives in a cross-origin frame and is usually unreachable
/// from the top document; clicking the frame element itself is the
/// fallback.
async fn click_widget(page: &Page, account_name: &str) {
    let selectors = ["input[type=\"checkbox\"]", CHALLENGE_FRAME_SELECTOR];

    for selector in selectors {
        let Ok(element) = page.find_element(selector).await else {
            continue;
        };
        match element.click().await {
            Ok(_) => {
                debug!(
                    "[{}] Clicked challenge element ({})",
                    account_name, selector
                );
                tokio::time::sleep(Duration::from_secs(2)).await;
                return;
            }
            Err(e) => {
                debug!("[{}] Click on {} failed: {}", account_name, selector, e);
            }
        }
    }

    debug!("[{}] No clickable challenge element found", account_name);
}

async fn move_mouse(page: &Page, x: f64, y: f64) {
    let params = DispatchMouseEventParams::builder()
        .r#type(DispatchMouseEventType::MouseMoved)
        .x(x)
        .y(y)
        .button(MouseButton::None)
        .build();

    if let Ok(params) = params {
        let _ = page.execute(params).await;
    }
}

async fn eval_bool(page: &Page, js: &str) -> bool {
    match page.evaluate(js).await {
        Ok(result) => result.into_value::<bool>().unwrap_or(false),
        Err(_) => false,
    }
}

async fn eval_string(page: &Page, js: &str) -> Option<String> {
    match page.evaluate(js).await {
        Ok(result) => result.into_value::<Option<String>>().unwrap_or(None),
        Err(_) => None,
    }
}
