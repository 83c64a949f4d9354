mod timeouts;

pub use timeouts::TimeoutConfig;

use anyhow::{Context, Result};
use log::{info, warn};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use rollcall_domain::account::Account;
use rollcall_domain::check_in::Provider;

/// Process configuration: accounts, provider definitions, and run switches.
/// Loaded once at startup from an optional JSON file with environment
/// overlays, so the same binary works from a config file locally and from
/// repository secrets in CI.
#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub providers: HashMap<String, Provider>,
    #[serde(default)]
    pub skip_notify: bool,
    #[serde(default)]
    pub debug_screenshots: bool,
    #[serde(default)]
    pub always_exit_zero: bool,
    #[serde(default)]
    pub feishu_webhook_key: Option<String>,
    #[serde(default)]
    pub yescaptcha_key: Option<String>,
    #[serde(default = "default_solver_url")]
    pub solver_url: String,
    #[serde(default = "default_headless")]
    pub headless: bool,
}

fn default_solver_url() -> String {
    "http://127.0.0.1:5072".to_string()
}

fn default_headless() -> bool {
    true
}

impl AppConfig {
    /// Load configuration from `path` (when it exists) and overlay
    /// environment variables on top.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {:?}", path))?;
            let config: AppConfig = serde_json::from_str(&raw)
                .with_context(|| format!("Failed to parse config file {:?}", path))?;
            info!("Loaded configuration from {:?}", path);
            config
        } else {
            AppConfig {
                solver_url: default_solver_url(),
                headless: default_headless(),
                ..AppConfig::default()
            }
        };

        config.apply_env();
        Ok(config)
    }

    pub fn provider(&self, name: &str) -> Option<&Provider> {
        self.providers.get(name)
    }

    fn apply_env(&mut self) {
        if let Some(accounts) = env_json::<Vec<Account>>("ROLLCALL_ACCOUNTS") {
            self.accounts = accounts;
        }
        if let Some(providers) = env_json::<HashMap<String, Provider>>("ROLLCALL_PROVIDERS") {
            self.providers = providers;
        }
        if let Some(flag) = env_flag("SKIP_NOTIFY") {
            self.skip_notify = flag;
        }
        if let Some(flag) = env_flag("DEBUG_SCREENSHOTS") {
            self.debug_screenshots = flag;
        }
        if let Some(flag) = env_flag("ALWAYS_EXIT_ZERO") {
            self.always_exit_zero = flag;
        }
        if let Some(key) = env_string("YESCAPTCHA_KEY") {
            self.yescaptcha_key = Some(key);
        }
        if let Some(url) = env_string("TURNSTILE_SOLVER_URL") {
            self.solver_url = url;
        }
        if let Some(key) = env_string("FEISHU_WEBHOOK_KEY") {
            self.feishu_webhook_key = Some(key);
        }
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_json<T: serde::de::DeserializeOwned>(name: &str) -> Option<T> {
    let raw = env_string(name)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Ignoring {} (invalid JSON): {}", name, e);
            None
        }
    }
}

fn env_flag(name: &str) -> Option<bool> {
    env_string(name).map(|v| parse_flag(&v))
}

/// Truthy values accepted by the environment switches.
fn parse_flag(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes")
}
