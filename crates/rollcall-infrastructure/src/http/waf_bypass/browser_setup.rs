use anyhow::Result;
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use log::info;
use std::path::PathBuf;
use tokio::task::JoinHandle;

use crate::config::TimeoutConfig;

/// Find available Chromium-based browser on the system
pub(super) fn find_browser() -> Option<PathBuf> {
    let browser_paths = vec![
        // macOS
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
        "/Applications/Brave Browser.app/Contents/MacOS/Brave Browser",
        "/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge",
        // Linux
        "/usr/bin/google-chrome",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/usr/bin/brave-browser",
        "/usr/bin/microsoft-edge",
        "/snap/bin/chromium",
        // Common alternative paths
        "/opt/google/chrome/chrome",
        "/opt/chromium/chromium",
    ];

    for path in browser_paths {
        let browser_path = PathBuf::from(path);
        if browser_path.exists() {
            return Some(browser_path);
        }
    }

    #[cfg(target_os = "windows")]
    {
        let windows_paths: Vec<String> = vec![
            r"C:\Program Files\Google\Chrome\Application\chrome.exe".to_string(),
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe".to_string(),
            format!(
                r"{}\Google\Chrome\Application\chrome.exe",
                std::env::var("LOCALAPPDATA").unwrap_or_default()
            ),
            r"C:\Program Files\Chromium\Application\chrome.exe".to_string(),
            r"C:\Program Files (x86)\BraveSoftware\Brave-Browser\Application\brave.exe".to_string(),
            r"C:\Program Files (x86)\Microsoft\Edge\Application\msedge.exe".to_string(),
            r"C:\Program Files\Microsoft\Edge\Application\msedge.exe".to_string(),
        ];

        for path_str in windows_paths {
            let browser_path = PathBuf::from(&path_str);
            if browser_path.exists() {
                return Some(browser_path);
            }
        }
    }

    None
}

impl super::WafBypassService {
    /// Launch an isolated browser with a fresh profile.
    /// Returns (browser, handler_task, temp_dir)
    pub(super) async fn launch_browser_with_config(
        &self,
        account_name: &str,
    ) -> Result<(Browser, JoinHandle<()>, PathBuf)> {
        // Unique temporary profile per session so accounts never share
        // state and concurrent runs cannot hit profile lock conflicts
        let temp_dir = std::env::temp_dir().join(format!("rollcall-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&temp_dir)
            .map_err(|e| anyhow::anyhow!("Failed to create temp directory: {}", e))?;

        let browser_path = find_browser().ok_or_else(|| {
            let err_msg = "No Chromium-based browser found. Please install one of: Google Chrome, Chromium, Brave, or Microsoft Edge";
            log::error!("[{}] {}", account_name, err_msg);
            anyhow::anyhow!(err_msg)
        })?;

        info!("[{}] Using browser at: {:?}", account_name, browser_path);

        let mut builder = BrowserConfig::builder()
            .window_size(1920, 1080)
            .no_sandbox()
            .user_data_dir(&temp_dir)
            .chrome_executable(&browser_path)
            .arg("--disable-blink-features=AutomationControlled");

        if !self.headless {
            builder = builder.with_head();
        }

        let config = builder.build().map_err(|e| {
            let err_msg = format!("Failed to build browser config: {}", e);
            log::error!("[{}] {}", account_name, err_msg);
            anyhow::anyhow!(err_msg)
        })?;

        let launch_result = tokio::time::timeout(
            TimeoutConfig::global().browser_launch,
            Browser::launch(config),
        )
        .await;

        let (browser, mut handler) = match launch_result {
            Ok(Ok(browser_handler)) => browser_handler,
            Ok(Err(e)) => {
                let _ = std::fs::remove_dir_all(&temp_dir);
                let err_msg = format!(
                    "Failed to launch browser: {}. Make sure Chrome is installed and has proper permissions.",
                    e
                );
                log::error!("[{}] {}", account_name, err_msg);
                return Err(anyhow::anyhow!(err_msg));
            }
            Err(_) => {
                let _ = std::fs::remove_dir_all(&temp_dir);
                let err_msg = "Browser launch timed out".to_string();
                log::error!("[{}] {}", account_name, err_msg);
                return Err(anyhow::anyhow!(err_msg));
            }
        };

        info!("[{}] Browser launched successfully", account_name);

        // Drain CDP events for the browser's lifetime
        let handler_task = tokio::spawn(async move {
            while let Some(_event) = handler.next().await {}
        });

        Ok((browser, handler_task, temp_dir))
    }
}
