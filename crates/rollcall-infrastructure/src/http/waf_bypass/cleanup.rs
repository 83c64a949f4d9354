use chromiumoxide::browser::Browser;
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::config::TimeoutConfig;

/// Tear down a browser session on every exit path: close with timeout,
/// stop the event handler, remove the temp profile.
pub(super) async fn cleanup_browser(
    mut browser: Browser,
    handler_task: JoinHandle<()>,
    temp_dir: PathBuf,
    account_name: &str,
) {
    handler_task.abort();

    match tokio::time::timeout(TimeoutConfig::global().browser_close, browser.close()).await {
        Ok(Ok(_)) => {
            info!("[{}] Browser closed successfully", account_name);
        }
        Ok(Err(e)) => {
            warn!(
                "[{}] Failed to close browser: {}, will force cleanup",
                account_name, e
            );
        }
        Err(_) => {
            warn!(
                "[{}] Browser close timed out, continuing with cleanup",
                account_name
            );
        }
    }

    // Give Chrome a moment to fully exit
    tokio::time::sleep(Duration::from_secs(1)).await;

    if let Err(e) = std::fs::remove_dir_all(&temp_dir) {
        warn!(
            "[{}] Failed to clean up temp directory on first attempt: {}. Retrying after force kill...",
            account_name, e
        );

        // Chrome may still hold files in the profile
        force_kill_chrome_processes(&temp_dir, account_name).await;
        tokio::time::sleep(Duration::from_secs(2)).await;

        if let Err(e) = std::fs::remove_dir_all(&temp_dir) {
            warn!(
                "[{}] Failed to clean up temp directory even after force kill: {}",
                account_name, e
            );
        } else {
            info!(
                "[{}] Cleaned up temp profile directory after force kill",
                account_name
            );
        }
    } else {
        info!("[{}] Cleaned up temp profile directory", account_name);
    }
}

/// Force kill Chrome processes that might be using the temp directory
async fn force_kill_chrome_processes(temp_dir: &Path, account_name: &str) {
    #[cfg(unix)]
    {
        use std::process::Command;

        let temp_dir_str = temp_dir.to_string_lossy();

        // Find processes with open files under the profile directory
        let output = Command::new("sh")
            .arg("-c")
            .arg(format!(
                "lsof +D '{}' 2>/dev/null | grep -i chrom | awk '{{print $2}}' | sort -u",
                temp_dir_str
            ))
            .output();

        if let Ok(output) = output {
            let pids = String::from_utf8_lossy(&output.stdout);
            for pid in pids.lines() {
                if pid.trim().parse::<i32>().is_ok() {
                    warn!(
                        "[{}] Force killing browser process with PID: {}",
                        account_name,
                        pid.trim()
                    );
                    let _ = Command::new("kill").arg("-9").arg(pid.trim()).output();
                }
            }
        }
    }

    #[cfg(windows)]
    {
        use std::process::Command;

        let _ = temp_dir;
        let _ = Command::new("taskkill")
            .args(["/F", "/IM", "chrome.exe"])
            .output();

        warn!(
            "[{}] Attempted to kill Chrome processes (Windows)",
            account_name
        );
    }
}
