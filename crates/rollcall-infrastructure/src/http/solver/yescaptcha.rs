use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde_json::{json, Value};

use crate::config::TimeoutConfig;

use super::MAX_POLL_ATTEMPTS;

const YESCAPTCHA_API: &str = "https://api.yescaptcha.com";

/// Client for the YesCaptcha paid solving service: create a
/// `TurnstileTaskProxyless` task, then poll its result.
pub struct YesCaptchaClient {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl YesCaptchaClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, YESCAPTCHA_API)
    }

    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(TimeoutConfig::global().http_request)
            .build()
            .unwrap_or_default();

        Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
            client,
        }
    }

    pub async fn solve(
        &self,
        site_url: &str,
        site_key: &str,
        account_name: &str,
    ) -> Option<String> {
        match self.solve_inner(site_url, site_key, account_name).await {
            Ok(token) => token,
            Err(e) => {
                warn!("[{}] YesCaptcha request failed: {:#}", account_name, e);
                None
            }
        }
    }

    async fn solve_inner(
        &self,
        site_url: &str,
        site_key: &str,
        account_name: &str,
    ) -> Result<Option<String>> {
        info!("[{}] YesCaptcha: creating task...", account_name);

        let payload = json!({
            "clientKey": self.api_key,
            "task": {
                "type": "TurnstileTaskProxyless",
                "websiteURL": site_url,
                "websiteKey": site_key,
            }
        });

        let data: Value = self
            .client
            .post(format!("{}/createTask", self.base_url))
            .json(&payload)
            .send()
            .await
            .context("Failed to send createTask request")?
            .error_for_status()
            .context("createTask returned an error status")?
            .json()
            .await
            .context("Failed to parse createTask response")?;

        if let Some(description) = error_description(&data) {
            warn!(
                "[{}] YesCaptcha task creation failed: {}",
                account_name, description
            );
            return Ok(None);
        }

        let task_id = data["taskId"].clone();
        if task_id.is_null() {
            warn!("[{}] YesCaptcha response carried no taskId", account_name);
            return Ok(None);
        }
        info!("[{}] YesCaptcha task created ({})", account_name, task_id);

        let timeouts = TimeoutConfig::global();
        tokio::time::sleep(timeouts.solver_initial_wait).await;

        for attempt in 0..MAX_POLL_ATTEMPTS {
            let result: Value = self
                .client
                .post(format!("{}/getTaskResult", self.base_url))
                .json(&json!({ "clientKey": self.api_key, "taskId": task_id }))
                .send()
                .await
                .context("Failed to send getTaskResult request")?
                .error_for_status()
                .context("getTaskResult returned an error status")?
                .json()
                .await
                .context("Failed to parse getTaskResult response")?;

            if let Some(description) = error_description(&result) {
                warn!(
                    "[{}] YesCaptcha result fetch failed: {}",
                    account_name, description
                );
                return Ok(None);
            }

            match result["status"].as_str() {
                Some("ready") => {
                    return match solution_token(&result) {
                        Some(token) => {
                            info!("[{}] YesCaptcha token obtained", account_name);
                            Ok(Some(token))
                        }
                        None => {
                            warn!("[{}] YesCaptcha result carried no token", account_name);
                            Ok(None)
                        }
                    };
                }
                Some("processing") => {
                    if attempt % 5 == 0 {
                        debug!("[{}] YesCaptcha processing... ({}s)", account_name, attempt * 2);
                    }
                }
                other => {
                    debug!("[{}] YesCaptcha status: {:?}", account_name, other);
                }
            }

            tokio::time::sleep(timeouts.solver_poll_interval).await;
        }

        warn!(
            "[{}] YesCaptcha timed out without a token",
            account_name
        );
        Ok(None)
    }
}

/// Error description when the service reports a non-zero errorId.
pub(super) fn error_description(data: &Value) -> Option<String> {
    if data["errorId"].as_i64().unwrap_or(0) != 0 {
        Some(
            data["errorDescription"]
                .as_str()
                .unwrap_or("unknown error")
                .to_string(),
        )
    } else {
        None
    }
}

/// Non-empty token from a result payload's `solution.token` field.
pub(super) fn solution_token(data: &Value) -> Option<String> {
    data["solution"]["token"]
        .as_str()
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_description_detects_error_id() {
        let ok = json!({ "errorId": 0, "taskId": 42 });
        assert_eq!(error_description(&ok), None);

        let err = json!({ "errorId": 1, "errorDescription": "invalid key" });
        assert_eq!(error_description(&err).as_deref(), Some("invalid key"));

        let err_no_desc = json!({ "errorId": 2 });
        assert_eq!(error_description(&err_no_desc).as_deref(), Some("unknown error"));
    }

    #[test]
    fn test_solution_token_extraction() {
        let ready = json!({ "status": "ready", "solution": { "token": "0.tok" } });
        assert_eq!(solution_token(&ready).as_deref(), Some("0.tok"));

        let empty = json!({ "status": "ready", "solution": { "token": "" } });
        assert_eq!(solution_token(&empty), None);

        let missing = json!({ "status": "ready" });
        assert_eq!(solution_token(&missing), None);
    }
}
