use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde_json::Value;

use crate::config::TimeoutConfig;

use super::yescaptcha::solution_token;
use super::MAX_POLL_ATTEMPTS;

/// Sentinel the solver returns when the challenge could not be passed;
/// equivalent to "no token, stop polling".
const CAPTCHA_FAIL: &str = "CAPTCHA_FAIL";

/// Client for a self-hosted Turnstile solver: same create-task/poll-result
/// shape as the paid service, over plain GET endpoints.
pub struct LocalSolverClient {
    base_url: String,
    client: reqwest::Client,
}

/// Outcome of inspecting one result poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum SolutionState {
    Pending,
    Failed,
    Token(String),
}

impl LocalSolverClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(TimeoutConfig::global().http_request)
            .build()
            .unwrap_or_default();

        Self {
            base_url: base_url.into(),
            client,
        }
    }

    /// Short-timeout health probe; an unreachable solver counts as absent.
    pub async fn is_healthy(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        let request = self
            .client
            .get(url)
            .timeout(TimeoutConfig::global().solver_health);

        match request.send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
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
                warn!("[{}] Local solver request failed: {:#}", account_name, e);
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
        info!("[{}] Local solver: creating task...", account_name);

        let data: Value = self
            .client
            .get(format!("{}/turnstile", self.base_url))
            .query(&[("url", site_url), ("sitekey", site_key)])
            .send()
            .await
            .context("Failed to send solver task request")?
            .error_for_status()
            .context("Solver task request returned an error status")?
            .json()
            .await
            .context("Failed to parse solver task response")?;

        let task_id = data["taskId"].clone();
        if task_id.is_null() {
            warn!("[{}] Local solver response carried no taskId", account_name);
            return Ok(None);
        }
        info!("[{}] Local solver task created ({})", account_name, task_id);

        let timeouts = TimeoutConfig::global();
        tokio::time::sleep(timeouts.solver_initial_wait).await;

        let id_query = task_id.as_str().map(|s| s.to_string()).unwrap_or_else(|| task_id.to_string());

        for attempt in 0..MAX_POLL_ATTEMPTS {
            let result: Value = self
                .client
                .get(format!("{}/result", self.base_url))
                .query(&[("id", id_query.as_str())])
                .send()
                .await
                .context("Failed to send solver result request")?
                .error_for_status()
                .context("Solver result request returned an error status")?
                .json()
                .await
                .context("Failed to parse solver result response")?;

            match interpret_solution(&result) {
                SolutionState::Token(token) => {
                    info!("[{}] Local solver token obtained", account_name);
                    return Ok(Some(token));
                }
                SolutionState::Failed => {
                    warn!("[{}] Local solver could not pass the challenge", account_name);
                    return Ok(None);
                }
                SolutionState::Pending => {
                    if attempt % 5 == 0 {
                        debug!("[{}] Local solver pending... ({}s)", account_name, attempt * 2);
                    }
                }
            }

            tokio::time::sleep(timeouts.solver_poll_interval).await;
        }

        warn!("[{}] Local solver timed out without a token", account_name);
        Ok(None)
    }
}

pub(super) fn interpret_solution(data: &Value) -> SolutionState {
    match solution_token(data) {
        Some(token) if token == CAPTCHA_FAIL => SolutionState::Failed,
        Some(token) => SolutionState::Token(token),
        None => SolutionState::Pending,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_interpret_pending_without_solution() {
        assert_eq!(
            interpret_solution(&json!({ "status": "processing" })),
            SolutionState::Pending
        );
    }

    #[test]
    fn test_interpret_sentinel_as_failure() {
        assert_eq!(
            interpret_solution(&json!({ "solution": { "token": "CAPTCHA_FAIL" } })),
            SolutionState::Failed
        );
    }

    #[test]
    fn test_interpret_real_token() {
        assert_eq!(
            interpret_solution(&json!({ "solution": { "token": "0.tok" } })),
            SolutionState::Token("0.tok".to_string())
        );
    }

    #[tokio::test]
    async fn test_unreachable_solver_is_unhealthy() {
        let client = LocalSolverClient::new("http://127.0.0.1:9");
        assert!(!client.is_healthy().await);
    }
}
