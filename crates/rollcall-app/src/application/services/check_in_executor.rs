use anyhow::Result;
use log::{error, info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::instrument;

use rollcall_domain::account::{assemble_cookies, Account};
use rollcall_domain::check_in::{Provider, UserInfo};
use rollcall_infrastructure::http::{HttpClient, TurnstileSolver, WafBypassService};

/// Outcome of one account's full pipeline. Consumed by the run
/// coordinator's report and never shared across accounts.
#[derive(Debug, Clone)]
pub struct AccountOutcome {
    pub account_name: String,
    pub success: bool,
    pub message: String,
    pub user_info: Option<UserInfo>,
}

impl AccountOutcome {
    pub fn failure(account_name: &str, message: impl Into<String>) -> Self {
        Self {
            account_name: account_name.to_string(),
            success: false,
            message: message.into(),
            user_info: None,
        }
    }

    /// One report entry: status tag, display name, and either the balance
    /// display or the failure reason.
    pub fn report_line(&self) -> String {
        if self.success {
            match &self.user_info {
                Some(info) => format!("[SUCCESS] {}\n{}", self.account_name, info.display()),
                None => format!("[SUCCESS] {}", self.account_name),
            }
        } else {
            format!("[FAIL] {}\n{}", self.account_name, self.message)
        }
    }
}

/// Check-in executor service: runs the credential → bypass → balance →
/// check-in pipeline for a single account.
pub struct CheckInExecutor {
    http_client: HttpClient,
    waf_service: WafBypassService,
}

impl CheckInExecutor {
    pub fn new(
        solver: Arc<TurnstileSolver>,
        headless: bool,
        screenshot_dir: Option<PathBuf>,
    ) -> Result<Self> {
        Ok(Self {
            http_client: HttpClient::new()?,
            waf_service: WafBypassService::new(headless, solver)
                .with_screenshot_dir(screenshot_dir),
        })
    }

    #[instrument(skip_all, fields(account_index = index))]
    pub async fn check_in_account(
        &self,
        account: &Account,
        index: usize,
        provider: &Provider,
    ) -> AccountOutcome {
        let account_name = account.display_name(index);
        info!(
            "[{}] Starting check-in against {}",
            account_name,
            provider.domain()
        );

        // 1. Acquire WAF state when the provider requires bypass. A failure
        //    here is fatal to this account only: there is no cookie/token
        //    substitute to fall back on.
        let bypass = if provider.needs_waf_bypass() {
            match self
                .waf_service
                .acquire(
                    &provider.login_url(),
                    &account_name,
                    provider.waf_cookie_names(),
                )
                .await
            {
                Ok(data) => Some(data),
                Err(e) => {
                    error!("[{}] WAF bypass failed: {:#}", account_name, e);
                    return AccountOutcome::failure(
                        &account_name,
                        format!("WAF bypass failed: {}", e),
                    );
                }
            }
        } else {
            None
        };

        // 2. Canonical cookie set; freshly acquired WAF cookies override
        //    same-named user cookies
        let cookies = assemble_cookies(account.cookies(), bypass.as_ref().map(|b| &b.cookies));
        let api_user = account.api_user().to_string();
        let referer = provider.login_url();

        // 3. Balance read gates the rest of the pipeline
        let user_info = match self
            .http_client
            .get_user_info(
                &provider.user_info_url(),
                &referer,
                &cookies,
                provider.api_user_key(),
                &api_user,
            )
            .await
        {
            Ok(info) => {
                info!("[{}] {}", account_name, info.display());
                info
            }
            Err(e) => {
                warn!("[{}] Balance query failed: {:#}", account_name, e);
                return AccountOutcome::failure(&account_name, e.to_string());
            }
        };

        // 4. Explicit check-in only when the provider defines one; some
        //    portals auto-credit on the balance read
        let Some(sign_in_url) = provider.sign_in_url() else {
            info!(
                "[{}] Provider has no check-in endpoint, balance read counts as checked in",
                account_name
            );
            return AccountOutcome {
                account_name,
                success: true,
                message: "Check-in implicit (no endpoint)".to_string(),
                user_info: Some(user_info),
            };
        };

        let token = bypass.as_ref().and_then(|b| b.token.as_deref());
        if token.is_some() {
            info!("[{}] Submitting challenge token with check-in", account_name);
        }

        match self
            .http_client
            .execute_check_in(
                &sign_in_url,
                &referer,
                &cookies,
                provider.api_user_key(),
                &api_user,
                token,
                provider.checked_in_phrases(),
            )
            .await
        {
            Ok(result) => {
                if result.success {
                    info!("[{}] Check-in successful: {}", account_name, result.message);
                } else {
                    warn!("[{}] Check-in rejected: {}", account_name, result.message);
                }
                AccountOutcome {
                    account_name,
                    success: result.success,
                    message: result.message,
                    user_info: Some(user_info),
                }
            }
            Err(e) => {
                error!("[{}] Check-in request error: {:#}", account_name, e);
                AccountOutcome {
                    account_name,
                    success: false,
                    message: format!("Request failed: {}", e),
                    user_info: Some(user_info),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_outcome_shape() {
        let outcome = AccountOutcome::failure("Account 1", "HTTP 401");
        assert!(!outcome.success);
        assert_eq!(outcome.message, "HTTP 401");
        assert!(outcome.user_info.is_none());
    }

    #[test]
    fn test_report_line_success_shows_balance() {
        let outcome = AccountOutcome {
            account_name: "main".to_string(),
            success: true,
            message: "Check-in successful".to_string(),
            user_info: Some(UserInfo::from_raw(1_000_000.0, 0.0)),
        };
        assert_eq!(outcome.report_line(), "[SUCCESS] main\n💰 余额: $2.0");
    }

    #[test]
    fn test_report_line_failure_shows_reason() {
        let outcome = AccountOutcome::failure("main", "HTTP 401");
        assert_eq!(outcome.report_line(), "[FAIL] main\nHTTP 401");
    }

    #[test]
    fn test_report_line_failed_check_in_keeps_reason_over_balance() {
        let outcome = AccountOutcome {
            account_name: "main".to_string(),
            success: false,
            message: "签到失败".to_string(),
            user_info: Some(UserInfo::from_raw(1_000_000.0, 0.0)),
        };
        assert_eq!(outcome.report_line(), "[FAIL] main\n签到失败");
    }
}
