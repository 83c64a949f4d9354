mod local;
mod yescaptcha;

pub use local::LocalSolverClient;
pub use yescaptcha::YesCaptchaClient;

use log::info;

/// Number of result polls before a solver attempt is abandoned.
pub(super) const MAX_POLL_ATTEMPTS: u32 = 30;

/// The solving strategy in effect for this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverMethod {
    YesCaptcha,
    LocalSolver,
    Browser,
}

impl SolverMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            SolverMethod::YesCaptcha => "yescaptcha",
            SolverMethod::LocalSolver => "local_solver",
            SolverMethod::Browser => "browser",
        }
    }
}

/// Turnstile solving service, selected exactly once at startup:
/// YesCaptcha when an API key is configured, the self-hosted solver when
/// its health probe answers, browser simulation otherwise.
pub struct TurnstileSolver {
    method: SolverMethod,
    yescaptcha: Option<YesCaptchaClient>,
    local: Option<LocalSolverClient>,
}

impl TurnstileSolver {
    pub async fn select(yescaptcha_key: Option<&str>, solver_url: &str) -> Self {
        if let Some(key) = yescaptcha_key.map(str::trim).filter(|k| !k.is_empty()) {
            info!("Turnstile solver: YesCaptcha API");
            return Self {
                method: SolverMethod::YesCaptcha,
                yescaptcha: Some(YesCaptchaClient::new(key)),
                local: None,
            };
        }

        let local = LocalSolverClient::new(solver_url);
        if local.is_healthy().await {
            info!("Turnstile solver: self-hosted solver at {}", solver_url);
            return Self {
                method: SolverMethod::LocalSolver,
                yescaptcha: None,
                local: Some(local),
            };
        }

        info!("Turnstile solver: browser simulation (lowest success rate)");
        Self {
            method: SolverMethod::Browser,
            yescaptcha: None,
            local: None,
        }
    }

    /// Strategy with no remote backend; simulation happens in the browser.
    pub fn browser_only() -> Self {
        Self {
            method: SolverMethod::Browser,
            yescaptcha: None,
            local: None,
        }
    }

    pub fn method(&self) -> SolverMethod {
        self.method
    }

    /// Whether a remote solving backend is active (so a site key is worth
    /// extracting before falling back to simulated interaction).
    pub fn is_remote(&self) -> bool {
        matches!(
            self.method,
            SolverMethod::YesCaptcha | SolverMethod::LocalSolver
        )
    }

    /// Solve the challenge for `site_url`/`site_key`. Never errors past
    /// this boundary: transport and protocol failures all reduce to `None`.
    pub async fn solve(
        &self,
        site_url: &str,
        site_key: &str,
        account_name: &str,
    ) -> Option<String> {
        match self.method {
            SolverMethod::YesCaptcha => {
                self.yescaptcha
                    .as_ref()?
                    .solve(site_url, site_key, account_name)
                    .await
            }
            SolverMethod::LocalSolver => {
                self.local
                    .as_ref()?
                    .solve(site_url, site_key, account_name)
                    .await
            }
            SolverMethod::Browser => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_blank_key_and_dead_solver_fall_back_to_browser() {
        // port 9 (discard) is never a live solver
        let solver = TurnstileSolver::select(Some("   "), "http://127.0.0.1:9").await;
        assert_eq!(solver.method(), SolverMethod::Browser);
        assert!(!solver.is_remote());
    }

    #[tokio::test]
    async fn test_api_key_selects_yescaptcha() {
        let solver = TurnstileSolver::select(Some("key-123"), "http://127.0.0.1:9").await;
        assert_eq!(solver.method(), SolverMethod::YesCaptcha);
        assert!(solver.is_remote());
    }

    #[tokio::test]
    async fn test_browser_strategy_never_solves_remotely() {
        let solver = TurnstileSolver::browser_only();
        assert_eq!(
            solver.solve("https://example.com", "0x4AAA", "acct").await,
            None
        );
    }

    #[test]
    fn test_method_names() {
        assert_eq!(SolverMethod::YesCaptcha.as_str(), "yescaptcha");
        assert_eq!(SolverMethod::LocalSolver.as_str(), "local_solver");
        assert_eq!(SolverMethod::Browser.as_str(), "browser");
    }
}
