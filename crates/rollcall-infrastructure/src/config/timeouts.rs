use std::time::Duration;

/// Configuration for various timeout durations across the application
#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    /// Portal page load timeout (WAF interstitials can hold a page for a
    /// long time before releasing it)
    pub page_load: Duration,

    /// Settle time after navigation before probing the page
    pub page_settle: Duration,

    /// Browser launch timeout
    pub browser_launch: Duration,

    /// Browser close timeout
    pub browser_close: Duration,

    /// Interval between challenge-token polls in the browser
    pub token_poll_interval: Duration,

    /// Total budget for browser-side token polling
    pub token_wait: Duration,

    /// Health probe timeout for the self-hosted solver
    pub solver_health: Duration,

    /// Grace period before the first solver result poll
    pub solver_initial_wait: Duration,

    /// Interval between solver result polls
    pub solver_poll_interval: Duration,

    /// HTTP request timeout
    pub http_request: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        GLOBAL_TIMEOUT_CONFIG.clone()
    }
}

impl TimeoutConfig {
    /// Get the global timeout configuration
    pub fn global() -> &'static Self {
        &GLOBAL_TIMEOUT_CONFIG
    }
}

/// Global timeout configuration instance
static GLOBAL_TIMEOUT_CONFIG: TimeoutConfig = TimeoutConfig {
    page_load: Duration::from_secs(120),
    page_settle: Duration::from_secs(3),
    browser_launch: Duration::from_secs(30),
    browser_close: Duration::from_secs(5),
    token_poll_interval: Duration::from_secs(2),
    token_wait: Duration::from_secs(40),
    solver_health: Duration::from_secs(2),
    solver_initial_wait: Duration::from_secs(5),
    solver_poll_interval: Duration::from_secs(2),
    http_request: Duration::from_secs(30),
};
