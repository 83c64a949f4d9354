use serde::{Deserialize, Serialize};

/// How a provider's bot-mitigation layer is satisfied before the API calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BypassMethod {
    #[default]
    None,
    WafCookies,
}

/// Read-only portal configuration shared by every account on the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provider {
    domain: String,
    #[serde(default = "default_login_path")]
    login_path: String,
    user_info_path: String,
    #[serde(default)]
    sign_in_path: Option<String>,
    #[serde(default = "default_api_user_key")]
    api_user_key: String,
    #[serde(default)]
    bypass_method: BypassMethod,
    #[serde(default)]
    waf_cookie_names: Vec<String>,
    #[serde(default = "default_checked_in_phrases")]
    checked_in_phrases: Vec<String>,
}

fn default_login_path() -> String {
    "/console/personal".to_string()
}

fn default_api_user_key() -> String {
    "new-api-user".to_string()
}

/// Providers phrase "already checked in today" in free text; the known
/// variants ship as defaults and stay overridable per provider.
fn default_checked_in_phrases() -> Vec<String> {
    ["今日已签到", "重复签到", "已经签到"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Provider {
    pub fn new(domain: impl Into<String>, user_info_path: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            login_path: default_login_path(),
            user_info_path: user_info_path.into(),
            sign_in_path: None,
            api_user_key: default_api_user_key(),
            bypass_method: BypassMethod::default(),
            waf_cookie_names: Vec::new(),
            checked_in_phrases: default_checked_in_phrases(),
        }
    }

    pub fn with_sign_in_path(mut self, path: impl Into<String>) -> Self {
        self.sign_in_path = Some(path.into());
        self
    }

    pub fn with_bypass_method(mut self, method: BypassMethod) -> Self {
        self.bypass_method = method;
        self
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn login_url(&self) -> String {
        format!("{}{}", self.domain, self.login_path)
    }

    pub fn user_info_url(&self) -> String {
        format!("{}{}", self.domain, self.user_info_path)
    }

    pub fn sign_in_url(&self) -> Option<String> {
        self.sign_in_path
            .as_ref()
            .map(|p| format!("{}{}", self.domain, p))
    }

    pub fn api_user_key(&self) -> &str {
        &self.api_user_key
    }

    pub fn needs_waf_bypass(&self) -> bool {
        self.bypass_method == BypassMethod::WafCookies
    }

    /// Cookie names the WAF is known to set. Informational only: the
    /// orchestrator always collects every cookie, this set just drives the
    /// captured-vs-expected log line.
    pub fn waf_cookie_names(&self) -> &[String] {
        &self.waf_cookie_names
    }

    pub fn checked_in_phrases(&self) -> &[String] {
        &self.checked_in_phrases
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_join_domain_and_path() {
        let provider = Provider::new("https://example.com", "/api/user/self")
            .with_sign_in_path("/api/user/sign_in");

        assert_eq!(provider.login_url(), "https://example.com/console/personal");
        assert_eq!(provider.user_info_url(), "https://example.com/api/user/self");
        assert_eq!(
            provider.sign_in_url().as_deref(),
            Some("https://example.com/api/user/sign_in")
        );
    }

    #[test]
    fn test_sign_in_url_absent_by_default() {
        let provider = Provider::new("https://example.com", "/api/user/self");
        assert!(provider.sign_in_url().is_none());
        assert!(!provider.needs_waf_bypass());
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let provider: Provider = serde_json::from_str(
            r#"{"domain":"https://example.com","user_info_path":"/api/user/self","bypass_method":"waf_cookies"}"#,
        )
        .unwrap();

        assert!(provider.needs_waf_bypass());
        assert_eq!(provider.api_user_key(), "new-api-user");
        assert_eq!(provider.login_url(), "https://example.com/console/personal");
        assert!(provider
            .checked_in_phrases()
            .iter()
            .any(|p| p == "今日已签到"));
    }
}
