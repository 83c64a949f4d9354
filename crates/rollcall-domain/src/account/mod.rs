use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Raw session credential as supplied by the operator: either a structured
/// cookie mapping or a raw `key=value; key=value` header string. A bare
/// string with no `=` is treated as the value of the `session` cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawCredential {
    Map(HashMap<String, String>),
    Header(String),
}

impl RawCredential {
    /// Normalize into a canonical cookie mapping.
    ///
    /// Mappings pass through unchanged. Strings are split on `;`; each
    /// non-empty segment containing `=` is split on the first `=` into
    /// name/value, and a bare segment becomes the `session` cookie.
    /// Duplicate names resolve last-wins.
    pub fn to_cookie_map(&self) -> HashMap<String, String> {
        match self {
            RawCredential::Map(map) => map.clone(),
            RawCredential::Header(raw) => {
                let mut cookies = HashMap::new();
                for part in raw.split(';') {
                    let part = part.trim();
                    if part.is_empty() {
                        continue;
                    }
                    match part.split_once('=') {
                        Some((name, value)) => {
                            cookies.insert(name.to_string(), value.to_string());
                        }
                        None => {
                            cookies.insert("session".to_string(), part.to_string());
                        }
                    }
                }
                cookies
            }
        }
    }
}

/// Build the final cookie set for an account's HTTP calls.
///
/// WAF-acquired cookies are layered on top of the user-supplied ones: the
/// browser state is assumed fresher than whatever the operator pasted in.
pub fn assemble_cookies(
    credential: &RawCredential,
    waf_cookies: Option<&HashMap<String, String>>,
) -> HashMap<String, String> {
    let mut cookies = credential.to_cookie_map();
    if let Some(waf) = waf_cookies {
        cookies.extend(waf.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    cookies
}

/// One configured portal account. Immutable for the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    #[serde(default)]
    name: Option<String>,
    provider: String,
    cookies: RawCredential,
    api_user: i64,
}

impl Account {
    pub fn new(
        name: Option<String>,
        provider: impl Into<String>,
        cookies: RawCredential,
        api_user: i64,
    ) -> Self {
        Self {
            name,
            provider: provider.into(),
            cookies,
            api_user,
        }
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn cookies(&self) -> &RawCredential {
        &self.cookies
    }

    pub fn api_user(&self) -> i64 {
        self.api_user
    }

    /// Display name for logs and the report; falls back to a 1-based
    /// positional label when the operator did not name the account.
    pub fn display_name(&self, index: usize) -> String {
        match &self.name {
            Some(name) if !name.trim().is_empty() => name.trim().to_string(),
            _ => format!("Account {}", index + 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_string_with_pairs() {
        let cred = RawCredential::Header("a=1;b=2".to_string());
        let map = cred.to_cookie_map();
        assert_eq!(map.get("a").map(String::as_str), Some("1"));
        assert_eq!(map.get("b").map(String::as_str), Some("2"));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_bare_token_becomes_session() {
        let cred = RawCredential::Header("abc123token".to_string());
        let map = cred.to_cookie_map();
        assert_eq!(map.get("session").map(String::as_str), Some("abc123token"));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_value_keeps_embedded_equals() {
        let cred = RawCredential::Header("jwt=a=b=c; other=x".to_string());
        let map = cred.to_cookie_map();
        assert_eq!(map.get("jwt").map(String::as_str), Some("a=b=c"));
        assert_eq!(map.get("other").map(String::as_str), Some("x"));
    }

    #[test]
    fn test_explicit_session_not_duplicated_by_bare_token() {
        let cred = RawCredential::Header("session=first; second".to_string());
        let map = cred.to_cookie_map();
        // last-wins merge: the bare token overwrites the explicit value
        assert_eq!(map.get("session").map(String::as_str), Some("second"));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_empty_segments_ignored() {
        let cred = RawCredential::Header("; a=1; ;".to_string());
        let map = cred.to_cookie_map();
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_mapping_passes_through() {
        let mut inner = HashMap::new();
        inner.insert("session".to_string(), "xyz".to_string());
        let cred = RawCredential::Map(inner.clone());
        assert_eq!(cred.to_cookie_map(), inner);
    }

    #[test]
    fn test_waf_cookies_override_user_cookies() {
        let cred = RawCredential::Header("session=user; acw_tc=old".to_string());
        let mut waf = HashMap::new();
        waf.insert("acw_tc".to_string(), "fresh".to_string());
        waf.insert("cf_clearance".to_string(), "tok".to_string());

        let merged = assemble_cookies(&cred, Some(&waf));
        assert_eq!(merged.get("acw_tc").map(String::as_str), Some("fresh"));
        assert_eq!(merged.get("session").map(String::as_str), Some("user"));
        assert_eq!(merged.get("cf_clearance").map(String::as_str), Some("tok"));
    }

    #[test]
    fn test_assemble_without_waf() {
        let cred = RawCredential::Header("session=user".to_string());
        let merged = assemble_cookies(&cred, None);
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn test_display_name_fallback() {
        let account = Account::new(
            None,
            "anyrouter",
            RawCredential::Header("session=x".to_string()),
            42,
        );
        assert_eq!(account.display_name(0), "Account 1");
        assert_eq!(account.display_name(4), "Account 5");

        let named = Account::new(
            Some("  main  ".to_string()),
            "anyrouter",
            RawCredential::Header("session=x".to_string()),
            42,
        );
        assert_eq!(named.display_name(0), "main");
    }

    #[test]
    fn test_credential_deserializes_from_either_shape() {
        let from_string: Account =
            serde_json::from_str(r#"{"provider":"p","cookies":"a=1","api_user":7}"#).unwrap();
        assert!(matches!(from_string.cookies(), RawCredential::Header(_)));

        let from_map: Account =
            serde_json::from_str(r#"{"provider":"p","cookies":{"a":"1"},"api_user":7}"#).unwrap();
        assert!(matches!(from_map.cookies(), RawCredential::Map(_)));
    }
}
