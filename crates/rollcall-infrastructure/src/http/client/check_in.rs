use anyhow::{Context, Result};
use reqwest::header;
use serde_json::json;
use std::collections::HashMap;

use rollcall_domain::check_in::{classify_check_in_response, ResponseClass};

use super::types::{browser_headers, cookie_header, CheckInResult};

/// JSON body for the check-in POST: empty unless a challenge token was
/// obtained for this account.
pub fn build_check_in_payload(token: Option<&str>) -> serde_json::Value {
    match token {
        Some(token) if !token.is_empty() => json!({ "token": token }),
        _ => json!({}),
    }
}

impl super::HttpClient {
    /// Submit the check-in request and classify the provider's response.
    ///
    /// Single attempt: a provider-side rejection is recorded, never
    /// re-submitted within the run. Transport errors bubble up for the
    /// caller to convert into a failure outcome.
    #[allow(clippy::too_many_arguments)]
    pub async fn execute_check_in(
        &self,
        url: &str,
        referer: &str,
        cookies: &HashMap<String, String>,
        api_user_key: &str,
        api_user: &str,
        token: Option<&str>,
        checked_in_phrases: &[String],
    ) -> Result<CheckInResult> {
        let mut headers = browser_headers(referer);
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        if !api_user.is_empty() {
            headers.insert(
                header::HeaderName::from_bytes(api_user_key.as_bytes())?,
                header::HeaderValue::from_str(api_user)?,
            );
        }

        let mut request = self
            .client
            .post(url)
            .headers(headers)
            .json(&build_check_in_payload(token));

        let cookie_string = cookie_header(cookies);
        if !cookie_string.is_empty() {
            request = request.header(header::COOKIE, cookie_string);
        }

        let response = request
            .send()
            .await
            .context("Failed to send check-in request")?;

        let status = response.status();
        log::debug!("Check-in response status: {}", status);

        // The body is classified regardless of status: some portals answer
        // duplicate check-ins with a 4xx carrying a JSON message.
        let text = response
            .text()
            .await
            .context("Failed to read check-in response")?;

        let classified = classify_check_in_response(&text, checked_in_phrases);
        let result = match classified.class {
            ResponseClass::Success => CheckInResult {
                success: true,
                message: classified.message,
            },
            ResponseClass::Failure => CheckInResult {
                success: false,
                message: classified.message,
            },
            ResponseClass::Unknown => CheckInResult {
                success: false,
                message: format!("Unexpected response format: {}", classified.message),
            },
        };

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_without_token_is_empty_object() {
        let payload = build_check_in_payload(None);
        assert_eq!(payload, json!({}));
    }

    #[test]
    fn test_payload_with_empty_token_is_empty_object() {
        let payload = build_check_in_payload(Some(""));
        assert_eq!(payload, json!({}));
    }

    #[test]
    fn test_payload_with_token() {
        let payload = build_check_in_payload(Some("0.abc123"));
        assert_eq!(payload, json!({ "token": "0.abc123" }));
    }
}
