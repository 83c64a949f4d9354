use anyhow::{Context, Result};
use reqwest::{header, Client};
use std::collections::HashMap;

use rollcall_domain::check_in::UserInfo;

use super::types::{browser_headers, cookie_header};

impl super::HttpClient {
    /// Query the account balance with retry on transient transport errors.
    ///
    /// Anything other than an HTTP 200 with a `success:true` body is a
    /// session/authentication failure; the caller stops the account's
    /// pipeline before attempting check-in.
    pub async fn get_user_info(
        &self,
        url: &str,
        referer: &str,
        cookies: &HashMap<String, String>,
        api_user_key: &str,
        api_user: &str,
    ) -> Result<UserInfo> {
        let url = url.to_string();
        let referer = referer.to_string();
        let cookies = cookies.clone();
        let api_user_key = api_user_key.to_string();
        let api_user = api_user.to_string();

        self.execute_with_retry("Get user info", move || {
            let url = url.clone();
            let referer = referer.clone();
            let cookies = cookies.clone();
            let api_user_key = api_user_key.clone();
            let api_user = api_user.clone();
            let client = self.client.clone();

            async move {
                Self::get_user_info_once(&client, &url, &referer, &cookies, &api_user_key, &api_user)
                    .await
            }
        })
        .await
    }

    async fn get_user_info_once(
        client: &Client,
        url: &str,
        referer: &str,
        cookies: &HashMap<String, String>,
        api_user_key: &str,
        api_user: &str,
    ) -> Result<UserInfo> {
        let mut headers = browser_headers(referer);
        if !api_user.is_empty() {
            headers.insert(
                header::HeaderName::from_bytes(api_user_key.as_bytes())?,
                header::HeaderValue::from_str(api_user)?,
            );
        }

        let mut request = client.get(url).headers(headers);

        let cookie_string = cookie_header(cookies);
        if !cookie_string.is_empty() {
            request = request.header(header::COOKIE, cookie_string);
        }

        let response = request
            .send()
            .await
            .context("Failed to send user info request")?;

        let status = response.status();
        log::debug!("User info response status: {}", status);

        if !status.is_success() {
            anyhow::bail!("HTTP {}", status.as_u16());
        }

        let text = response
            .text()
            .await
            .context("Failed to read user info response")?;

        let data: serde_json::Value = serde_json::from_str(&text).with_context(|| {
            format!(
                "Failed to parse user info response: {}",
                &text[..text.len().min(200)]
            )
        })?;

        if data["success"].as_bool() != Some(true) {
            let message = data["message"]
                .as_str()
                .filter(|m| !m.is_empty())
                .unwrap_or("Unknown error");
            anyhow::bail!("{}", message);
        }

        // Absent or negative raw quotas read as zero
        let quota_raw = data["data"]["quota"].as_f64().unwrap_or(0.0);
        let used_quota_raw = data["data"]["used_quota"].as_f64().unwrap_or(0.0);

        Ok(UserInfo::from_raw(quota_raw, used_quota_raw))
    }
}
