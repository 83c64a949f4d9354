use async_trait::async_trait;

use rollcall_domain::notification::{NotificationMessage, NotificationSender};
use rollcall_domain::shared::DomainError;

#[async_trait]
impl NotificationSender for super::FeishuWebhookSender {
    async fn send(&self, message: &NotificationMessage) -> Result<(), DomainError> {
        // Rich post first; some bot configurations only accept plain text,
        // so a rejected payload is retried once as a text message
        match self.post_payload(&self.build_rich_message(message)).await {
            Ok(()) => Ok(()),
            Err(e) => {
                log::warn!("Rich Feishu message rejected ({}), retrying as text", e);
                self.post_payload(&self.build_text_message(message)).await
            }
        }
    }
}

impl super::FeishuWebhookSender {
    async fn post_payload(&self, payload: &serde_json::Value) -> Result<(), DomainError> {
        let url = self.build_webhook_url();

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                DomainError::Infrastructure(format!("Failed to send Feishu notification: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DomainError::Infrastructure(format!(
                "Feishu webhook failed with status {}: {}",
                status, body
            )));
        }

        let resp_body: serde_json::Value = response.json().await.map_err(|e| {
            DomainError::Infrastructure(format!("Failed to parse Feishu response: {}", e))
        })?;

        // Feishu returns {"code":0} for success
        if let Some(code) = resp_body.get("code").and_then(|c| c.as_i64()) {
            if code != 0 {
                let msg = resp_body
                    .get("msg")
                    .and_then(|m| m.as_str())
                    .unwrap_or("Unknown error");
                return Err(DomainError::Infrastructure(format!(
                    "Feishu webhook error code {}: {}",
                    code, msg
                )));
            }
        }

        Ok(())
    }
}
