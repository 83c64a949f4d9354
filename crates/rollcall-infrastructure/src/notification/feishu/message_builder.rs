use rollcall_domain::notification::NotificationMessage;
use serde_json::json;

impl super::FeishuWebhookSender {
    /// Build a rich text (post) message for Feishu
    pub(super) fn build_rich_message(&self, message: &NotificationMessage) -> serde_json::Value {
        let mut content_elements = vec![json!({
            "tag": "text",
            "text": message.content
        })];

        if let Some(link) = &message.link {
            content_elements.push(json!({
                "tag": "a",
                "text": "查看详情",
                "href": link
            }));
        }

        json!({
            "msg_type": "post",
            "content": {
                "post": {
                    "zh_cn": {
                        "title": message.title,
                        "content": [content_elements]
                    }
                }
            }
        })
    }

    /// Build a simple text message for Feishu (fallback)
    pub(super) fn build_text_message(&self, message: &NotificationMessage) -> serde_json::Value {
        let text = format!("{}\n{}", message.title, message.content);

        json!({
            "msg_type": "text",
            "content": {
                "text": text
            }
        })
    }
}
