mod feishu;

pub use feishu::FeishuWebhookSender;
