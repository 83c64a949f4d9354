use log::{info, warn};

use rollcall_domain::notification::{NotificationMessage, NotificationSender};

use super::RunSummary;

const REPORT_TITLE: &str = "签到结果报告";

/// Consolidated run report: one block per account, blank line between.
pub fn build_report_message(summary: &RunSummary) -> NotificationMessage {
    let content = format!(
        "{}\n\n共 {}/{} 个账号签到成功\n⏱ {}",
        summary.report_lines.join("\n\n"),
        summary.success_count,
        summary.total,
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    NotificationMessage::new(REPORT_TITLE, content)
}

/// Push the report through the configured channel; delivery problems are
/// logged, never escalated.
pub(super) async fn push_report(sender: &dyn NotificationSender, summary: &RunSummary) {
    let message = build_report_message(summary);
    match sender.send(&message).await {
        Ok(()) => info!("Run report notification pushed"),
        Err(e) => warn!("Failed to push run report: {}", e),
    }
}
