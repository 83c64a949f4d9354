use serde::{Deserialize, Serialize};

/// Raw provider balance units per 1.0 display currency unit.
pub const QUOTA_SCALE: f64 = 500_000.0;

/// Balance snapshot read from the provider's user-info endpoint, already
/// converted to display currency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    pub quota: f64,
    pub used_quota: f64,
}

impl UserInfo {
    pub fn from_raw(quota_raw: f64, used_quota_raw: f64) -> Self {
        Self {
            quota: convert_quota(quota_raw),
            used_quota: convert_quota(used_quota_raw),
        }
    }

    pub fn display(&self) -> String {
        format!("💰 余额: ${}", format_amount(self.quota))
    }
}

/// Convert raw micro-units to currency, rounded to 2 decimals. Negative or
/// missing raw quotas are treated as zero.
pub fn convert_quota(raw: f64) -> f64 {
    let raw = if raw.is_finite() { raw.max(0.0) } else { 0.0 };
    (raw / QUOTA_SCALE * 100.0).round() / 100.0
}

/// Render an amount with at least one and at most two decimals, matching
/// the providers' own balance display (`2.0`, `2.5`, `2.05`).
pub fn format_amount(value: f64) -> String {
    let mut s = format!("{:.2}", value);
    if s.ends_with('0') && !s.ends_with(".0") {
        s.pop();
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_quota_scale() {
        assert_eq!(convert_quota(500_000.0), 1.0);
        assert_eq!(convert_quota(1_000_000.0), 2.0);
        assert_eq!(convert_quota(0.0), 0.0);
    }

    #[test]
    fn test_convert_quota_rounds_to_cents() {
        assert_eq!(convert_quota(1_234_567.0), 2.47);
    }

    #[test]
    fn test_convert_quota_clamps_negative() {
        assert_eq!(convert_quota(-500_000.0), 0.0);
        assert_eq!(convert_quota(f64::NAN), 0.0);
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(1.0), "1.0");
        assert_eq!(format_amount(0.0), "0.0");
        assert_eq!(format_amount(2.5), "2.5");
        assert_eq!(format_amount(2.05), "2.05");
    }

    #[test]
    fn test_display_line() {
        let info = UserInfo::from_raw(1_000_000.0, 500_000.0);
        assert_eq!(info.display(), "💰 余额: $2.0");
        assert_eq!(info.used_quota, 1.0);
    }
}
