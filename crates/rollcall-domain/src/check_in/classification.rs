use serde_json::Value;

/// Verdict for a provider check-in response body.
///
/// `Unknown` means the body was neither parseable JSON nor recognizably
/// successful text; callers decide how to surface it (the executor records
/// it as a failure with the raw snippet preserved).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseClass {
    Success,
    Failure,
    Unknown,
}

#[derive(Debug, Clone)]
pub struct ClassifiedResponse {
    pub class: ResponseClass,
    pub message: String,
}

impl ClassifiedResponse {
    pub fn is_success(&self) -> bool {
        self.class == ResponseClass::Success
    }
}

/// Classify a check-in response across the known provider dialects.
///
/// JSON bodies succeed on any of `success:true`, `ret==1`, `code==0`,
/// `code==200`, or a `message`/`msg` containing one of the provider's
/// already-checked-in phrases; a duplicate check-in is a correct outcome,
/// never an error. Non-JSON bodies fall back to a case-insensitive
/// `success` substring or the same phrases.
pub fn classify_check_in_response(
    body: &str,
    checked_in_phrases: &[String],
) -> ClassifiedResponse {
    match serde_json::from_str::<Value>(body) {
        Ok(data) => {
            let message = data["message"]
                .as_str()
                .or(data["msg"].as_str())
                .unwrap_or("")
                .to_string();

            let already_done = checked_in_phrases.iter().any(|p| message.contains(p.as_str()));
            let success = data["success"].as_bool() == Some(true)
                || data["ret"].as_i64() == Some(1)
                || data["code"].as_i64() == Some(0)
                || data["code"].as_i64() == Some(200)
                || already_done;

            if success {
                let message = if message.is_empty() {
                    "Check-in successful".to_string()
                } else {
                    message
                };
                ClassifiedResponse {
                    class: ResponseClass::Success,
                    message,
                }
            } else {
                let message = if message.is_empty() {
                    data["error"]
                        .as_str()
                        .unwrap_or("Check-in failed")
                        .to_string()
                } else {
                    message
                };
                ClassifiedResponse {
                    class: ResponseClass::Failure,
                    message,
                }
            }
        }
        Err(_) => {
            let recognized = body.to_lowercase().contains("success")
                || checked_in_phrases.iter().any(|p| body.contains(p.as_str()));

            if recognized {
                ClassifiedResponse {
                    class: ResponseClass::Success,
                    message: "Check-in successful".to_string(),
                }
            } else {
                ClassifiedResponse {
                    class: ResponseClass::Unknown,
                    message: snippet(body),
                }
            }
        }
    }
}

/// First 100 chars of the raw body, kept for diagnostics.
fn snippet(body: &str) -> String {
    let end = body
        .char_indices()
        .nth(100)
        .map(|(i, _)| i)
        .unwrap_or(body.len());
    body[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phrases() -> Vec<String> {
        ["今日已签到", "重复签到", "已经签到"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn test_explicit_success_flag() {
        let result = classify_check_in_response(r#"{"success":true}"#, &phrases());
        assert!(result.is_success());
    }

    #[test]
    fn test_ret_and_code_variants() {
        assert!(classify_check_in_response(r#"{"ret":1}"#, &phrases()).is_success());
        assert!(classify_check_in_response(r#"{"code":0}"#, &phrases()).is_success());
        assert!(classify_check_in_response(r#"{"code":200}"#, &phrases()).is_success());
        assert!(!classify_check_in_response(r#"{"ret":0}"#, &phrases()).is_success());
    }

    #[test]
    fn test_already_checked_in_is_success() {
        // succeeds even with success absent or explicitly false
        let result = classify_check_in_response(r#"{"message":"今日已签到"}"#, &phrases());
        assert!(result.is_success());
        assert_eq!(result.message, "今日已签到");

        let result =
            classify_check_in_response(r#"{"success":false,"msg":"重复签到"}"#, &phrases());
        assert!(result.is_success());
    }

    #[test]
    fn test_duplicate_with_failed_ret_is_success() {
        let result = classify_check_in_response(r#"{"ret":0,"msg":"今日已签到"}"#, &phrases());
        assert!(result.is_success());
    }

    #[test]
    fn test_json_failure_keeps_message() {
        let result =
            classify_check_in_response(r#"{"success":false,"message":"签到失败"}"#, &phrases());
        assert_eq!(result.class, ResponseClass::Failure);
        assert_eq!(result.message, "签到失败");
    }

    #[test]
    fn test_non_json_success_marker() {
        let result = classify_check_in_response("Operation was a SUCCESS", &phrases());
        assert!(result.is_success());
    }

    #[test]
    fn test_non_json_phrase_match() {
        let result = classify_check_in_response("提示：今日已签到！", &phrases());
        assert!(result.is_success());
    }

    #[test]
    fn test_non_json_garbage_is_unknown() {
        let result = classify_check_in_response("<html>gateway error</html>", &phrases());
        assert_eq!(result.class, ResponseClass::Unknown);
        assert!(result.message.contains("gateway error"));
    }

    #[test]
    fn test_snippet_truncates_long_bodies() {
        let long = "x".repeat(500);
        let result = classify_check_in_response(&long, &phrases());
        assert_eq!(result.class, ResponseClass::Unknown);
        assert_eq!(result.message.len(), 100);
    }
}
