use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Persisted fingerprint length in hex chars.
const FINGERPRINT_LEN: usize = 16;

/// Compute the stable digest of the run's balances.
///
/// Keys are account slots (`acc_<index>`), values the converted quota of
/// each account with a successful balance read. The BTreeMap plus compact
/// JSON gives a canonical byte sequence, so identical balances always hash
/// identically regardless of insertion order.
pub fn balance_fingerprint(balances: &BTreeMap<String, f64>) -> String {
    let canonical = serde_json::to_string(balances).unwrap_or_else(|_| "{}".to_string());
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    let digest = hasher.finalize();
    format!("{:x}", digest)[..FINGERPRINT_LEN].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn balances(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect()
    }

    #[test]
    fn test_fingerprint_is_order_independent() {
        let forward = balances(&[("acc_0", 1.0), ("acc_1", 2.5), ("acc_2", 0.0)]);

        let mut reversed = BTreeMap::new();
        reversed.insert("acc_2".to_string(), 0.0);
        reversed.insert("acc_0".to_string(), 1.0);
        reversed.insert("acc_1".to_string(), 2.5);

        assert_eq!(balance_fingerprint(&forward), balance_fingerprint(&reversed));
    }

    #[test]
    fn test_fingerprint_changes_with_any_quota() {
        let before = balances(&[("acc_0", 1.0), ("acc_1", 2.5)]);
        let after = balances(&[("acc_0", 1.0), ("acc_1", 2.51)]);
        assert_ne!(balance_fingerprint(&before), balance_fingerprint(&after));
    }

    #[test]
    fn test_fingerprint_changes_with_account_set() {
        let two = balances(&[("acc_0", 1.0), ("acc_1", 2.5)]);
        let one = balances(&[("acc_0", 1.0)]);
        assert_ne!(balance_fingerprint(&two), balance_fingerprint(&one));
    }

    #[test]
    fn test_fingerprint_shape() {
        let fp = balance_fingerprint(&balances(&[]));
        assert_eq!(fp.len(), 16);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
