mod report;

pub use report::build_report_message;

use log::{debug, error, info, warn};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::instrument;

use rollcall_domain::account::Account;
use rollcall_domain::balance::balance_fingerprint;
use rollcall_domain::check_in::Provider;
use rollcall_domain::notification::NotificationSender;
use rollcall_infrastructure::state::FingerprintStore;

use crate::application::services::{AccountOutcome, CheckInExecutor};

/// Operator-facing run switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunPolicy {
    pub skip_notify: bool,
    pub always_exit_zero: bool,
}

/// Aggregated result of one full run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub success_count: usize,
    pub total: usize,
    pub report_lines: Vec<String>,
}

impl RunSummary {
    pub fn all_succeeded(&self) -> bool {
        self.success_count == self.total
    }
}

/// Process exit code under the configured policy.
pub fn resolve_exit_code(all_succeeded: bool, always_exit_zero: bool) -> u8 {
    if always_exit_zero || all_succeeded {
        0
    } else {
        1
    }
}

/// Whether the consolidated notification should be pushed.
pub fn should_notify(all_succeeded: bool, skip_notify: bool) -> bool {
    !all_succeeded && !skip_notify
}

/// Drives the whole run: accounts strictly one at a time, outcomes
/// aggregated, balance fingerprint diffed and persisted, notification
/// pushed at most once.
pub struct RunCoordinator {
    executor: CheckInExecutor,
    fingerprint_store: FingerprintStore,
    sender: Option<Arc<dyn NotificationSender>>,
    policy: RunPolicy,
}

impl RunCoordinator {
    pub fn new(
        executor: CheckInExecutor,
        fingerprint_store: FingerprintStore,
        sender: Option<Arc<dyn NotificationSender>>,
        policy: RunPolicy,
    ) -> Self {
        Self {
            executor,
            fingerprint_store,
            sender,
            policy,
        }
    }

    #[instrument(skip_all, fields(total = accounts.len()))]
    pub async fn run(
        &self,
        accounts: &[Account],
        providers: &HashMap<String, Provider>,
    ) -> RunSummary {
        let previous_fingerprint = self.fingerprint_store.load();

        let total = accounts.len();
        let mut success_count = 0;
        let mut report_lines = Vec::with_capacity(total);
        let mut balances: BTreeMap<String, f64> = BTreeMap::new();

        for (index, account) in accounts.iter().enumerate() {
            let account_name = account.display_name(index);

            // No exception from one account may abort the run; a missing
            // provider definition is fatal to that account only
            let outcome = match providers.get(account.provider()) {
                Some(provider) => self.executor.check_in_account(account, index, provider).await,
                None => {
                    error!(
                        "[{}] Provider not configured: {}",
                        account_name,
                        account.provider()
                    );
                    AccountOutcome::failure(
                        &account_name,
                        format!("Provider not configured: {}", account.provider()),
                    )
                }
            };

            if outcome.success {
                success_count += 1;
            }
            // Every successful balance read feeds the fingerprint, even
            // when the check-in itself was rejected
            if let Some(info) = &outcome.user_info {
                balances.insert(format!("acc_{}", index), info.quota);
            }
            report_lines.push(outcome.report_line());
        }

        self.persist_fingerprint(previous_fingerprint, &balances);

        let summary = RunSummary {
            success_count,
            total,
            report_lines,
        };

        if should_notify(summary.all_succeeded(), self.policy.skip_notify) {
            match &self.sender {
                Some(sender) => report::push_report(sender.as_ref(), &summary).await,
                None => info!("No notification channel configured, skipping push"),
            }
        }

        info!(
            "Check-in run finished: {}/{} succeeded",
            summary.success_count, summary.total
        );

        summary
    }

    pub fn exit_code(&self, summary: &RunSummary) -> u8 {
        resolve_exit_code(summary.all_succeeded(), self.policy.always_exit_zero)
    }

    /// The fingerprint diff is informational; it never gates notification,
    /// only whether the state file is rewritten.
    fn persist_fingerprint(&self, previous: Option<String>, balances: &BTreeMap<String, f64>) {
        let current = balance_fingerprint(balances);
        match previous {
            Some(prev) if prev == current => {
                debug!("Balance fingerprint unchanged ({})", current);
            }
            _ => {
                info!("Balance fingerprint changed, persisting {}", current);
                if let Err(e) = self.fingerprint_store.save(&current) {
                    warn!("Failed to persist balance fingerprint: {:#}", e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollcall_infrastructure::http::TurnstileSolver;

    fn coordinator_with_store(store: FingerprintStore) -> RunCoordinator {
        let executor =
            CheckInExecutor::new(Arc::new(TurnstileSolver::browser_only()), true, None).unwrap();
        RunCoordinator::new(executor, store, None, RunPolicy::default())
    }

    #[test]
    fn test_fingerprint_persisted_and_rewritten_on_change() {
        let dir = tempfile::tempdir().unwrap();
        let store = FingerprintStore::new(dir.path().join("balance_hash.txt"));
        let coordinator = coordinator_with_store(store);

        let mut balances = BTreeMap::new();
        balances.insert("acc_0".to_string(), 2.0);

        coordinator.persist_fingerprint(None, &balances);
        let persisted = coordinator.fingerprint_store.load().unwrap();
        assert_eq!(persisted, balance_fingerprint(&balances));

        balances.insert("acc_0".to_string(), 3.0);
        coordinator.persist_fingerprint(Some(persisted.clone()), &balances);
        let rewritten = coordinator.fingerprint_store.load().unwrap();
        assert_ne!(rewritten, persisted);
        assert_eq!(rewritten, balance_fingerprint(&balances));
    }

    #[test]
    fn test_resolve_exit_code() {
        assert_eq!(resolve_exit_code(true, false), 0);
        assert_eq!(resolve_exit_code(false, false), 1);
        // one source variant always exits 0; modeled as an explicit policy
        assert_eq!(resolve_exit_code(false, true), 0);
        assert_eq!(resolve_exit_code(true, true), 0);
    }

    #[test]
    fn test_should_notify_gates() {
        assert!(should_notify(false, false));
        assert!(!should_notify(true, false));
        assert!(!should_notify(false, true));
        assert!(!should_notify(true, true));
    }

    #[test]
    fn test_summary_all_succeeded() {
        let summary = RunSummary {
            success_count: 2,
            total: 2,
            report_lines: vec![],
        };
        assert!(summary.all_succeeded());

        let summary = RunSummary {
            success_count: 1,
            total: 2,
            report_lines: vec![],
        };
        assert!(!summary.all_succeeded());
    }
}
