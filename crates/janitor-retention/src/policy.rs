//! Policy orchestration.
//!
//! Policies are independent: one failing run must not keep the others
//! from executing. The orchestrator runs them in sequence, records the
//! outcome of each, and reports all failures together at the end.

use async_trait::async_trait;
use tracing::Instrument;

use janitor_core::error::Error;
use janitor_core::observability::policy_span;

/// Upper bound on concurrent deletions within one retention group.
pub const DEFAULT_DELETE_CONCURRENCY: usize = 4;

/// One retention policy: decides which artifacts are stale and deletes
/// them from the remote store.
#[async_trait]
pub trait RetentionPolicy: Send + Sync {
    /// Name used in logs and failure reports.
    fn name(&self) -> &str;

    /// Runs the policy to completion.
    async fn execute(&self) -> janitor_core::Result<()>;
}

/// A policy run that ended in an error.
#[derive(Debug)]
pub struct PolicyFailure {
    /// Name of the failed policy.
    pub policy: String,
    /// The error that ended the run.
    pub error: Error,
}

/// Outcome of running a set of policies.
#[derive(Debug, Default)]
pub struct RunOutcome {
    /// Policies that ran to completion, in execution order.
    pub completed: Vec<String>,
    /// Policies that failed, with their errors.
    pub failures: Vec<PolicyFailure>,
}

impl RunOutcome {
    /// Returns true if any policy failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Runs each policy in turn, isolating failures.
///
/// A failed policy is recorded and the remaining policies still run;
/// the combined outcome tells the caller whether to exit non-zero.
pub async fn execute_all(policies: &[Box<dyn RetentionPolicy>]) -> RunOutcome {
    let mut outcome = RunOutcome::default();
    for policy in policies {
        let name = policy.name().to_owned();
        let result = policy.execute().instrument(policy_span(&name)).await;
        match result {
            Ok(()) => {
                tracing::info!(policy = %name, "policy completed");
                outcome.completed.push(name);
            }
            Err(error) => {
                tracing::error!(policy = %name, error = %error, "policy failed");
                outcome.failures.push(PolicyFailure {
                    policy: name,
                    error,
                });
            }
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    struct StubPolicy {
        name: &'static str,
        fail: bool,
        runs: Arc<AtomicU32>,
    }

    #[async_trait]
    impl RetentionPolicy for StubPolicy {
        fn name(&self) -> &str {
            self.name
        }

        async fn execute(&self) -> janitor_core::Result<()> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(Error::remote("store unavailable"))
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn a_failing_policy_does_not_stop_the_others() {
        let runs = Arc::new(AtomicU32::new(0));
        let policies: Vec<Box<dyn RetentionPolicy>> = vec![
            Box::new(StubPolicy {
                name: "first",
                fail: true,
                runs: runs.clone(),
            }),
            Box::new(StubPolicy {
                name: "second",
                fail: false,
                runs: runs.clone(),
            }),
        ];

        let outcome = execute_all(&policies).await;

        assert_eq!(runs.load(Ordering::SeqCst), 2);
        assert_eq!(outcome.completed, vec!["second".to_owned()]);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].policy, "first");
        assert!(outcome.has_failures());
    }

    #[tokio::test]
    async fn all_successes_report_no_failures() {
        let runs = Arc::new(AtomicU32::new(0));
        let policies: Vec<Box<dyn RetentionPolicy>> = vec![
            Box::new(StubPolicy {
                name: "first",
                fail: false,
                runs: runs.clone(),
            }),
            Box::new(StubPolicy {
                name: "second",
                fail: false,
                runs: runs.clone(),
            }),
        ];

        let outcome = execute_all(&policies).await;

        assert!(!outcome.has_failures());
        assert_eq!(outcome.completed, vec!["first".to_owned(), "second".to_owned()]);
    }

    #[tokio::test]
    async fn empty_policy_set_is_a_clean_outcome() {
        let outcome = execute_all(&[]).await;
        assert!(outcome.completed.is_empty());
        assert!(!outcome.has_failures());
    }
}
