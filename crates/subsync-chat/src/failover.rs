//! Ordered provider failover.
//!
//! Providers are tried one at a time, in order. The first success wins and
//! later providers are never contacted. When every provider fails, the
//! reason reported is the one from the last attempt.

use std::future::Future;

use tracing::{error, warn};

use subsync_core::{Error, Result};

use crate::types::ProviderKind;

/// Why one provider in the chain did not answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptFailure {
    pub provider: ProviderKind,
    pub reason: String,
}

/// Result of walking a chain.
#[derive(Debug)]
pub enum ChainOutcome<T> {
    Succeeded {
        value: T,
        provider: ProviderKind,
        failures: Vec<AttemptFailure>,
    },
    Exhausted {
        failures: Vec<AttemptFailure>,
    },
}

impl<T> ChainOutcome<T> {
    pub fn failures(&self) -> &[AttemptFailure] {
        match self {
            Self::Succeeded { failures, .. } | Self::Exhausted { failures } => failures,
        }
    }

    /// Collapse to the value, or `AllProvidersFailed` naming the last reason.
    pub fn into_result(self) -> Result<T> {
        match self {
            Self::Succeeded { value, .. } => Ok(value),
            Self::Exhausted { failures } => {
                let last_reason = failures
                    .last()
                    .map(|f| f.reason.clone())
                    .unwrap_or_else(|| "no providers configured".into());
                Err(Error::AllProvidersFailed { last_reason })
            }
        }
    }
}

/// Try `attempt` against each provider in order until one succeeds.
///
/// Errors that are not provider faults (see [`Error::is_failover_eligible`])
/// stop the walk immediately; another provider would not fix them.
pub async fn run_chain<T, F, Fut>(providers: &[ProviderKind], mut attempt: F) -> ChainOutcome<T>
where
    F: FnMut(ProviderKind) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut failures = Vec::new();

    for &provider in providers {
        match attempt(provider).await {
            Ok(value) => {
                return ChainOutcome::Succeeded {
                    value,
                    provider,
                    failures,
                };
            }
            Err(e) => {
                warn!("Provider {} failed: {}", provider, e);
                let eligible = e.is_failover_eligible();
                failures.push(AttemptFailure {
                    provider,
                    reason: e.to_string(),
                });
                if !eligible {
                    break;
                }
            }
        }
    }

    error!("All {} provider attempts failed", failures.len());
    ChainOutcome::Exhausted { failures }
}
