//! Chat orchestration across interchangeable LLM providers.
//!
//! A configured credential selects one provider directly (or an ordered
//! failover chain). Without a credential, requests go through the shared
//! backend relay, which does provider selection on the caller's behalf.

pub mod config;
pub mod failover;
pub mod orchestrator;
pub mod providers;
pub mod relay;
pub mod types;

#[cfg(test)]
mod mock;

pub use config::{ChatConfig, DispatchStrategy};
pub use failover::{run_chain, AttemptFailure, ChainOutcome};
pub use orchestrator::{ChatOrchestrator, DispatchPlan};
pub use providers::classify_provider;
pub use relay::RelayClient;
pub use types::*;
