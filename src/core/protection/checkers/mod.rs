// Rule checkers - one evaluator per policy category.
//
// Checkers are synchronous against in-memory state and return a typed
// Result so the orchestrator can fail open on a misbehaving rule without
// a blanket catch.

pub mod bot_policy;
pub mod channel_policy;
pub mod flood;
pub mod image_policy;
pub mod link_filter;
pub mod moderation_gate;
pub mod word_filter;

use super::protection_models::{MessageEvent, RuleCategory, Verdict};
use super::settings::ProtectionSettings;
use super::state_cache::TransientStateCache;
use super::warning_ledger::WarningLedger;
use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CheckerError {
    #[error("checker fault: {0}")]
    Internal(String),
}

/// Shared mutable state handed to every checker.
pub struct CheckContext<'a> {
    pub ledger: &'a WarningLedger,
    pub cache: &'a TransientStateCache,
    /// The evaluation's notion of "now" (the event timestamp), so window
    /// math is deterministic under test.
    pub now: DateTime<Utc>,
}

/// One policy evaluator. Implementations must not perform I/O; side
/// effects are the executor's job.
pub trait RuleChecker: Send + Sync {
    fn category(&self) -> RuleCategory;

    /// Whether this checker's category is switched on in the settings.
    fn is_enabled(&self, settings: &ProtectionSettings) -> bool;

    fn check(
        &self,
        event: &MessageEvent,
        settings: &ProtectionSettings,
        ctx: &CheckContext<'_>,
    ) -> Result<Verdict, CheckerError>;
}

/// The full checker set in pipeline priority order.
pub fn default_checkers() -> Vec<Box<dyn RuleChecker>> {
    vec![
        Box::new(bot_policy::BotPolicyChecker),
        Box::new(word_filter::WordFilterChecker),
        Box::new(link_filter::LinkFilterChecker),
        Box::new(moderation_gate::ModerationGateChecker),
        Box::new(flood::FloodChecker),
        Box::new(image_policy::ImagePolicyChecker),
        Box::new(channel_policy::ChannelPolicyChecker),
    ]
}
