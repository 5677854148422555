// Pipeline orchestrator - runs the enabled rule checkers in priority
// order over one inbound message and applies the first blocking verdict.
//
// Errors never leave this component: a missing configuration means pass,
// a faulty checker is skipped (fail-open), and punishment failures come
// back inside the Outcome.

use super::checkers::{default_checkers, CheckContext, RuleChecker};
use super::executor::{PlatformClient, PunishmentExecutor};
use super::protection_models::{MessageEvent, Outcome, Verdict};
use super::settings::{ProtectionSettings, SettingsError, SettingsStore};
use super::state_cache::TransientStateCache;
use super::warning_ledger::WarningLedger;
use crate::core::protection::protection_models::RuleCategory;
use std::sync::Arc;

pub struct ProtectionService<S: SettingsStore, P: PlatformClient> {
    store: S,
    executor: PunishmentExecutor<P>,
    ledger: Arc<WarningLedger>,
    cache: Arc<TransientStateCache>,
    checkers: Vec<Box<dyn RuleChecker>>,
}

impl<S: SettingsStore, P: PlatformClient> ProtectionService<S, P> {
    pub fn new(
        store: S,
        executor: PunishmentExecutor<P>,
        ledger: Arc<WarningLedger>,
        cache: Arc<TransientStateCache>,
    ) -> Self {
        Self {
            store,
            executor,
            ledger,
            cache,
            checkers: default_checkers(),
        }
    }

    /// Swap in a custom checker set. Used by tests to inject faulty rules.
    #[cfg(test)]
    pub fn with_checkers(mut self, checkers: Vec<Box<dyn RuleChecker>>) -> Self {
        self.checkers = checkers;
        self
    }

    /// Evaluate one inbound message against the guild's protection rules.
    pub async fn evaluate(&self, event: &MessageEvent) -> Outcome {
        let settings = match self.store.get_settings(event.guild_id).await {
            Ok(Some(settings)) => settings,
            Ok(None) => return Outcome::pass(),
            Err(e) => {
                // A broken settings read must not block traffic.
                tracing::warn!(guild_id = event.guild_id, error = %e, "Settings load failed; passing message through");
                return Outcome::pass();
            }
        };

        if !settings.enabled {
            return Outcome::pass();
        }

        // One history record per event, shared by the flood and repeat
        // checks. Image posts stay out of the textual history.
        if event.has_text() && !event.has_image() {
            self.cache.record(event);
        }

        let ctx = CheckContext {
            ledger: &self.ledger,
            cache: &self.cache,
            now: event.timestamp,
        };

        let mut advisories = Vec::new();
        for checker in &self.checkers {
            if !checker.is_enabled(&settings) {
                continue;
            }

            match checker.check(event, &settings, &ctx) {
                Ok(Verdict::Pass) => {}
                Ok(Verdict::Advise { category, notice }) => {
                    tracing::info!(
                        guild_id = event.guild_id,
                        user_id = event.author_id,
                        category = %category,
                        "First offense; advising without enforcement"
                    );
                    self.executor.post_advisory(event, &notice).await;
                    advisories.push(notice);
                }
                Ok(Verdict::Block(infraction)) => {
                    tracing::info!(
                        guild_id = event.guild_id,
                        user_id = event.author_id,
                        category = %infraction.category,
                        action = %infraction.action,
                        reason = %infraction.reason,
                        "Rule violation"
                    );
                    let punishment = self.executor.execute(event, &infraction).await;
                    if !punishment.success {
                        tracing::warn!(
                            guild_id = event.guild_id,
                            user_id = event.author_id,
                            description = %punishment.description,
                            "Punishment degraded or failed"
                        );
                    }
                    return Outcome {
                        verdict: Verdict::Block(infraction),
                        punishment: Some(punishment),
                        advisories,
                    };
                }
                Err(e) => {
                    // Fail-open: one broken rule must never block traffic.
                    tracing::error!(
                        category = %checker.category(),
                        error = %e,
                        "Rule checker failed; skipping it"
                    );
                }
            }
        }

        Outcome {
            verdict: Verdict::Pass,
            punishment: None,
            advisories,
        }
    }

    /// Current settings for a guild (command surface).
    pub async fn get_settings(
        &self,
        guild_id: u64,
    ) -> Result<Option<ProtectionSettings>, SettingsError> {
        self.store.get_settings(guild_id).await
    }

    /// Persist settings for a guild after validating them.
    pub async fn save_settings(
        &self,
        guild_id: u64,
        settings: ProtectionSettings,
    ) -> Result<(), SettingsError> {
        settings.validate()?;
        self.store.save_settings(guild_id, settings).await
    }

    /// Flip the master switch, creating default settings if needed.
    pub async fn set_enabled(&self, guild_id: u64, enabled: bool) -> Result<(), SettingsError> {
        let mut settings = self
            .store
            .get_settings(guild_id)
            .await?
            .unwrap_or_default();
        settings.enabled = enabled;
        self.store.save_settings(guild_id, settings).await
    }

    /// Administrative warning reset for one user.
    pub fn reset_warnings(&self, guild_id: u64, user_id: u64, category: Option<RuleCategory>) -> usize {
        self.ledger.reset(guild_id, user_id, category)
    }

    /// Offense count lookup (command surface).
    pub fn warning_count(&self, guild_id: u64, user_id: u64, category: RuleCategory) -> u32 {
        self.ledger.count(guild_id, user_id, category)
    }

    pub fn cache(&self) -> &Arc<TransientStateCache> {
        &self.cache
    }
}
