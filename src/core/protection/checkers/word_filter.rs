// Prohibited-words checker: case-insensitive substring match over the
// configured word list.

use super::{CheckContext, CheckerError, RuleChecker};
use crate::core::protection::protection_models::{
    Infraction, MessageEvent, RuleCategory, Verdict,
};
use crate::core::protection::settings::ProtectionSettings;

pub struct WordFilterChecker;

impl RuleChecker for WordFilterChecker {
    fn category(&self) -> RuleCategory {
        RuleCategory::ProhibitedWords
    }

    fn is_enabled(&self, settings: &ProtectionSettings) -> bool {
        settings.prohibited_words.enabled
    }

    fn check(
        &self,
        event: &MessageEvent,
        settings: &ProtectionSettings,
        _ctx: &CheckContext<'_>,
    ) -> Result<Verdict, CheckerError> {
        let cfg = &settings.prohibited_words;

        // Channel scope: with any scope list configured, only channels in
        // the union of the two lists are checked.
        let scoped = !cfg.attachment_channels.is_empty() || !cfg.command_channels.is_empty();
        if scoped
            && !cfg.attachment_channels.contains(&event.channel_id)
            && !cfg.command_channels.contains(&event.channel_id)
        {
            return Ok(Verdict::Pass);
        }

        let lowered = event.content.to_lowercase();
        let matched: Vec<&str> = cfg
            .words
            .iter()
            .filter(|w| !w.is_empty() && lowered.contains(&w.to_lowercase()))
            .map(String::as_str)
            .collect();

        if matched.is_empty() {
            return Ok(Verdict::Pass);
        }

        let mut action = cfg.punishment;
        if action.is_severe() && cfg.severe_whitelist.contains(&event.channel_id) {
            action = crate::core::protection::protection_models::RuleAction::Delete;
        }

        Ok(Verdict::Block(Infraction::new(
            RuleCategory::ProhibitedWords,
            action,
            format!("prohibited words: {}", matched.join(", ")),
        )))
    }
}
