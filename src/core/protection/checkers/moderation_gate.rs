// Generic moderation gate: channels under lockdown reject all traffic.

use super::{CheckContext, CheckerError, RuleChecker};
use crate::core::protection::protection_models::{
    Infraction, MessageEvent, RuleAction, RuleCategory, Verdict,
};
use crate::core::protection::settings::ProtectionSettings;

pub struct ModerationGateChecker;

impl RuleChecker for ModerationGateChecker {
    fn category(&self) -> RuleCategory {
        RuleCategory::ModerationGate
    }

    fn is_enabled(&self, settings: &ProtectionSettings) -> bool {
        settings.moderation_gate.enabled
    }

    fn check(
        &self,
        event: &MessageEvent,
        settings: &ProtectionSettings,
        _ctx: &CheckContext<'_>,
    ) -> Result<Verdict, CheckerError> {
        let cfg = &settings.moderation_gate;
        if !cfg.locked_channels.contains(&event.channel_id) {
            return Ok(Verdict::Pass);
        }

        Ok(Verdict::Block(
            Infraction::new(
                RuleCategory::ModerationGate,
                RuleAction::Delete,
                format!("channel #{} is under moderation", event.channel_name),
            )
            .with_notice(format!(
                "{}, #{} is currently locked by the moderators.",
                event.author_name, event.channel_name
            )),
        ))
    }
}
