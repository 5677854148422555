// Image/attachment policy checker: a mode-selectable matrix over six
// modes, each combined with a channel list.

use super::{CheckContext, CheckerError, RuleChecker};
use crate::core::protection::protection_models::{
    Infraction, MessageEvent, RuleAction, RuleCategory, Verdict,
};
use crate::core::protection::settings::{ImagePolicyMode, ProtectionSettings};

pub struct ImagePolicyChecker;

impl RuleChecker for ImagePolicyChecker {
    fn category(&self) -> RuleCategory {
        RuleCategory::ImagePolicy
    }

    fn is_enabled(&self, settings: &ProtectionSettings) -> bool {
        settings.image_policy.enabled
    }

    fn check(
        &self,
        event: &MessageEvent,
        settings: &ProtectionSettings,
        _ctx: &CheckContext<'_>,
    ) -> Result<Verdict, CheckerError> {
        let cfg = &settings.image_policy;

        if !event.has_image() {
            return Ok(Verdict::Pass);
        }

        let listed = !cfg.channels.is_empty() && cfg.channels.contains(&event.channel_id);

        let (blocked, reason) = match cfg.mode {
            // Channel list is an exception list: block only inside it.
            ImagePolicyMode::AllowAll => (listed, "images are not allowed in this channel"),
            // Block everywhere except the listed channels.
            ImagePolicyMode::BlockAll | ImagePolicyMode::Whitelist => {
                (!listed, "images are only allowed in designated channels")
            }
            // Block only inside the listed channels; no list means allow.
            ImagePolicyMode::Blacklist => (listed, "images are not allowed in this channel"),
            // Within listed channels, image-only posts need accompanying text.
            ImagePolicyMode::TextRequired | ImagePolicyMode::TextWhitelist => (
                listed && !event.has_text(),
                "image posts in this channel must include a text description",
            ),
        };

        if !blocked {
            return Ok(Verdict::Pass);
        }

        Ok(Verdict::Block(
            Infraction::new(RuleCategory::ImagePolicy, RuleAction::Delete, reason)
                .with_notice(format!("{}, {}.", event.author_name, reason)),
        ))
    }
}
