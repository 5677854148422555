// Destination-content policy checker: what kinds of content each channel
// accepts. Violations delete the message with a category-specific reason.

use super::{CheckContext, CheckerError, RuleChecker};
use crate::core::protection::protection_models::{
    Infraction, MessageEvent, RuleAction, RuleCategory, Verdict,
};
use crate::core::protection::settings::{ChannelPolicyMode, ProtectionSettings};

pub struct ChannelPolicyChecker;

impl RuleChecker for ChannelPolicyChecker {
    fn category(&self) -> RuleCategory {
        RuleCategory::ChannelPolicy
    }

    fn is_enabled(&self, settings: &ProtectionSettings) -> bool {
        settings.channel_policy.enabled
    }

    fn check(
        &self,
        event: &MessageEvent,
        settings: &ProtectionSettings,
        _ctx: &CheckContext<'_>,
    ) -> Result<Verdict, CheckerError> {
        let cfg = &settings.channel_policy;
        let listed = cfg.channels.contains(&event.channel_id);

        let reason: Option<&str> = match cfg.mode {
            ChannelPolicyMode::AllowAll => {
                match cfg.overrides.get(&event.channel_id) {
                    Some(rules) => {
                        // Commands are checked before plain text since a
                        // command is also text.
                        if event.has_image() && !rules.allow_images {
                            Some("images are not accepted in this channel")
                        } else if event.has_file() && !rules.allow_files {
                            Some("file uploads are not accepted in this channel")
                        } else if event.is_command() && !rules.allow_commands {
                            Some("bot commands are not accepted in this channel")
                        } else if event.has_text() && !event.is_command() && !rules.allow_text {
                            Some("text messages are not accepted in this channel")
                        } else {
                            None
                        }
                    }
                    None => None,
                }
            }
            ChannelPolicyMode::BlockAll | ChannelPolicyMode::Whitelist => {
                if listed {
                    None
                } else {
                    Some("this channel does not accept messages")
                }
            }
            ChannelPolicyMode::Blacklist => {
                if listed {
                    Some("this channel does not accept messages")
                } else {
                    None
                }
            }
        };

        match reason {
            None => Ok(Verdict::Pass),
            Some(reason) => Ok(Verdict::Block(
                Infraction::new(RuleCategory::ChannelPolicy, RuleAction::Delete, reason)
                    .with_notice(format!("{}, {}.", event.author_name, reason)),
            )),
        }
    }
}
