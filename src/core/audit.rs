// Audit collaborator - human-facing notification of enforcement actions.
//
// Purely informational: the pipeline is correct whether or not anyone
// listens. The default sink just writes structured log lines.

use crate::core::protection::{RuleAction, RuleCategory};
use async_trait::async_trait;

/// One enforcement action, described for humans.
#[derive(Debug, Clone)]
pub struct AuditRecord {
    pub guild_id: u64,
    pub channel_id: u64,
    pub category: RuleCategory,
    pub action: RuleAction,
    pub target_id: u64,
    pub target_name: String,
    pub success: bool,
    pub description: String,
}

#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn enforcement(&self, record: AuditRecord);
}

/// Default sink: structured tracing output.
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn enforcement(&self, record: AuditRecord) {
        tracing::info!(
            guild_id = record.guild_id,
            channel_id = record.channel_id,
            category = %record.category,
            action = %record.action,
            target_id = record.target_id,
            target_name = %record.target_name,
            success = record.success,
            description = %record.description,
            "Enforcement action"
        );
    }
}
