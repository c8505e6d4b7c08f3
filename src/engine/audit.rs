use crate::models::{AuditAction, AuditEntry};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Append-only audit trail over task and receiving-order transitions.
#[derive(Debug, Default)]
pub struct AuditLog {
    entries: Vec<AuditEntry>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &mut self,
        subject_id: impl Into<String>,
        action: AuditAction,
        actor: impl Into<String>,
        details: impl Into<String>,
        at: DateTime<Utc>,
    ) {
        self.entries.push(AuditEntry {
            id: Uuid::new_v4(),
            subject_id: subject_id.into(),
            action,
            actor: actor.into(),
            details: details.into(),
            recorded_at: at,
        });
    }

    pub fn for_subject(&self, subject_id: &str) -> Vec<AuditEntry> {
        self.entries
            .iter()
            .filter(|e| e.subject_id == subject_id)
            .cloned()
            .collect()
    }

    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn entries_filter_by_subject() {
        let mut log = AuditLog::new();
        let at = Utc.timestamp_opt(0, 0).unwrap();
        log.record("task-1", AuditAction::Created, "planner", "created", at);
        log.record("task-2", AuditAction::Created, "planner", "created", at);
        log.record("task-1", AuditAction::Assigned, "auto-assigner", "assigned", at);
        assert_eq!(log.for_subject("task-1").len(), 2);
        assert_eq!(log.entries().len(), 3);
    }
}
