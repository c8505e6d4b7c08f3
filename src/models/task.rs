use super::StockSource;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Created,
    Assigned,
    InProgress,
    Confirmed,
    Rejected,
}

impl TaskStatus {
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            TaskStatus::Created | TaskStatus::Assigned | TaskStatus::InProgress
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Created => "CREATED",
            TaskStatus::Assigned => "ASSIGNED",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Confirmed => "CONFIRMED",
            TaskStatus::Rejected => "REJECTED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    Confirmed,
    ConfirmedPartial,
    MergedPlan,
    StockRecovered,
    PlanAdjusted,
    RuleDeleted,
    SourceRemoved,
    ZoneDeleted,
    NonSalesReceivingFlow,
}

impl CloseReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            CloseReason::Confirmed => "confirmed",
            CloseReason::ConfirmedPartial => "confirmed_partial",
            CloseReason::MergedPlan => "merged_plan",
            CloseReason::StockRecovered => "stock_recovered",
            CloseReason::PlanAdjusted => "plan_adjusted",
            CloseReason::RuleDeleted => "rule_deleted",
            CloseReason::SourceRemoved => "source_removed",
            CloseReason::ZoneDeleted => "zone_deleted",
            CloseReason::NonSalesReceivingFlow => "non_sales_receiving_flow",
        }
    }
}

/// Potential origin for a task's movement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceCandidate {
    pub zone_id: String,
    /// Position in the destination's configured source list.
    pub sort_order: usize,
    pub available_qty: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplenishmentTask {
    pub id: Uuid,
    /// Creation sequence; creation-order walks sort on this, not on the
    /// (possibly equal) timestamps.
    pub seq: u64,
    pub rule_id: String,
    /// Destination zone.
    pub location_id: String,
    pub sku_id: String,
    pub source: StockSource,
    pub source_candidates: Vec<SourceCandidate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_zone_id: Option<String>,
    pub status: TaskStatus,
    /// Snapshot quantity that triggered the task.
    pub trigger_qty: i64,
    /// Quantity this task intends to move.
    pub deficit_qty: i64,
    /// Rule max at creation time.
    pub target_qty: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_staff_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmed_qty: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmed_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close_reason: Option<CloseReason>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Created,
    Assigned,
    Started,
    Confirmed,
    Closed,
    Cancelled,
}

/// One line of the per-task (or per-order) audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    /// Task or receiving-order id.
    pub subject_id: String,
    pub action: AuditAction,
    pub actor: String,
    pub details: String,
    pub recorded_at: DateTime<Utc>,
}
