//! The activity log.
//!
//! RULE: every committed mutation appends exactly one DeskEvent, inside the
//! same transaction as the mutation. The log is append-only and outlives the
//! complaint it describes.

use crate::status::ComplaintStatus;
use crate::types::{ComplaintId, MunicipalityId, Timestamp, UserId};
use serde::{Deserialize, Serialize};

/// Variants are added over time and are never removed or reordered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeskEvent {
    ComplaintFiled {
        complaint_id: ComplaintId,
        author_id: UserId,
        municipality_id: MunicipalityId,
    },
    StatusChanged {
        complaint_id: ComplaintId,
        municipality_id: MunicipalityId,
        from: ComplaintStatus,
        to: ComplaintStatus,
        feedback_changed: bool,
    },
    SupportChanged {
        complaint_id: ComplaintId,
        user_id: UserId,
        supporting: bool,
        support_count: i64,
    },
    RatingSubmitted {
        complaint_id: ComplaintId,
        user_id: UserId,
        municipality_id: MunicipalityId,
        score: u8,
    },
    ComplaintDeleted {
        complaint_id: ComplaintId,
        author_id: UserId,
        supports_removed: usize,
        ratings_removed: usize,
    },
}

impl DeskEvent {
    pub fn complaint_id(&self) -> ComplaintId {
        match self {
            DeskEvent::ComplaintFiled { complaint_id, .. }
            | DeskEvent::StatusChanged { complaint_id, .. }
            | DeskEvent::SupportChanged { complaint_id, .. }
            | DeskEvent::RatingSubmitted { complaint_id, .. }
            | DeskEvent::ComplaintDeleted { complaint_id, .. } => *complaint_id,
        }
    }

    /// Stable name stored in the event_type column.
    pub fn type_name(&self) -> &'static str {
        match self {
            DeskEvent::ComplaintFiled { .. } => "complaint_filed",
            DeskEvent::StatusChanged { .. } => "status_changed",
            DeskEvent::SupportChanged { .. } => "support_changed",
            DeskEvent::RatingSubmitted { .. } => "rating_submitted",
            DeskEvent::ComplaintDeleted { .. } => "complaint_deleted",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id: i64,
    pub created_at: Timestamp,
    pub event: DeskEvent,
}
