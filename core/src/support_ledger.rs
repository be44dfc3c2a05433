//! SupportLedger: the citizen ↔ complaint support relation and the
//! derived per-complaint support count.
//!
//! The relation row and `complaint.support_count` change in the same
//! transaction, and the counter only moves when the insert or delete
//! actually changed a row. Two racing calls for the same pair therefore
//! serialize on the write lock and can never count twice.

use crate::{
    actor::Actor,
    complaint_store::{load, Complaint},
    error::{DeskError, DeskResult},
    event::DeskEvent,
    store::DeskStore,
    types::{now, ComplaintId, UserId},
};
use serde::{Deserialize, Serialize};

/// Outcome of a toggle or set: the caller's relation and the new count.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SupportState {
    pub supporting: bool,
    pub support_count: i64,
}

pub struct SupportLedger<'a> {
    store: &'a DeskStore,
}

impl<'a> SupportLedger<'a> {
    pub fn new(store: &'a DeskStore) -> Self {
        Self { store }
    }

    /// Flip the acting citizen's support. Removing is always allowed;
    /// adding requires a non-terminal complaint the citizen did not write.
    pub fn toggle(&self, complaint_id: ComplaintId, actor: &Actor) -> DeskResult<SupportState> {
        let user_id = actor.citizen()?;
        self.store.write_tx(|store| {
            let complaint = load(store, complaint_id)?;
            if store.delete_support(complaint_id, user_id)? {
                return commit_change(store, &complaint, user_id, false, -1);
            }
            add_support(store, &complaint, user_id)
        })
    }

    /// Idempotent explicit form: bring the relation to `desired`.
    pub fn set_support(
        &self,
        complaint_id: ComplaintId,
        actor: &Actor,
        desired: bool,
    ) -> DeskResult<SupportState> {
        let user_id = actor.citizen()?;
        self.store.write_tx(|store| {
            let complaint = load(store, complaint_id)?;
            if desired {
                if store.has_support(complaint_id, user_id)? {
                    log::debug!("user {user_id} already supports complaint {complaint_id}");
                    return Ok(SupportState {
                        supporting: true,
                        support_count: complaint.support_count,
                    });
                }
                add_support(store, &complaint, user_id)
            } else if store.delete_support(complaint_id, user_id)? {
                commit_change(store, &complaint, user_id, false, -1)
            } else {
                log::debug!("user {user_id} does not support complaint {complaint_id}");
                Ok(SupportState {
                    supporting: false,
                    support_count: complaint.support_count,
                })
            }
        })
    }

    pub fn support_count(&self, complaint_id: ComplaintId) -> DeskResult<i64> {
        Ok(load(self.store, complaint_id)?.support_count)
    }

    pub fn is_supporting(&self, complaint_id: ComplaintId, user_id: UserId) -> DeskResult<bool> {
        self.store.has_support(complaint_id, user_id)
    }

    /// Complaint ids the user currently supports, ascending.
    pub fn list_supported_by_user(&self, user_id: UserId) -> DeskResult<Vec<ComplaintId>> {
        self.store.supported_by_user(user_id)
    }
}

fn add_support(store: &DeskStore, complaint: &Complaint, user_id: UserId) -> DeskResult<SupportState> {
    if complaint.author_id == user_id {
        log::warn!("user {user_id} tried to support own complaint {}", complaint.id);
        return Err(DeskError::Forbidden(
            "authors cannot support their own complaint".into(),
        ));
    }
    if complaint.status.is_terminal() {
        log::warn!(
            "user {user_id} tried to support resolved complaint {} ({})",
            complaint.id,
            complaint.status
        );
        return Err(DeskError::Conflict("cannot support a resolved complaint".into()));
    }
    if !store.insert_support(complaint.id, user_id, now())? {
        // Unreachable under the write lock; report current state unchanged.
        return Ok(SupportState {
            supporting: true,
            support_count: complaint.support_count,
        });
    }
    commit_change(store, complaint, user_id, true, 1)
}

fn commit_change(
    store: &DeskStore,
    complaint: &Complaint,
    user_id: UserId,
    supporting: bool,
    delta: i64,
) -> DeskResult<SupportState> {
    let support_count = store.adjust_support_count(complaint.id, delta)?;
    store.append_event(
        &DeskEvent::SupportChanged {
            complaint_id: complaint.id,
            user_id,
            supporting,
            support_count,
        },
        now(),
    )?;
    log::info!(
        "user {user_id} {} complaint {} (count {support_count})",
        if supporting { "supports" } else { "withdrew support from" },
        complaint.id
    );
    Ok(SupportState {
        supporting,
        support_count,
    })
}
