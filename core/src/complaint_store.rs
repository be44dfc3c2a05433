//! ComplaintStore: owns complaint records and their lifecycle status.
//!
//! Status transitions are unrestricted among the four states; the only
//! guard is that the acting municipality owns the complaint. Entering a
//! terminal state opens rating and closes support; leaving one reopens
//! support and leaves any recorded rating in place.

use crate::{
    actor::Actor,
    aggregate_rating::AggregateRatingService,
    config::DeskConfig,
    error::{DeskError, DeskResult},
    event::DeskEvent,
    status::ComplaintStatus,
    store::DeskStore,
    types::{now, ComplaintId, MunicipalityId, Timestamp, UserId},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Complaint {
    pub id: ComplaintId,
    #[serde(rename = "user_id")]
    pub author_id: UserId,
    pub municipality_id: MunicipalityId,
    #[serde(rename = "complaint_text")]
    pub text: String,
    pub status: ComplaintStatus,
    pub feedback: Option<String>,
    pub support_count: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

pub struct ComplaintStore<'a> {
    store: &'a DeskStore,
    config: &'a DeskConfig,
}

impl<'a> ComplaintStore<'a> {
    pub fn new(store: &'a DeskStore, config: &'a DeskConfig) -> Self {
        Self { store, config }
    }

    /// File a new complaint as the acting citizen. Starts Pending with no
    /// support.
    pub fn create(
        &self,
        actor: &Actor,
        municipality_id: MunicipalityId,
        text: &str,
    ) -> DeskResult<Complaint> {
        let author_id = actor.citizen()?;
        let text = text.trim();
        if text.is_empty() {
            return Err(DeskError::Validation("complaint text must not be empty".into()));
        }
        if text.chars().count() > self.config.max_complaint_chars {
            return Err(DeskError::Validation(format!(
                "complaint text exceeds {} characters",
                self.config.max_complaint_chars
            )));
        }

        let complaint = self.store.write_tx(|store| {
            if !store.municipality_exists(municipality_id)? {
                return Err(DeskError::Validation(format!(
                    "municipality {municipality_id} does not exist"
                )));
            }
            let at = now();
            let id = store.insert_complaint(author_id, municipality_id, text, at)?;
            store.append_event(
                &DeskEvent::ComplaintFiled {
                    complaint_id: id,
                    author_id,
                    municipality_id,
                },
                at,
            )?;
            load(store, id)
        })?;

        log::info!(
            "complaint {} filed by user {author_id} against municipality {municipality_id}",
            complaint.id
        );
        Ok(complaint)
    }

    /// Move a complaint to `new_status` as its owning municipality.
    ///
    /// `feedback`: None keeps the current text, Some("") clears it, anything
    /// else replaces it.
    pub fn set_status(
        &self,
        complaint_id: ComplaintId,
        actor: &Actor,
        new_status: ComplaintStatus,
        feedback: Option<&str>,
    ) -> DeskResult<Complaint> {
        let acting_municipality = actor.municipality()?;

        let (before, after) = self.store.write_tx(|store| {
            let before = load(store, complaint_id)?;
            if before.municipality_id != acting_municipality {
                return Err(DeskError::Forbidden(
                    "complaint belongs to another municipality".into(),
                ));
            }
            let feedback = match feedback.map(str::trim) {
                None => before.feedback.clone(),
                Some("") => None,
                Some(text) => Some(text.to_string()),
            };
            let at = now();
            store.update_complaint_status(complaint_id, new_status, feedback.as_deref(), at)?;
            store.append_event(
                &DeskEvent::StatusChanged {
                    complaint_id,
                    municipality_id: acting_municipality,
                    from: before.status,
                    to: new_status,
                    feedback_changed: feedback != before.feedback,
                },
                at,
            )?;
            let after = load(store, complaint_id)?;
            Ok((before, after))
        })?;

        log::info!(
            "complaint {complaint_id} status {} -> {} by municipality {acting_municipality}",
            before.status,
            after.status
        );
        if before.status.is_terminal() && !after.status.is_terminal() {
            log::debug!("complaint {complaint_id} reopened; support is available again");
        }
        Ok(after)
    }

    /// Delete a complaint as its author, removing every support row and
    /// rating that references it in the same transaction.
    pub fn delete(&self, complaint_id: ComplaintId, actor: &Actor) -> DeskResult<()> {
        let user_id = actor.citizen()?;

        let (supports_removed, ratings_removed) = self.store.write_tx(|store| {
            let complaint = load(store, complaint_id)?;
            if complaint.author_id != user_id {
                return Err(DeskError::Forbidden(
                    "only the author may delete a complaint".into(),
                ));
            }
            let rated = store.rated_municipalities_for_complaint(complaint_id)?;
            let supports_removed = store.delete_supports_for_complaint(complaint_id)?;
            let ratings_removed = store.delete_ratings_for_complaint(complaint_id)?;
            store.delete_complaint_row(complaint_id)?;

            let at = now();
            let aggregates = AggregateRatingService::new(store);
            for municipality_id in rated {
                aggregates.refresh(municipality_id, at)?;
            }
            store.append_event(
                &DeskEvent::ComplaintDeleted {
                    complaint_id,
                    author_id: user_id,
                    supports_removed,
                    ratings_removed,
                },
                at,
            )?;
            Ok((supports_removed, ratings_removed))
        })?;

        log::info!(
            "complaint {complaint_id} deleted by author {user_id} \
             ({supports_removed} supports, {ratings_removed} ratings removed)"
        );
        Ok(())
    }

    pub fn get(&self, complaint_id: ComplaintId) -> DeskResult<Complaint> {
        load(self.store, complaint_id)
    }

    pub fn list_by_author(&self, user_id: UserId) -> DeskResult<Vec<Complaint>> {
        self.store.complaints_by_author(user_id)
    }

    /// Public feed. With a viewer, that viewer's own complaints are left out.
    pub fn list_all(&self, excluding_author: Option<UserId>) -> DeskResult<Vec<Complaint>> {
        self.store.all_complaints(excluding_author)
    }

    /// Staff dashboard: every complaint filed against the acting municipality.
    pub fn list_by_municipality(&self, actor: &Actor) -> DeskResult<Vec<Complaint>> {
        let municipality_id = actor.municipality()?;
        self.store.complaints_by_municipality(municipality_id, false)
    }

    /// Public municipality page: resolved (terminal) complaints only.
    pub fn list_resolved_by_municipality(
        &self,
        municipality_id: MunicipalityId,
    ) -> DeskResult<Vec<Complaint>> {
        if !self.store.municipality_exists(municipality_id)? {
            return Err(DeskError::NotFound {
                entity: "municipality",
                id: municipality_id,
            });
        }
        self.store.complaints_by_municipality(municipality_id, true)
    }
}

/// Fetch a complaint or fail NotFound.
pub(crate) fn load(store: &DeskStore, complaint_id: ComplaintId) -> DeskResult<Complaint> {
    store
        .get_complaint(complaint_id)?
        .ok_or(DeskError::NotFound {
            entity: "complaint",
            id: complaint_id,
        })
}
