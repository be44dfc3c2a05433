//! RatingLedger: at most one satisfaction rating per (complaint, citizen).
//!
//! Ratings are insert-only. The UNIQUE (complaint_id, user_id) constraint
//! decides races: of two concurrent submissions exactly one insert
//! succeeds and the other surfaces as Conflict. The municipality aggregate
//! is refreshed before the inserting transaction commits.

use crate::{
    actor::Actor,
    aggregate_rating::AggregateRatingService,
    complaint_store::load,
    config::DeskConfig,
    error::{is_unique_violation, DeskError, DeskResult},
    event::DeskEvent,
    store::DeskStore,
    types::{now, ComplaintId, MunicipalityId, Timestamp, UserId},
};
use serde::{Deserialize, Serialize};

pub const MIN_SCORE: i64 = 1;
pub const MAX_SCORE: i64 = 5;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Rating {
    pub id: i64,
    pub complaint_id: ComplaintId,
    pub user_id: UserId,
    pub municipality_id: MunicipalityId,
    #[serde(rename = "rating")]
    pub score: u8,
    pub comment: Option<String>,
    pub created_at: Timestamp,
}

pub struct RatingLedger<'a> {
    store: &'a DeskStore,
    config: &'a DeskConfig,
}

impl<'a> RatingLedger<'a> {
    pub fn new(store: &'a DeskStore, config: &'a DeskConfig) -> Self {
        Self { store, config }
    }

    /// Rate the acting citizen's own resolved complaint.
    ///
    /// Failure order: NotFound (no complaint), Forbidden (not the author),
    /// Conflict (not Completed/Cancelled), Validation (score or comment),
    /// Conflict (already rated).
    pub fn submit(
        &self,
        complaint_id: ComplaintId,
        actor: &Actor,
        score: i64,
        comment: Option<&str>,
    ) -> DeskResult<Rating> {
        let user_id = actor.citizen()?;
        let comment = comment.map(str::trim).filter(|c| !c.is_empty());

        let rating = self.store.write_tx(|store| {
            let complaint = load(store, complaint_id)?;
            if complaint.author_id != user_id {
                return Err(DeskError::Forbidden(
                    "only the author may rate a complaint".into(),
                ));
            }
            if !complaint.status.is_terminal() {
                return Err(DeskError::Conflict(format!(
                    "complaint can only be rated once completed or cancelled (currently {})",
                    complaint.status
                )));
            }
            let score = validate_score(score)?;
            if let Some(text) = comment {
                if text.chars().count() > self.config.max_comment_chars {
                    return Err(DeskError::Validation(format!(
                        "comment exceeds {} characters",
                        self.config.max_comment_chars
                    )));
                }
            }

            let at = now();
            let inserted = store.insert_rating(
                complaint_id,
                user_id,
                complaint.municipality_id,
                score,
                comment,
                at,
            );
            match inserted {
                Ok(_) => {}
                Err(DeskError::Database(ref e)) if is_unique_violation(e) => {
                    log::warn!("duplicate rating for complaint {complaint_id} by user {user_id}");
                    return Err(DeskError::Conflict("complaint has already been rated".into()));
                }
                Err(e) => return Err(e),
            }

            AggregateRatingService::new(store).refresh(complaint.municipality_id, at)?;
            store.append_event(
                &DeskEvent::RatingSubmitted {
                    complaint_id,
                    user_id,
                    municipality_id: complaint.municipality_id,
                    score,
                },
                at,
            )?;
            store
                .get_rating(complaint_id, user_id)?
                .ok_or(DeskError::NotFound { entity: "rating", id: complaint_id })
        })?;

        log::info!(
            "user {user_id} rated complaint {complaint_id} {}/5 (municipality {})",
            rating.score,
            rating.municipality_id
        );
        Ok(rating)
    }

    /// The rating `user_id` left on the complaint, if any.
    pub fn get(&self, complaint_id: ComplaintId, user_id: UserId) -> DeskResult<Option<Rating>> {
        self.store.get_rating(complaint_id, user_id)
    }

    pub fn get_by_complaint(&self, complaint_id: ComplaintId) -> DeskResult<Option<Rating>> {
        self.store.rating_for_complaint(complaint_id)
    }
}

fn validate_score(score: i64) -> DeskResult<u8> {
    if !(MIN_SCORE..=MAX_SCORE).contains(&score) {
        return Err(DeskError::Validation(format!(
            "rating must be an integer between {MIN_SCORE} and {MAX_SCORE}, got {score}"
        )));
    }
    Ok(score as u8)
}
