//! AggregateRatingService: per-municipality mean rating and count.
//!
//! The stored (sum, count) row is rewritten from the full rating set by
//! `refresh`, which always runs inside the transaction that inserted or
//! removed ratings. A read immediately after a committed rating therefore
//! sees it; nothing is ever corrected on the read path.

use crate::{
    error::{DeskError, DeskResult},
    store::DeskStore,
    types::{now, MunicipalityId, Timestamp},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RatingAggregate {
    #[serde(rename = "averageRating")]
    pub average: f64,
    #[serde(rename = "totalRatings")]
    pub count: i64,
}

impl RatingAggregate {
    pub const EMPTY: RatingAggregate = RatingAggregate { average: 0.0, count: 0 };

    fn from_totals(score_sum: i64, count: i64) -> Self {
        if count == 0 {
            return Self::EMPTY;
        }
        Self {
            average: score_sum as f64 / count as f64,
            count,
        }
    }
}

pub struct AggregateRatingService<'a> {
    store: &'a DeskStore,
}

impl<'a> AggregateRatingService<'a> {
    pub fn new(store: &'a DeskStore) -> Self {
        Self { store }
    }

    /// Recompute from every rating row in its own transaction.
    pub fn recompute(&self, municipality_id: MunicipalityId) -> DeskResult<RatingAggregate> {
        self.store.write_tx(|store| {
            require_municipality(store, municipality_id)?;
            AggregateRatingService::new(store).refresh(municipality_id, now())
        })
    }

    /// Recompute inside a transaction the caller already holds.
    pub(crate) fn refresh(
        &self,
        municipality_id: MunicipalityId,
        at: Timestamp,
    ) -> DeskResult<RatingAggregate> {
        let (score_sum, count) = self.store.rating_totals(municipality_id)?;
        self.store
            .save_rating_aggregate(municipality_id, score_sum, count, at)?;
        let aggregate = RatingAggregate::from_totals(score_sum, count);
        log::debug!(
            "municipality {municipality_id} aggregate: {:.2} over {} ratings",
            aggregate.average,
            aggregate.count
        );
        Ok(aggregate)
    }

    /// Average 0 and count 0 until the first rating arrives.
    pub fn get(&self, municipality_id: MunicipalityId) -> DeskResult<RatingAggregate> {
        require_municipality(self.store, municipality_id)?;
        Ok(match self.store.rating_aggregate(municipality_id)? {
            Some((score_sum, count)) => RatingAggregate::from_totals(score_sum, count),
            None => RatingAggregate::EMPTY,
        })
    }
}

fn require_municipality(store: &DeskStore, municipality_id: MunicipalityId) -> DeskResult<()> {
    if store.municipality_exists(municipality_id)? {
        Ok(())
    } else {
        Err(DeskError::NotFound {
            entity: "municipality",
            id: municipality_id,
        })
    }
}
