//! Municipality registry: the set of bodies complaints can be filed against.

use crate::{
    aggregate_rating::RatingAggregate,
    error::{is_unique_violation, DeskError, DeskResult},
    store::DeskStore,
    types::{now, MunicipalityId, Timestamp},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Municipality {
    pub id: MunicipalityId,
    pub name: String,
    pub created_at: Timestamp,
}

/// Registry row as listed to citizens. Rating fields are absent until the
/// municipality has been rated at least once.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MunicipalitySummary {
    pub id: MunicipalityId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_ratings: Option<i64>,
}

/// Profile view for municipal staff.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MunicipalityProfile {
    #[serde(flatten)]
    pub municipality: Municipality,
    #[serde(flatten)]
    pub rating: RatingAggregate,
}

pub struct MunicipalityRegistry<'a> {
    store: &'a DeskStore,
}

impl<'a> MunicipalityRegistry<'a> {
    pub fn new(store: &'a DeskStore) -> Self {
        Self { store }
    }

    pub fn register(&self, name: &str) -> DeskResult<Municipality> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DeskError::Validation("municipality name must not be empty".into()));
        }
        let municipality = self.store.write_tx(|store| {
            let id = match store.insert_municipality(name, now()) {
                Ok(id) => id,
                Err(DeskError::Database(ref e)) if is_unique_violation(e) => {
                    return Err(DeskError::Conflict(format!(
                        "municipality '{name}' is already registered"
                    )));
                }
                Err(e) => return Err(e),
            };
            store
                .get_municipality(id)?
                .ok_or(DeskError::NotFound { entity: "municipality", id })
        })?;
        log::info!("registered municipality {} '{}'", municipality.id, municipality.name);
        Ok(municipality)
    }

    /// Register `name` unless it already exists. Used for config seeding.
    pub fn ensure(&self, name: &str) -> DeskResult<Municipality> {
        match self.store.municipality_by_name(name.trim())? {
            Some(existing) => Ok(existing),
            None => match self.register(name) {
                // Another session registered it between the lookup and insert.
                Err(DeskError::Conflict(_)) => self
                    .store
                    .municipality_by_name(name.trim())?
                    .ok_or_else(|| DeskError::Conflict(format!("municipality '{name}' vanished"))),
                other => other,
            },
        }
    }

    pub fn get(&self, id: MunicipalityId) -> DeskResult<Municipality> {
        self.store
            .get_municipality(id)?
            .ok_or(DeskError::NotFound { entity: "municipality", id })
    }

    pub fn list(&self) -> DeskResult<Vec<MunicipalitySummary>> {
        self.store.municipality_summaries()
    }
}
