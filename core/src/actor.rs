//! Request-scoped actor context.
//!
//! Every mutating operation receives the identity it acts for. There is no
//! ambient session state anywhere in the crate.

use crate::error::{DeskError, DeskResult};
use crate::types::{MunicipalityId, UserId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Actor {
    Citizen(UserId),
    Municipality(MunicipalityId),
}

impl Actor {
    /// The citizen id, or Unauthenticated if the actor is municipal staff.
    pub fn citizen(&self) -> DeskResult<UserId> {
        match self {
            Actor::Citizen(id) => Ok(*id),
            Actor::Municipality(_) => Err(DeskError::Unauthenticated(
                "this action requires a citizen session".into(),
            )),
        }
    }

    /// The municipality id, or Unauthenticated if the actor is a citizen.
    pub fn municipality(&self) -> DeskResult<MunicipalityId> {
        match self {
            Actor::Municipality(id) => Ok(*id),
            Actor::Citizen(_) => Err(DeskError::Unauthenticated(
                "this action requires a municipality session".into(),
            )),
        }
    }
}
