//! The complaint desk is one session's view of the four components.
//!
//! RULES:
//!   - Components never hold state of their own; everything lives in the store.
//!   - Every mutation is one IMMEDIATE transaction that also updates the
//!     derived state it affects (support count, municipality aggregate) and
//!     appends its activity-log event.
//!   - Each concurrent session opens its own desk via `session()`.

use crate::{
    aggregate_rating::AggregateRatingService,
    complaint_store::ComplaintStore,
    config::DeskConfig,
    error::DeskResult,
    event::EventLogEntry,
    municipality_registry::MunicipalityRegistry,
    rating_ledger::RatingLedger,
    store::DeskStore,
    support_ledger::SupportLedger,
    types::{ComplaintId, MunicipalityId},
};
use serde::Serialize;
use std::time::Duration;

pub struct ComplaintDesk {
    pub config: DeskConfig,
    store: DeskStore,
}

/// Result of re-deriving the support and aggregate invariants from source rows.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ConsistencyReport {
    /// (complaint_id, stored support_count, live support rows)
    pub support_mismatches: Vec<(ComplaintId, i64, i64)>,
    /// (municipality_id, stored (sum, count), live (sum, count))
    pub aggregate_mismatches: Vec<(MunicipalityId, (i64, i64), (i64, i64))>,
}

impl ConsistencyReport {
    pub fn is_consistent(&self) -> bool {
        self.support_mismatches.is_empty() && self.aggregate_mismatches.is_empty()
    }
}

impl ComplaintDesk {
    /// Wrap an already-migrated store.
    pub fn new(store: DeskStore, config: DeskConfig) -> Self {
        Self { config, store }
    }

    /// Migrate the store and seed the configured municipalities.
    /// Call this instead of new() for a fresh database.
    pub fn build(store: DeskStore, config: DeskConfig) -> DeskResult<Self> {
        store.migrate()?;
        let desk = Self::new(store, config);
        let registry = desk.municipalities();
        for name in &desk.config.municipalities {
            registry.ensure(name)?;
        }
        Ok(desk)
    }

    pub fn open(path: &str, config: DeskConfig) -> DeskResult<Self> {
        let timeout = Duration::from_millis(config.busy_timeout_ms);
        Self::build(DeskStore::open_with_timeout(path, timeout)?, config)
    }

    /// In-memory desk with the test config (two seeded municipalities).
    pub fn build_test() -> DeskResult<Self> {
        Self::build(DeskStore::in_memory()?, DeskConfig::default_test())
    }

    /// A second desk on its own connection to the same database file.
    /// An in-memory desk has nothing to share: the session gets a fresh,
    /// empty database with no seeded municipalities.
    pub fn session(&self) -> DeskResult<Self> {
        let store = self.store.reopen()?;
        store.migrate()?;
        Ok(Self::new(store, self.config.clone()))
    }

    pub fn complaints(&self) -> ComplaintStore<'_> {
        ComplaintStore::new(&self.store, &self.config)
    }

    pub fn supports(&self) -> SupportLedger<'_> {
        SupportLedger::new(&self.store)
    }

    pub fn ratings(&self) -> RatingLedger<'_> {
        RatingLedger::new(&self.store, &self.config)
    }

    pub fn aggregates(&self) -> AggregateRatingService<'_> {
        AggregateRatingService::new(&self.store)
    }

    pub fn municipalities(&self) -> MunicipalityRegistry<'_> {
        MunicipalityRegistry::new(&self.store)
    }

    pub fn store(&self) -> &DeskStore {
        &self.store
    }

    pub fn events_for_complaint(&self, complaint_id: ComplaintId) -> DeskResult<Vec<EventLogEntry>> {
        self.store.events_for_complaint(complaint_id)
    }

    /// Report every row where derived state disagrees with its source.
    /// Read-only: a mismatch is a defect to investigate, never repaired here.
    pub fn audit(&self) -> DeskResult<ConsistencyReport> {
        let report = ConsistencyReport {
            support_mismatches: self.store.support_count_mismatches()?,
            aggregate_mismatches: self.store.rating_aggregate_mismatches()?,
        };
        if !report.is_consistent() {
            log::error!("consistency audit failed: {report:?}");
        }
        Ok(report)
    }
}
