//! Store methods for ratings and the per-municipality rating aggregate.

use super::DeskStore;
use crate::{
    error::DeskResult,
    rating_ledger::Rating,
    types::{ComplaintId, MunicipalityId, Timestamp, UserId},
};
use rusqlite::{params, OptionalExtension};

const RATING_COLUMNS: &str =
    "rating_id, complaint_id, user_id, municipality_id, score, comment, created_at";

fn rating_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<Rating> {
    Ok(Rating {
        id: row.get(0)?,
        complaint_id: row.get(1)?,
        user_id: row.get(2)?,
        municipality_id: row.get(3)?,
        score: row.get(4)?,
        comment: row.get(5)?,
        created_at: row.get(6)?,
    })
}

impl DeskStore {
    // ── Rating ─────────────────────────────────────────────────────

    /// Plain INSERT: a second row for the same (complaint, user) fails on
    /// the UNIQUE constraint rather than replacing the first.
    pub fn insert_rating(
        &self,
        complaint_id: ComplaintId,
        user_id: UserId,
        municipality_id: MunicipalityId,
        score: u8,
        comment: Option<&str>,
        at: Timestamp,
    ) -> DeskResult<i64> {
        self.conn.execute(
            "INSERT INTO rating (complaint_id, user_id, municipality_id, score, comment, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![complaint_id, user_id, municipality_id, score, comment, at],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_rating(&self, complaint_id: ComplaintId, user_id: UserId) -> DeskResult<Option<Rating>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {RATING_COLUMNS} FROM rating
                     WHERE complaint_id = ?1 AND user_id = ?2"
                ),
                params![complaint_id, user_id],
                rating_row_mapper,
            )
            .optional()
            .map_err(Into::into)
    }

    /// The earliest rating on a complaint. Only the author may rate, so
    /// there is at most one.
    pub fn rating_for_complaint(&self, complaint_id: ComplaintId) -> DeskResult<Option<Rating>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {RATING_COLUMNS} FROM rating
                     WHERE complaint_id = ?1
                     ORDER BY rating_id ASC LIMIT 1"
                ),
                params![complaint_id],
                rating_row_mapper,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Municipalities whose ratings reference this complaint.
    pub fn rated_municipalities_for_complaint(
        &self,
        complaint_id: ComplaintId,
    ) -> DeskResult<Vec<MunicipalityId>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT municipality_id FROM rating WHERE complaint_id = ?1",
        )?;
        let rows = stmt.query_map(params![complaint_id], |row| row.get(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn delete_ratings_for_complaint(&self, complaint_id: ComplaintId) -> DeskResult<usize> {
        let n = self.conn.execute(
            "DELETE FROM rating WHERE complaint_id = ?1",
            params![complaint_id],
        )?;
        Ok(n)
    }

    /// (sum of scores, row count) straight from the rating rows.
    pub fn rating_totals(&self, municipality_id: MunicipalityId) -> DeskResult<(i64, i64)> {
        let totals = self.conn.query_row(
            "SELECT COALESCE(SUM(score), 0), COUNT(*) FROM rating WHERE municipality_id = ?1",
            params![municipality_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(totals)
    }

    // ── Aggregate ──────────────────────────────────────────────────

    pub fn save_rating_aggregate(
        &self,
        municipality_id: MunicipalityId,
        score_sum: i64,
        rating_count: i64,
        at: Timestamp,
    ) -> DeskResult<()> {
        self.conn.execute(
            "INSERT INTO municipality_rating_aggregate
                (municipality_id, score_sum, rating_count, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (municipality_id) DO UPDATE SET
                score_sum    = excluded.score_sum,
                rating_count = excluded.rating_count,
                updated_at   = excluded.updated_at",
            params![municipality_id, score_sum, rating_count, at],
        )?;
        Ok(())
    }

    /// Stored (sum, count), or None before the first rating.
    pub fn rating_aggregate(&self, municipality_id: MunicipalityId) -> DeskResult<Option<(i64, i64)>> {
        self.conn
            .query_row(
                "SELECT score_sum, rating_count FROM municipality_rating_aggregate
                 WHERE municipality_id = ?1",
                params![municipality_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(Into::into)
    }

    /// Municipalities whose stored aggregate differs from their rating rows:
    /// (municipality_id, stored (sum, count), live (sum, count)).
    pub fn rating_aggregate_mismatches(
        &self,
    ) -> DeskResult<Vec<(MunicipalityId, (i64, i64), (i64, i64))>> {
        let mut stmt = self.conn.prepare(
            "SELECT m.municipality_id,
                    COALESCE(a.score_sum, 0), COALESCE(a.rating_count, 0),
                    COALESCE(SUM(r.score), 0), COUNT(r.rating_id)
             FROM municipality m
             LEFT JOIN municipality_rating_aggregate a ON a.municipality_id = m.municipality_id
             LEFT JOIN rating r ON r.municipality_id = m.municipality_id
             GROUP BY m.municipality_id
             HAVING COALESCE(a.score_sum, 0) <> COALESCE(SUM(r.score), 0)
                 OR COALESCE(a.rating_count, 0) <> COUNT(r.rating_id)
             ORDER BY m.municipality_id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get(0)?, (row.get(1)?, row.get(2)?), (row.get(3)?, row.get(4)?)))
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
