//! Store methods for the complaint_support relation.

use super::DeskStore;
use crate::{
    error::DeskResult,
    types::{ComplaintId, Timestamp, UserId},
};
use rusqlite::params;

impl DeskStore {
    /// Insert the (complaint, user) row unless it already exists.
    /// Returns true only when this call created it.
    pub fn insert_support(
        &self,
        complaint_id: ComplaintId,
        user_id: UserId,
        at: Timestamp,
    ) -> DeskResult<bool> {
        let n = self.conn.execute(
            "INSERT INTO complaint_support (complaint_id, user_id, created_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT (complaint_id, user_id) DO NOTHING",
            params![complaint_id, user_id, at],
        )?;
        Ok(n == 1)
    }

    /// Returns true only when this call removed an existing row.
    pub fn delete_support(&self, complaint_id: ComplaintId, user_id: UserId) -> DeskResult<bool> {
        let n = self.conn.execute(
            "DELETE FROM complaint_support WHERE complaint_id = ?1 AND user_id = ?2",
            params![complaint_id, user_id],
        )?;
        Ok(n == 1)
    }

    pub fn delete_supports_for_complaint(&self, complaint_id: ComplaintId) -> DeskResult<usize> {
        let n = self.conn.execute(
            "DELETE FROM complaint_support WHERE complaint_id = ?1",
            params![complaint_id],
        )?;
        Ok(n)
    }

    pub fn has_support(&self, complaint_id: ComplaintId, user_id: UserId) -> DeskResult<bool> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS (
                SELECT 1 FROM complaint_support WHERE complaint_id = ?1 AND user_id = ?2
             )",
            params![complaint_id, user_id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    pub fn supported_by_user(&self, user_id: UserId) -> DeskResult<Vec<ComplaintId>> {
        let mut stmt = self.conn.prepare(
            "SELECT complaint_id FROM complaint_support
             WHERE user_id = ?1
             ORDER BY complaint_id ASC",
        )?;
        let rows = stmt.query_map(params![user_id], |row| row.get(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Live row count for one complaint, independent of the stored counter.
    pub fn support_row_count(&self, complaint_id: ComplaintId) -> DeskResult<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM complaint_support WHERE complaint_id = ?1",
            params![complaint_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
