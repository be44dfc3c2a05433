use super::DeskStore;
use crate::{
    complaint_store::Complaint,
    error::DeskResult,
    status::ComplaintStatus,
    types::{ComplaintId, MunicipalityId, Timestamp, UserId},
};
use rusqlite::{params, OptionalExtension};

const COMPLAINT_COLUMNS: &str = "complaint_id, author_id, municipality_id, complaint_text, status,
     feedback, support_count, created_at, updated_at";

// Helper function for mapping complaint rows
fn complaint_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<Complaint> {
    Ok(Complaint {
        id: row.get(0)?,
        author_id: row.get(1)?,
        municipality_id: row.get(2)?,
        text: row.get(3)?,
        status: row.get(4)?,
        feedback: row.get(5)?,
        support_count: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

impl DeskStore {
    // ── Complaint ──────────────────────────────────────────────────

    pub fn insert_complaint(
        &self,
        author_id: UserId,
        municipality_id: MunicipalityId,
        text: &str,
        at: Timestamp,
    ) -> DeskResult<ComplaintId> {
        self.conn.execute(
            "INSERT INTO complaint (
                author_id, municipality_id, complaint_text, status,
                feedback, support_count, created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, NULL, 0, ?5, ?5)",
            params![author_id, municipality_id, text, ComplaintStatus::Pending, at],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_complaint(&self, complaint_id: ComplaintId) -> DeskResult<Option<Complaint>> {
        self.conn
            .query_row(
                &format!("SELECT {COMPLAINT_COLUMNS} FROM complaint WHERE complaint_id = ?1"),
                params![complaint_id],
                complaint_row_mapper,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Newest first, matching the client's feeds.
    pub fn complaints_by_author(&self, author_id: UserId) -> DeskResult<Vec<Complaint>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COMPLAINT_COLUMNS} FROM complaint
             WHERE author_id = ?1
             ORDER BY created_at DESC, complaint_id DESC"
        ))?;
        let rows = stmt.query_map(params![author_id], complaint_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Every complaint, optionally leaving out one author's own.
    pub fn all_complaints(&self, excluding_author: Option<UserId>) -> DeskResult<Vec<Complaint>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COMPLAINT_COLUMNS} FROM complaint
             WHERE ?1 IS NULL OR author_id <> ?1
             ORDER BY created_at DESC, complaint_id DESC"
        ))?;
        let rows = stmt.query_map(params![excluding_author], complaint_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn complaints_by_municipality(
        &self,
        municipality_id: MunicipalityId,
        terminal_only: bool,
    ) -> DeskResult<Vec<Complaint>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COMPLAINT_COLUMNS} FROM complaint
             WHERE municipality_id = ?1
               AND (?2 = 0 OR status IN (?3, ?4))
             ORDER BY created_at DESC, complaint_id DESC"
        ))?;
        let rows = stmt.query_map(
            params![
                municipality_id,
                terminal_only,
                ComplaintStatus::Completed,
                ComplaintStatus::Cancelled,
            ],
            complaint_row_mapper,
        )?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Plain overwrite: concurrent staff edits are last-committed-wins.
    pub fn update_complaint_status(
        &self,
        complaint_id: ComplaintId,
        status: ComplaintStatus,
        feedback: Option<&str>,
        at: Timestamp,
    ) -> DeskResult<()> {
        self.conn.execute(
            "UPDATE complaint SET status = ?1, feedback = ?2, updated_at = ?3
             WHERE complaint_id = ?4",
            params![status, feedback, at, complaint_id],
        )?;
        Ok(())
    }

    /// Shift the stored support count. Callers pair this with the support
    /// row change in the same transaction.
    pub fn adjust_support_count(&self, complaint_id: ComplaintId, delta: i64) -> DeskResult<i64> {
        let count: i64 = self.conn.query_row(
            "UPDATE complaint SET support_count = support_count + ?1
             WHERE complaint_id = ?2
             RETURNING support_count",
            params![delta, complaint_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn delete_complaint_row(&self, complaint_id: ComplaintId) -> DeskResult<usize> {
        let n = self.conn.execute(
            "DELETE FROM complaint WHERE complaint_id = ?1",
            params![complaint_id],
        )?;
        Ok(n)
    }

    // ── Test / summary helpers ────────────────────────────────────────

    pub fn complaint_count(&self) -> DeskResult<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM complaint", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Complaints whose stored support_count differs from their live
    /// support rows: (complaint_id, stored, live).
    pub fn support_count_mismatches(&self) -> DeskResult<Vec<(ComplaintId, i64, i64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT c.complaint_id, c.support_count, COUNT(s.user_id)
             FROM complaint c
             LEFT JOIN complaint_support s ON s.complaint_id = c.complaint_id
             GROUP BY c.complaint_id
             HAVING c.support_count <> COUNT(s.user_id)
             ORDER BY c.complaint_id",
        )?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
