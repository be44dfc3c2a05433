use super::DeskStore;
use crate::{
    error::DeskResult,
    municipality_registry::{Municipality, MunicipalitySummary},
    types::{MunicipalityId, Timestamp},
};
use rusqlite::{params, OptionalExtension};

fn municipality_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<Municipality> {
    Ok(Municipality {
        id: row.get(0)?,
        name: row.get(1)?,
        created_at: row.get(2)?,
    })
}

impl DeskStore {
    // ── Municipality ──────────────────────────────────────────────

    pub fn insert_municipality(&self, name: &str, at: Timestamp) -> DeskResult<MunicipalityId> {
        self.conn.execute(
            "INSERT INTO municipality (name, created_at) VALUES (?1, ?2)",
            params![name, at],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_municipality(&self, id: MunicipalityId) -> DeskResult<Option<Municipality>> {
        self.conn
            .query_row(
                "SELECT municipality_id, name, created_at FROM municipality
                 WHERE municipality_id = ?1",
                params![id],
                municipality_row_mapper,
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn municipality_by_name(&self, name: &str) -> DeskResult<Option<Municipality>> {
        self.conn
            .query_row(
                "SELECT municipality_id, name, created_at FROM municipality WHERE name = ?1",
                params![name],
                municipality_row_mapper,
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn municipality_exists(&self, id: MunicipalityId) -> DeskResult<bool> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS (SELECT 1 FROM municipality WHERE municipality_id = ?1)",
            params![id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Registry listing joined with the stored rating aggregate.
    pub fn municipality_summaries(&self) -> DeskResult<Vec<MunicipalitySummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT m.municipality_id, m.name, a.score_sum, a.rating_count
             FROM municipality m
             LEFT JOIN municipality_rating_aggregate a
               ON a.municipality_id = m.municipality_id
             ORDER BY m.name ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            let sum: Option<i64> = row.get(2)?;
            let count: Option<i64> = row.get(3)?;
            let (average_rating, total_ratings) = match (sum, count) {
                (Some(sum), Some(count)) if count > 0 => {
                    (Some(sum as f64 / count as f64), Some(count))
                }
                _ => (None, None),
            };
            Ok(MunicipalitySummary {
                id: row.get(0)?,
                name: row.get(1)?,
                average_rating,
                total_ratings,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
