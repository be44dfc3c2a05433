//! Shared primitive types used across the desk.

/// Row id of a complaint.
pub type ComplaintId = i64;

/// Opaque citizen identity issued by the session layer.
pub type UserId = i64;

pub type MunicipalityId = i64;

/// UTC timestamp as stored and serialized (RFC 3339).
pub type Timestamp = chrono::DateTime<chrono::Utc>;

pub fn now() -> Timestamp {
    chrono::Utc::now()
}
