//! Complaint lifecycle status.
//!
//! One canonical wire form per variant. The display labels the mobile
//! client historically sent are accepted on input and folded onto the same
//! four variants; nothing else parses.

use crate::error::DeskError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ComplaintStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl ComplaintStatus {
    pub const ALL: [ComplaintStatus; 4] = [
        ComplaintStatus::Pending,
        ComplaintStatus::InProgress,
        ComplaintStatus::Completed,
        ComplaintStatus::Cancelled,
    ];

    /// Completed and Cancelled open rating and close support.
    pub fn is_terminal(self) -> bool {
        match self {
            ComplaintStatus::Completed | ComplaintStatus::Cancelled => true,
            ComplaintStatus::Pending | ComplaintStatus::InProgress => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ComplaintStatus::Pending => "pending",
            ComplaintStatus::InProgress => "in_progress",
            ComplaintStatus::Completed => "completed",
            ComplaintStatus::Cancelled => "cancelled",
        }
    }

    /// Display label shown to citizens and staff.
    pub fn label(self) -> &'static str {
        match self {
            ComplaintStatus::Pending => "Beklemede",
            ComplaintStatus::InProgress => "İşleme Alındı",
            ComplaintStatus::Completed => "Tamamlandı",
            ComplaintStatus::Cancelled => "İptal Edildi",
        }
    }

    fn aliases(self) -> &'static [&'static str] {
        match self {
            ComplaintStatus::Pending => &["Beklemede"],
            ComplaintStatus::InProgress => &["İşleme Alındı", "Devam Ediyor"],
            ComplaintStatus::Completed => &["Tamamlandı"],
            ComplaintStatus::Cancelled => &["İptal Edildi"],
        }
    }
}

impl fmt::Display for ComplaintStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComplaintStatus {
    type Err = DeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = fold(s.trim());
        ComplaintStatus::ALL
            .into_iter()
            .find(|status| {
                fold(status.as_str()) == wanted
                    || status.aliases().iter().any(|alias| fold(alias) == wanted)
            })
            .ok_or_else(|| DeskError::Validation(format!("unknown complaint status '{s}'")))
    }
}

/// Case folding that treats dotted and dotless i alike, so "İPTAL EDİLDİ",
/// "iptal edildi" and "İptal Edildi" compare equal.
fn fold(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .filter(|c| *c != '\u{0307}')
        .map(|c| if c == 'ı' { 'i' } else { c })
        .collect()
}

impl rusqlite::types::ToSql for ComplaintStatus {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl rusqlite::types::FromSql for ComplaintStatus {
    fn column_result(value: rusqlite::types::ValueRef<'_>) -> rusqlite::types::FromSqlResult<Self> {
        let raw = value.as_str()?;
        ComplaintStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == raw)
            .ok_or_else(|| rusqlite::types::FromSqlError::Other(format!("bad status '{raw}'").into()))
    }
}
