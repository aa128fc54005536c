use bioscan_core::{RecordId, Template};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

/// A captured template persisted in the local store.
///
/// Ids are assigned by the store on insertion, are unique, and only grow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiometricRecord {
    /// Store-assigned identifier
    pub id: RecordId,

    /// Encoded template, as returned by the device
    pub template: Template,

    /// When the capture was persisted
    pub created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, SqliteRow> for BiometricRecord {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: i64 = row.try_get("id")?;
        let encoded: String = row.try_get("template_base64")?;
        let created_at: DateTime<Utc> = row.try_get("created_at")?;

        let template = Template::new(encoded).map_err(|e| sqlx::Error::ColumnDecode {
            index: "template_base64".to_string(),
            source: Box::new(e),
        })?;

        Ok(Self {
            id: RecordId::new(id),
            template,
            created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_record_serialization() {
        let record = BiometricRecord {
            id: RecordId::new(7),
            template: Template::new("abc123").unwrap(),
            created_at: Utc.with_ymd_and_hms(2025, 10, 27, 14, 30, 0).unwrap(),
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["template"], "abc123");
        assert_eq!(json["created_at"], "2025-10-27T14:30:00Z");
    }
}
