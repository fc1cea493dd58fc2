use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row for the `bills` table
#[derive(Debug, Clone, FromRow)]
pub struct BillRow {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub note: Option<String>,
    pub amount: Decimal,
    pub bill_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database row for the `bill_attachments` table
#[derive(Debug, Clone, FromRow)]
pub struct AttachmentRow {
    pub bill_id: Uuid,
    pub url: String,
    pub display_name: String,
    pub storage_key: String,
}

/// A stored file owned by exactly one bill
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub url: String,
    /// Original file name as uploaded
    pub display_name: String,
    /// Storage handle used to remove the object when the bill is deleted
    pub deletion_handle: String,
}

/// A persisted bill together with its attachments, in upload order
#[derive(Debug, Clone, PartialEq)]
pub struct Bill {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub note: Option<String>,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub attachments: Vec<Attachment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Everything needed to persist a new bill; the repository assigns the id
#[derive(Debug, Clone)]
pub struct NewBill {
    pub name: String,
    pub category: String,
    pub note: Option<String>,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub attachments: Vec<Attachment>,
}

impl From<AttachmentRow> for Attachment {
    fn from(row: AttachmentRow) -> Self {
        Self {
            url: row.url,
            display_name: row.display_name,
            deletion_handle: row.storage_key,
        }
    }
}

impl BillRow {
    pub fn into_bill(self, attachments: Vec<Attachment>) -> Bill {
        Bill {
            id: self.id,
            name: self.name,
            category: self.category,
            note: self.note,
            amount: self.amount,
            date: self.bill_date,
            attachments,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
