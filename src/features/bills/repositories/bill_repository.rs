use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::bills::models::{Attachment, AttachmentRow, Bill, BillRow, NewBill};

/// Document-style store of bills keyed by id
#[async_trait]
pub trait BillRepository: Send + Sync {
    /// Persist a bill and its attachments, assigning a new id
    async fn create(&self, bill: NewBill) -> Result<Bill>;

    /// All bills, most recently created first
    async fn list_recent(&self) -> Result<Vec<Bill>>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Bill>>;

    /// Remove a bill; returns false when no bill had this id
    async fn delete(&self, id: Uuid) -> Result<bool>;
}

const BILL_COLUMNS: &str =
    "id, name, category, note, amount, bill_date, created_at, updated_at";

/// PostgreSQL-backed bill repository
pub struct PgBillRepository {
    pool: PgPool,
}

impl PgBillRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Load attachments for the given bills, grouped by bill and in upload order
    async fn attachments_for(&self, bill_ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<Attachment>>> {
        let rows = sqlx::query_as::<_, AttachmentRow>(
            r#"
            SELECT bill_id, url, display_name, storage_key
            FROM bill_attachments
            WHERE bill_id = ANY($1)
            ORDER BY bill_id, position
            "#,
        )
        .bind(bill_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: HashMap<Uuid, Vec<Attachment>> = HashMap::new();
        for row in rows {
            grouped.entry(row.bill_id).or_default().push(row.into());
        }
        Ok(grouped)
    }
}

#[async_trait]
impl BillRepository for PgBillRepository {
    async fn create(&self, bill: NewBill) -> Result<Bill> {
        // UUID v7 keeps ids time-ordered, which the listing uses as a tiebreak
        let id = Uuid::now_v7();

        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, BillRow>(&format!(
            r#"
            INSERT INTO bills (id, name, category, note, amount, bill_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {BILL_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&bill.name)
        .bind(&bill.category)
        .bind(&bill.note)
        .bind(bill.amount)
        .bind(bill.date)
        .fetch_one(&mut *tx)
        .await?;

        for (position, attachment) in bill.attachments.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO bill_attachments (bill_id, position, url, display_name, storage_key)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(id)
            .bind(position as i32)
            .bind(&attachment.url)
            .bind(&attachment.display_name)
            .bind(&attachment.deletion_handle)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        debug!(
            "Bill row inserted: id={}, attachments={}",
            id,
            bill.attachments.len()
        );

        Ok(row.into_bill(bill.attachments))
    }

    async fn list_recent(&self) -> Result<Vec<Bill>> {
        let rows = sqlx::query_as::<_, BillRow>(&format!(
            "SELECT {BILL_COLUMNS} FROM bills ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut attachments = self.attachments_for(&ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let files = attachments.remove(&row.id).unwrap_or_default();
                row.into_bill(files)
            })
            .collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Bill>> {
        let row = sqlx::query_as::<_, BillRow>(&format!(
            "SELECT {BILL_COLUMNS} FROM bills WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let files = self
            .attachments_for(&[id])
            .await?
            .remove(&id)
            .unwrap_or_default();

        Ok(Some(row.into_bill(files)))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        // Attachment rows go with the bill (ON DELETE CASCADE)
        let result = sqlx::query("DELETE FROM bills WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
