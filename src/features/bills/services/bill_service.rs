use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::bills::dtos::{BillInsightDto, CreateBillDto, CreateBillForm, UploadedFile};
use crate::features::bills::models::{Attachment, Bill, NewBill};
use crate::features::bills::repositories::BillRepository;
use crate::modules::llm::InsightGenerator;
use crate::modules::storage::AttachmentStore;
use crate::shared::prompts::render_spending_summary_prompt;

/// Storage folder that holds every bill attachment
pub const ATTACHMENT_FOLDER: &str = "bills";

/// Result of a spending analysis request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpendingSummary {
    /// There were no bills, so nothing was generated
    NoData,
    /// Generated analysis text, returned as-is
    Generated { text: String, bill_count: usize },
}

/// Orchestrates the bill repository, attachment store and insight generator
#[derive(Clone)]
pub struct BillService {
    repository: Arc<dyn BillRepository>,
    attachment_store: Arc<dyn AttachmentStore>,
    insight_generator: Option<Arc<dyn InsightGenerator>>,
}

impl BillService {
    pub fn new(
        repository: Arc<dyn BillRepository>,
        attachment_store: Arc<dyn AttachmentStore>,
        insight_generator: Option<Arc<dyn InsightGenerator>>,
    ) -> Self {
        Self {
            repository,
            attachment_store,
            insight_generator,
        }
    }

    /// Create a bill, uploading its files first.
    ///
    /// Fields are validated before anything is uploaded. Uploads run
    /// concurrently; if any fails, or the bill cannot be persisted, the
    /// objects uploaded for this request are removed again.
    ///
    /// Once validation passes the work runs on its own task, so dropping the
    /// returned future does not interrupt uploads, persistence or rollback.
    pub async fn create_bill(&self, form: CreateBillForm) -> Result<Bill> {
        let dto = CreateBillDto::from_form(&form, Utc::now().date_naive())?;

        let service = self.clone();
        run_detached(async move { service.store_bill(dto, form.files).await }).await
    }

    async fn store_bill(&self, dto: CreateBillDto, files: Vec<UploadedFile>) -> Result<Bill> {
        let attachments = self.upload_attachments(files).await?;

        let new_bill = NewBill {
            name: dto.name,
            category: dto.category,
            note: dto.note,
            amount: dto.amount,
            date: dto.date,
            attachments,
        };
        let handles = deletion_handles(&new_bill.attachments);

        match self.repository.create(new_bill).await {
            Ok(bill) => {
                info!(
                    "Bill created: id={}, category={}, attachments={}",
                    bill.id,
                    bill.category,
                    bill.attachments.len()
                );
                Ok(bill)
            }
            Err(e) => {
                self.rollback_uploads(handles).await;
                Err(e)
            }
        }
    }

    /// All bills, most recent first
    pub async fn list_bills(&self) -> Result<Vec<Bill>> {
        self.repository.list_recent().await
    }

    /// Delete a bill and every stored file it owns.
    ///
    /// Stored files are removed first; if any removal fails the bill is kept
    /// and `CleanupFailed` is returned, so a retry can finish the cleanup.
    ///
    /// Like [`BillService::create_bill`], the work runs on its own task.
    ///
    /// # Returns
    /// The number of stored files removed
    pub async fn delete_bill(&self, id: Uuid) -> Result<usize> {
        let service = self.clone();
        run_detached(async move { service.remove_bill(id).await }).await
    }

    async fn remove_bill(&self, id: Uuid) -> Result<usize> {
        let bill = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| bill_not_found(id))?;

        let failures = self
            .delete_objects(deletion_handles(&bill.attachments))
            .await;
        if !failures.is_empty() {
            return Err(AppError::CleanupFailed(format!(
                "bill {} kept, {} of {} files not removed: {}",
                id,
                failures.len(),
                bill.attachments.len(),
                failures.join("; ")
            )));
        }

        if !self.repository.delete(id).await? {
            // Removed by a concurrent request after our fetch
            return Err(bill_not_found(id));
        }

        info!(
            "Bill deleted: id={}, attachments_removed={}",
            id,
            bill.attachments.len()
        );

        Ok(bill.attachments.len())
    }

    /// Ask the insight generator for a spending analysis of all bills
    pub async fn describe_bills(&self) -> Result<SpendingSummary> {
        let bills = self.repository.list_recent().await?;
        if bills.is_empty() {
            return Ok(SpendingSummary::NoData);
        }

        let generator = self.insight_generator.as_ref().ok_or_else(|| {
            AppError::GenerationFailed("insight generator is not configured".to_string())
        })?;

        let prompt = build_insight_prompt(&bills)?;
        let text = generator.generate(&prompt).await?;

        info!("Spending summary generated for {} bills", bills.len());

        Ok(SpendingSummary::Generated {
            text,
            bill_count: bills.len(),
        })
    }

    /// Upload every file concurrently, keeping input order in the result
    async fn upload_attachments(&self, files: Vec<UploadedFile>) -> Result<Vec<Attachment>> {
        if files.is_empty() {
            return Ok(Vec::new());
        }

        let total = files.len();
        let mut tasks = JoinSet::new();
        for (index, file) in files.into_iter().enumerate() {
            let store = Arc::clone(&self.attachment_store);
            tasks.spawn(async move {
                let result = store
                    .upload(
                        ATTACHMENT_FOLDER,
                        &file.file_name,
                        file.data,
                        &file.content_type,
                    )
                    .await;
                (index, file.file_name, result)
            });
        }

        let mut slots: Vec<Option<Attachment>> = (0..total).map(|_| None).collect();
        let mut failures = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, file_name, Ok(stored))) => {
                    debug!("Attachment uploaded: {} -> {}", file_name, stored.url);
                    slots[index] = Some(Attachment {
                        url: stored.url,
                        display_name: file_name,
                        deletion_handle: stored.deletion_handle,
                    });
                }
                Ok((_, file_name, Err(e))) => failures.push(format!("{}: {}", file_name, e)),
                Err(e) => failures.push(format!("upload task failed: {}", e)),
            }
        }

        let uploaded: Vec<Attachment> = slots.into_iter().flatten().collect();

        if !failures.is_empty() {
            failures.sort();
            self.rollback_uploads(deletion_handles(&uploaded)).await;
            return Err(AppError::UploadFailed(failures.join("; ")));
        }

        Ok(uploaded)
    }

    /// Best-effort removal of objects uploaded by a request that did not produce a bill
    async fn rollback_uploads(&self, handles: Vec<String>) {
        if handles.is_empty() {
            return;
        }

        let count = handles.len();
        let failures = self.delete_objects(handles).await;
        if failures.is_empty() {
            debug!("Rolled back {} uploaded attachments", count);
        } else {
            warn!(
                "Failed to roll back {} of {} uploaded attachments: {}",
                failures.len(),
                count,
                failures.join("; ")
            );
        }
    }

    /// Delete objects concurrently; returns one message per failed handle
    async fn delete_objects(&self, handles: Vec<String>) -> Vec<String> {
        let mut tasks = JoinSet::new();
        for handle in handles {
            let store = Arc::clone(&self.attachment_store);
            tasks.spawn(async move {
                let result = store.delete(&handle).await;
                (handle, result)
            });
        }

        let mut failures = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(()))) => {}
                Ok((handle, Err(e))) => failures.push(format!("{}: {}", handle, e)),
                Err(e) => failures.push(format!("delete task failed: {}", e)),
            }
        }
        failures.sort();
        failures
    }
}

/// Run `work` on a spawned task and wait for it; the task outlives a dropped caller
async fn run_detached<T, F>(work: F) -> Result<T>
where
    T: Send + 'static,
    F: Future<Output = Result<T>> + Send + 'static,
{
    tokio::spawn(work)
        .await
        .map_err(|e| AppError::Internal(format!("bill task failed: {}", e)))?
}

fn deletion_handles(attachments: &[Attachment]) -> Vec<String> {
    attachments
        .iter()
        .map(|a| a.deletion_handle.clone())
        .collect()
}

fn bill_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Bill {} not found", id))
}

/// Render the analysis prompt from the category, amount, date and name of each bill
pub fn build_insight_prompt(bills: &[Bill]) -> Result<String> {
    let rows: Vec<BillInsightDto> = bills.iter().map(BillInsightDto::from).collect();

    let bills_json = serde_json::to_string_pretty(&rows)
        .map_err(|e| AppError::Internal(format!("Failed to serialize bills: {}", e)))?;

    render_spending_summary_prompt(&bills_json, rows.len())
        .map_err(|e| AppError::Internal(format!("Failed to render insight prompt: {}", e)))
}
