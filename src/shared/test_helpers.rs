//! In-memory stand-ins for the bill repository, attachment store and
//! insight generator, plus small builders for test input.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::bills::dtos::{CreateBillForm, UploadedFile};
use crate::features::bills::models::{Bill, NewBill};
use crate::features::bills::repositories::BillRepository;
use crate::features::bills::services::BillService;
use crate::modules::llm::InsightGenerator;
use crate::modules::storage::{AttachmentStore, StoredObject};
use crate::shared::validation::sanitize_file_name;

pub fn bill_form(name: &str, category: &str, amount: &str) -> CreateBillForm {
    CreateBillForm {
        name: Some(name.to_string()),
        category: Some(category.to_string()),
        amount: Some(amount.to_string()),
        ..Default::default()
    }
}

pub fn uploaded_file(file_name: &str) -> UploadedFile {
    UploadedFile {
        file_name: file_name.to_string(),
        content_type: "application/pdf".to_string(),
        data: format!("contents of {}", file_name).into_bytes(),
    }
}

/// Bill repository kept in insertion order
#[derive(Default)]
pub struct InMemoryBillRepository {
    bills: Mutex<Vec<Bill>>,
    fail_creates: AtomicBool,
}

impl InMemoryBillRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.bills.lock().unwrap().len()
    }

    /// Make every later `create` fail like a lost database connection
    pub fn fail_creates(&self) {
        self.fail_creates.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl BillRepository for InMemoryBillRepository {
    async fn create(&self, bill: NewBill) -> Result<Bill> {
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(AppError::Internal("repository unavailable".to_string()));
        }
        if bill.amount < Decimal::ZERO {
            return Err(AppError::Validation(
                "constraint 'bills_amount_non_negative' violated".to_string(),
            ));
        }

        let now = Utc::now();
        let created = Bill {
            id: Uuid::now_v7(),
            name: bill.name,
            category: bill.category,
            note: bill.note,
            amount: bill.amount,
            date: bill.date,
            attachments: bill.attachments,
            created_at: now,
            updated_at: now,
        };
        self.bills.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn list_recent(&self) -> Result<Vec<Bill>> {
        Ok(self.bills.lock().unwrap().iter().rev().cloned().collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Bill>> {
        Ok(self
            .bills
            .lock()
            .unwrap()
            .iter()
            .find(|b| b.id == id)
            .cloned())
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut bills = self.bills.lock().unwrap();
        let before = bills.len();
        bills.retain(|b| b.id != id);
        Ok(bills.len() < before)
    }
}

/// Object store that keeps objects in a map and can be told to fail
#[derive(Default)]
pub struct InMemoryAttachmentStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    failing_uploads: Mutex<HashSet<String>>,
    failing_deletes: Mutex<HashSet<String>>,
    delays: Mutex<HashMap<String, Duration>>,
    uploads: AtomicUsize,
    deletes: AtomicUsize,
}

impl InMemoryAttachmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uploads of files with this original name will fail
    pub fn fail_uploads_named(&self, file_name: &str) {
        self.failing_uploads
            .lock()
            .unwrap()
            .insert(file_name.to_string());
    }

    /// Deletes of this handle will fail
    pub fn fail_deletes_of(&self, handle: &str) {
        self.failing_deletes
            .lock()
            .unwrap()
            .insert(handle.to_string());
    }

    /// Uploads of this file name, and deletes of this handle, take `delay`
    pub fn delay(&self, name_or_handle: &str, delay: Duration) {
        self.delays
            .lock()
            .unwrap()
            .insert(name_or_handle.to_string(), delay);
    }

    async fn wait_for(&self, name_or_handle: &str) {
        let delay = self.delays.lock().unwrap().get(name_or_handle).copied();
        match delay {
            Some(d) => tokio::time::sleep(d).await,
            // Let sibling calls interleave like real network calls
            None => tokio::task::yield_now().await,
        }
    }

    pub fn clear_failures(&self) {
        self.failing_uploads.lock().unwrap().clear();
        self.failing_deletes.lock().unwrap().clear();
    }

    /// Objects currently stored
    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    pub fn delete_count(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AttachmentStore for InMemoryAttachmentStore {
    async fn upload(
        &self,
        folder: &str,
        file_name: &str,
        data: Vec<u8>,
        _content_type: &str,
    ) -> Result<StoredObject> {
        let sequence = self.uploads.fetch_add(1, Ordering::SeqCst);
        self.wait_for(file_name).await;

        if self.failing_uploads.lock().unwrap().contains(file_name) {
            return Err(AppError::Internal(format!(
                "storage rejected '{}'",
                file_name
            )));
        }

        let handle = format!("{}/{}-{}", folder, sequence, sanitize_file_name(file_name));
        self.objects.lock().unwrap().insert(handle.clone(), data);

        Ok(StoredObject {
            url: format!("https://storage.test/{}", handle),
            deletion_handle: handle,
        })
    }

    async fn delete(&self, deletion_handle: &str) -> Result<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.wait_for(deletion_handle).await;

        if self.failing_deletes.lock().unwrap().contains(deletion_handle) {
            return Err(AppError::Internal(format!(
                "storage refused to delete '{}'",
                deletion_handle
            )));
        }

        // Missing objects delete fine, as with S3
        self.objects.lock().unwrap().remove(deletion_handle);
        Ok(())
    }
}

/// Insight generator returning a canned reply and recording prompts
pub struct StubInsightGenerator {
    reply: Mutex<std::result::Result<String, String>>,
    prompts: Mutex<Vec<String>>,
}

impl StubInsightGenerator {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Mutex::new(Ok(text.to_string())),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn fail_with(&self, message: &str) {
        *self.reply.lock().unwrap() = Err(message.to_string());
    }

    /// Prompts received so far, in order
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl InsightGenerator for StubInsightGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply
            .lock()
            .unwrap()
            .clone()
            .map_err(AppError::GenerationFailed)
    }
}

/// Bill service wired to fresh in-memory collaborators
pub fn in_memory_bill_service() -> (
    Arc<BillService>,
    Arc<InMemoryBillRepository>,
    Arc<InMemoryAttachmentStore>,
    Arc<StubInsightGenerator>,
) {
    let repository = Arc::new(InMemoryBillRepository::new());
    let store = Arc::new(InMemoryAttachmentStore::new());
    let generator = Arc::new(StubInsightGenerator::replying("## Spending report"));
    let service = Arc::new(BillService::new(
        repository.clone(),
        store.clone(),
        Some(generator.clone() as Arc<dyn InsightGenerator>),
    ));
    (service, repository, store, generator)
}
